use crate::codegen::CodeGenError;

/* -------------------------------------------------------------------------- */
/*                             Fn: ReportErrors                               */
/* -------------------------------------------------------------------------- */

/// `report_errors` renders a run's errors to stderr. Parsing errors with a
/// readable source file get rich, colorized reports with source context;
/// everything else prints as a plain line.
pub fn report_errors(errors: &[CodeGenError]) {
    for error in errors {
        match error {
            CodeGenError::Parsing { error, file } => {
                let Ok(source) = std::fs::read_to_string(file) else {
                    eprintln!("{error}");
                    continue;
                };

                report_with_source(&error.to_string(), &file.display().to_string(), &source, error.location.offset);
            }
            other => eprintln!("{other}"),
        }
    }
}

/* --------------------------- Fn: report_with_source ------------------------ */

fn report_with_source(message: &str, location: &str, source: &str, offset: usize) {
    if source.is_empty() {
        eprintln!("{message}");
        return;
    }

    let start = offset.min(source.len() - 1);
    let range = start..(start + 1).min(source.len());

    let result = ariadne::Report::build(
        ariadne::ReportKind::Error,
        (location.to_string(), range.clone()),
    )
    .with_config(ariadne::Config::new().with_index_type(ariadne::IndexType::Byte))
    .with_message(message)
    .with_label(
        ariadne::Label::new((location.to_string(), range))
            .with_message(message)
            .with_color(ariadne::Color::Red),
    )
    .finish()
    .eprint((location.to_string(), ariadne::Source::from(source)));

    if result.is_err() {
        eprintln!("{message}");
    }
}
