use anyhow::anyhow;
use anyhow::bail;
use std::path::Path;
use std::sync::Arc;

use crate::ast::HeaderAstSource;
use crate::codegen::AggregatedCodeGenUnit;
use crate::codegen::AggregatedUnitSettingsBuilder;
use crate::codegen::CodeGenManager;
use crate::codegen::CodeGenManagerSettingsBuilder;
use crate::codegen::GenerationForces;
use crate::codegen::MacroCodeGenUnit;
use crate::codegen::MacroUnitSettingsBuilder;
use crate::entity::EntityKind;
use crate::generators::DataAggregateModule;
use crate::generators::FieldAccessorModule;
use crate::log::DefaultLogger;
use crate::log::LogSeverity;
use crate::log::SharedLogger;
use crate::parsing::CompilerIdentity;
use crate::parsing::FileParser;
use crate::parsing::ParsingSettingsBuilder;
use crate::property::DefaultPropertyRule;
use crate::property::RuleRegistry;

use super::GenerationConfig;
use super::report;

/* -------------------------------------------------------------------------- */
/*                                  Fn: Run                                   */
/* -------------------------------------------------------------------------- */

/// `run` wires a working directory into the generation engine and executes
/// both strategies: one per-file generation with the accessor module, then
/// one all-files generation aggregating `Data` types. The `Include`
/// subdirectory is parsed; `Include/Generated` receives the artifacts and is
/// excluded from parsing.
pub fn run(working_directory: &Path) -> anyhow::Result<()> {
    if !working_directory.is_dir() {
        bail!("working directory {working_directory:?} is not a directory or doesn't exist");
    }
    let working_directory = working_directory.canonicalize()?;

    let include_directory = working_directory.join("Include");
    if !include_directory.is_dir() {
        bail!("working directory must contain an 'Include' subdirectory");
    }
    let generated_directory = include_directory.join("Generated");

    let config = GenerationConfig::load(&working_directory)?;
    let logger: SharedLogger = Arc::new(DefaultLogger);

    logger.log(
        LogSeverity::Info,
        &format!("working directory: {}", working_directory.display()),
    );

    let parser = build_parser(&config, &include_directory)?;
    let manager = build_manager(
        &config,
        logger.clone(),
        &include_directory,
        &generated_directory,
    )?;

    // Per-file unit: accessor declarations and definitions spliced through
    // generated macros.
    let macro_settings = MacroUnitSettingsBuilder::default()
        .class_footer_macro_pattern(config.class_footer_macro_pattern.clone())
        .generated_header_file_name_pattern(config.generated_header_file_name_pattern.clone())
        .generated_source_file_name_pattern(config.generated_source_file_name_pattern.clone())
        .header_file_footer_macro_pattern(config.header_file_footer_macro_pattern.clone())
        .output_directory(generated_directory.clone())
        .build()?;
    let mut accessor_unit = MacroCodeGenUnit::new(macro_settings);
    accessor_unit.add_module(FieldAccessorModule::new());

    // All-files unit: the aggregated DataState artifact.
    let aggregated_settings = AggregatedUnitSettingsBuilder::default()
        .output_directory(generated_directory.clone())
        .build()?;
    let mut data_unit = AggregatedCodeGenUnit::new(aggregated_settings);
    data_unit.add_module(DataAggregateModule::new());

    let forces = GenerationForces::all();
    let each_result = manager.run_one_generate_for_each_file(&parser, &accessor_unit, forces);
    let all_result = manager.run_one_generate_for_all_files(&parser, &data_unit, forces);

    report::report_errors(&each_result.errors);
    report::report_errors(&all_result.errors);

    if !(each_result.completed && all_result.completed) {
        bail!("an error happened during code generation");
    }

    logger.log(
        LogSeverity::Info,
        &format!(
            "generation completed successfully in {:.3} seconds ({} files)",
            each_result.duration_secs + all_result.duration_secs,
            each_result.parsed_files.len()
        ),
    );

    Ok(())
}

/* ------------------------------ Fn: build_parser --------------------------- */

fn build_parser(config: &GenerationConfig, include_directory: &Path) -> anyhow::Result<FileParser> {
    let compiler = CompilerIdentity::from_name(&config.compiler)
        .ok_or_else(|| anyhow!("unsupported compiler '{}'", config.compiler))?;

    let mut rules = RuleRegistry::new();
    rules.register(
        &[EntityKind::Class, EntityKind::Struct],
        "Data",
        Arc::new(DefaultPropertyRule),
    );
    rules.register(&[EntityKind::Field], "Get", Arc::new(DefaultPropertyRule));
    rules.register(&[EntityKind::Field], "Set", Arc::new(DefaultPropertyRule));

    let settings = ParsingSettingsBuilder::default()
        .compiler(compiler)
        .include_directories(vec![include_directory.to_owned()])
        .rules(rules)
        .should_abort_on_first_error(config.should_abort_parsing_on_first_error)
        .build()?;

    Ok(FileParser::new(
        Arc::new(HeaderAstSource::new()),
        Arc::new(settings),
    ))
}

/* ----------------------------- Fn: build_manager --------------------------- */

fn build_manager(
    config: &GenerationConfig,
    logger: SharedLogger,
    include_directory: &Path,
    generated_directory: &Path,
) -> anyhow::Result<CodeGenManager> {
    let mut manager = CodeGenManager::new(logger);

    manager.settings = CodeGenManagerSettingsBuilder::default()
        .ignored_directories(vec![generated_directory.to_owned()])
        .supported_extensions(config.supported_file_extensions.clone())
        .to_process_directories(vec![include_directory.to_owned()])
        .build()?;

    Ok(manager)
}
