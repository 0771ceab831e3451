use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use kodgen::ast::HeaderAstSource;
use kodgen::codegen::AggregatedCodeGenUnit;
use kodgen::codegen::AggregatedUnitSettingsBuilder;
use kodgen::codegen::CodeGenManager;
use kodgen::codegen::CodeGenManagerSettingsBuilder;
use kodgen::codegen::MacroCodeGenUnit;
use kodgen::codegen::MacroUnitSettingsBuilder;
use kodgen::entity::EntityKind;
use kodgen::generators::DataAggregateModule;
use kodgen::generators::FieldAccessorModule;
use kodgen::log::DefaultLogger;
use kodgen::log::SharedLogger;
use kodgen::parsing::FileParser;
use kodgen::parsing::ParsingSettingsBuilder;
use kodgen::property::DefaultPropertyRule;
use kodgen::property::RuleRegistry;

/* -------------------------------------------------------------------------- */
/*                            Struct: TestContext                             */
/* -------------------------------------------------------------------------- */

/// TestContext manages a temporary working directory shaped the way the
/// engine expects (`Include/` inputs, `Include/Generated/` artifacts) and
/// provides wired-up engine components for end-to-end generation tests.
pub struct TestContext {
    pub working_dir: TempDir,
}

impl TestContext {
    /// Creates a new context with a fresh working directory containing an
    /// empty `Include` subdirectory.
    pub fn new() -> Self {
        let working_dir = TempDir::new().expect("failed to create temp working dir");
        std::fs::create_dir_all(working_dir.path().join("Include"))
            .expect("failed to create Include dir");

        TestContext { working_dir }
    }

    /// Returns the `Include` input directory.
    pub fn include_path(&self) -> PathBuf {
        self.working_dir.path().join("Include")
    }

    /// Returns the `Include/Generated` artifact directory.
    pub fn generated_path(&self) -> PathBuf {
        self.include_path().join("Generated")
    }

    /// Writes a header into the input directory and returns its path.
    pub fn create_header(&self, name: &str, content: &str) -> PathBuf {
        let path = self.include_path().join(name);
        std::fs::write(&path, content)
            .unwrap_or_else(|_| panic!("failed to write header {}", path.display()));
        path
    }

    /// Reads a generated artifact by file name.
    pub fn read_generated(&self, name: &str) -> String {
        let path = self.generated_path().join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("failed to read {}", path.display()))
    }

    /// Builds a manager walking `Include` (minus `Include/Generated`) for
    /// `.h` files, with a small worker pool.
    pub fn manager(&self) -> CodeGenManager {
        let mut manager = CodeGenManager::with_workers(logger(), 4);

        manager.settings = CodeGenManagerSettingsBuilder::default()
            .ignored_directories(vec![self.generated_path()])
            .supported_extensions(vec![".h".to_string()])
            .to_process_directories(vec![self.include_path()])
            .build()
            .expect("manager settings build");

        manager
    }

    /// Builds a per-file unit with the accessor module, emitting into
    /// `Include/Generated`.
    pub fn accessor_unit(&self) -> MacroCodeGenUnit {
        let settings = MacroUnitSettingsBuilder::default()
            .output_directory(self.generated_path())
            .build()
            .expect("macro unit settings build");

        let mut unit = MacroCodeGenUnit::new(settings);
        unit.add_module(FieldAccessorModule::new());
        unit
    }

    /// Builds an aggregated unit with the Data module, emitting into
    /// `Include/Generated`.
    pub fn data_unit(&self) -> AggregatedCodeGenUnit {
        let settings = AggregatedUnitSettingsBuilder::default()
            .output_directory(self.generated_path())
            .build()
            .expect("aggregated unit settings build");

        let mut unit = AggregatedCodeGenUnit::new(settings);
        unit.add_module(DataAggregateModule::new());
        unit
    }
}

/* -------------------------------------------------------------------------- */
/*                              Fn: Components                                */
/* -------------------------------------------------------------------------- */

/// Returns the shared test logger.
pub fn logger() -> SharedLogger {
    Arc::new(DefaultLogger)
}

/// Builds a file parser with the reference rules (`Data` on classes and
/// structs, `Get`/`Set` on fields) in strict mode.
pub fn parser(abort_on_first_error: bool) -> FileParser {
    let mut rules = RuleRegistry::new();
    rules.register(
        &[EntityKind::Class, EntityKind::Struct],
        "Data",
        Arc::new(DefaultPropertyRule),
    );
    rules.register(&[EntityKind::Field], "Get", Arc::new(DefaultPropertyRule));
    rules.register(&[EntityKind::Field], "Set", Arc::new(DefaultPropertyRule));

    let settings = ParsingSettingsBuilder::default()
        .rules(rules)
        .should_abort_on_first_error(abort_on_first_error)
        .build()
        .expect("parsing settings build");

    FileParser::new(Arc::new(HeaderAstSource::new()), Arc::new(settings))
}
