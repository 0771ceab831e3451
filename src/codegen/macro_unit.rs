use derive_builder::Builder;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use crate::log::LogSeverity;
use crate::log::SharedLogger;
use crate::parsing::FileParsingResult;

use super::CodeGenEnv;
use super::CodeGenModule;
use super::CodeGenUnit;
use super::GeneratedFile;
use super::TraversalBehaviour;
use super::unit::final_generate_with_module;
use super::unit::generate_entity_with_module;
use super::unit::initial_generate_with_module;
use super::unit::traverse_entities;

/* -------------------------------------------------------------------------- */
/*                             Enum: MacroSection                             */
/* -------------------------------------------------------------------------- */

/// `MacroSection` names the macro-insertion sites a per-file unit collects
/// code for: the footer macro spliced into each reflected class, the footer
/// macro spliced at the end of the user header, and the head/tail of the
/// generated source file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MacroSection {
    ClassFooter,
    HeaderFileFooter,
    SourceFileHeader,
    SourceFileFooter,
}

/* -------------------------------------------------------------------------- */
/*                            Struct: MacroEnvState                           */
/* -------------------------------------------------------------------------- */

/// `MacroEnvState` is the environment extension a [`MacroCodeGenUnit`]
/// installs so property generators know which insertion site is being
/// filled.
#[derive(Clone, Copy, Debug)]
pub struct MacroEnvState {
    pub section: MacroSection,
}

/* -------------------------------------------------------------------------- */
/*                          Struct: MacroUnitSettings                         */
/* -------------------------------------------------------------------------- */

/// `MacroUnitSettings` configures artifact naming for a per-file unit. File
/// name patterns substitute `##FILENAME##` with the input file stem; the
/// class footer macro pattern substitutes `##CLASSFULLNAME##` with the class
/// path (`::` flattened to `_`).
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct MacroUnitSettings {
    pub class_footer_macro_pattern: String,
    pub generated_header_file_name_pattern: String,
    pub generated_source_file_name_pattern: String,
    pub header_file_footer_macro_pattern: String,
    pub output_directory: PathBuf,
}

impl Default for MacroUnitSettings {
    fn default() -> Self {
        MacroUnitSettings {
            class_footer_macro_pattern: "##CLASSFULLNAME##_GENERATED".to_string(),
            generated_header_file_name_pattern: "##FILENAME##.h.h".to_string(),
            generated_source_file_name_pattern: "##FILENAME##.src.h".to_string(),
            header_file_footer_macro_pattern: "File_##FILENAME##_GENERATED".to_string(),
            output_directory: PathBuf::new(),
        }
    }
}

impl MacroUnitSettings {
    pub fn generated_header_file_name(&self, stem: &str) -> String {
        self.generated_header_file_name_pattern
            .replace("##FILENAME##", stem)
    }

    pub fn generated_source_file_name(&self, stem: &str) -> String {
        self.generated_source_file_name_pattern
            .replace("##FILENAME##", stem)
    }

    pub fn class_footer_macro(&self, class_full_name: &str) -> String {
        self.class_footer_macro_pattern
            .replace("##CLASSFULLNAME##", &class_full_name.replace("::", "_"))
    }

    pub fn header_file_footer_macro(&self, stem: &str) -> String {
        self.header_file_footer_macro_pattern
            .replace("##FILENAME##", stem)
    }
}

/* -------------------------------------------------------------------------- */
/*                          Struct: MacroCodeGenUnit                          */
/* -------------------------------------------------------------------------- */

/// `MacroCodeGenUnit` emits one `{generated header, generated source}` pair
/// per input file. Generated class footers become `#define`d macros user
/// code splices in; the generated source collects out-of-line definitions.
pub struct MacroCodeGenUnit {
    class_footers: Vec<(String, String)>,
    header_file_footer: String,
    iteration_count: u8,
    modules: Vec<Box<dyn CodeGenModule>>,
    settings: MacroUnitSettings,
    source_file_footer: String,
    source_file_header: String,
}

impl MacroCodeGenUnit {
    pub fn new(settings: MacroUnitSettings) -> Self {
        MacroCodeGenUnit {
            class_footers: Vec::new(),
            header_file_footer: String::new(),
            iteration_count: 1,
            modules: Vec::new(),
            settings,
            source_file_footer: String::new(),
            source_file_header: String::new(),
        }
    }

    pub fn add_module(&mut self, module: impl CodeGenModule + 'static) {
        self.modules.push(Box::new(module));
    }

    pub fn set_iteration_count(&mut self, iteration_count: u8) {
        self.iteration_count = iteration_count;
    }

    pub fn settings(&self) -> &MacroUnitSettings {
        &self.settings
    }
}

/* ---------------------------- Impl: CodeGenUnit ---------------------------- */

impl CodeGenUnit for MacroCodeGenUnit {
    fn clone_boxed(&self) -> Box<dyn CodeGenUnit> {
        Box::new(MacroCodeGenUnit {
            class_footers: self.class_footers.clone(),
            header_file_footer: self.header_file_footer.clone(),
            iteration_count: self.iteration_count,
            modules: self.modules.iter().map(|m| m.clone_boxed()).collect(),
            settings: self.settings.clone(),
            source_file_footer: self.source_file_footer.clone(),
            source_file_header: self.source_file_header.clone(),
        })
    }

    fn output_directory(&self) -> &Path {
        &self.settings.output_directory
    }

    fn iteration_count(&self) -> u8 {
        self.iteration_count
    }

    /// Compares timestamps: the artifacts are current when both exist and
    /// are no older than the input.
    fn is_up_to_date(&self, input: &Path) -> bool {
        let Some(stem) = input.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };

        let header = self
            .settings
            .output_directory
            .join(self.settings.generated_header_file_name(stem));
        let source = self
            .settings
            .output_directory
            .join(self.settings.generated_source_file_name(stem));

        match (
            modified_time(input),
            modified_time(&header),
            modified_time(&source),
        ) {
            (Some(input), Some(header), Some(source)) => header >= input && source >= input,
            _ => false,
        }
    }

    fn create_env(&self, logger: SharedLogger) -> CodeGenEnv {
        CodeGenEnv::new(logger)
    }

    fn pre_generate_code(&mut self, env: &mut CodeGenEnv) -> bool {
        self.class_footers.clear();
        self.header_file_footer.clear();
        self.source_file_header.clear();
        self.source_file_footer.clear();

        env.set_extension(MacroEnvState {
            section: MacroSection::SourceFileHeader,
        });

        true
    }

    fn generate_code(&mut self, result: Arc<FileParsingResult>, env: &mut CodeGenEnv) -> bool {
        env.set_file_result(result.clone());

        let MacroCodeGenUnit {
            class_footers,
            header_file_footer,
            modules,
            source_file_footer,
            source_file_header,
            ..
        } = self;

        if modules.is_empty() {
            return true;
        }

        for module in modules.iter_mut() {
            if !initial_generate_with_module(module, env, source_file_header) {
                return false;
            }
        }

        let ok = traverse_entities(&result, &mut |entity| {
            let mut combined = TraversalBehaviour::Break;

            for section in [
                MacroSection::ClassFooter,
                MacroSection::HeaderFileFooter,
                MacroSection::SourceFileHeader,
                MacroSection::SourceFileFooter,
            ] {
                let buffer: &mut String = match section {
                    MacroSection::ClassFooter => {
                        let Some(owner) = result.owner_class_of(entity) else {
                            continue;
                        };
                        footer_buffer(class_footers, &owner.full_name)
                    }
                    MacroSection::HeaderFileFooter => header_file_footer,
                    MacroSection::SourceFileHeader => source_file_header,
                    MacroSection::SourceFileFooter => source_file_footer,
                };

                if let Some(state) = env.extension_mut::<MacroEnvState>() {
                    state.section = section;
                }

                for module in modules.iter_mut() {
                    match generate_entity_with_module(module, entity, env, buffer) {
                        Some(behaviour) => combined = combined.prefer(behaviour),
                        None => return None,
                    }
                }
            }

            Some(combined)
        });

        if !ok {
            return false;
        }

        for module in modules.iter_mut() {
            if !final_generate_with_module(module, env, source_file_footer) {
                return false;
            }
        }

        true
    }

    fn post_generate_code(&mut self, env: &mut CodeGenEnv) -> bool {
        let Some(result) = env.file_result_arc() else {
            return false;
        };
        let Some(stem) = result.parsed_file.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        let Some(input_name) = result.parsed_file.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        let header_path = self
            .settings
            .output_directory
            .join(self.settings.generated_header_file_name(stem));
        let mut header = GeneratedFile::new(&header_path);

        header.write_line("#pragma once");
        header.write_line("");

        for (class_full_name, footer) in &self.class_footers {
            header.write_line(&format!(
                "#define {} {}",
                self.settings.class_footer_macro(class_full_name),
                escape_macro_body(footer)
            ));
            header.write_line("");
        }

        header.write_line(&format!(
            "#define {} {}",
            self.settings.header_file_footer_macro(stem),
            escape_macro_body(&self.header_file_footer)
        ));

        let source_path = self
            .settings
            .output_directory
            .join(self.settings.generated_source_file_name(stem));
        let mut source = GeneratedFile::new(&source_path);

        source.write_line("#pragma once");
        source.write_line("");
        source.write_line(&format!("#include \"{input_name}\""));
        source.write_line("");
        source.write(&self.source_file_header);
        source.write(&self.source_file_footer);

        for artifact in [header, source] {
            let path = artifact.path().to_owned();

            if let Err(error) = artifact.commit() {
                env.logger().log(
                    LogSeverity::Error,
                    &format!("failed to write generated file {path:?}: {error}"),
                );
                return false;
            }
        }

        true
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Fn: Helpers                                */
/* -------------------------------------------------------------------------- */

/// `footer_buffer` finds or creates the footer buffer for one class,
/// preserving first-encounter order.
fn footer_buffer<'a>(footers: &'a mut Vec<(String, String)>, class: &str) -> &'a mut String {
    let index = match footers.iter().position(|(name, _)| name == class) {
        Some(index) => index,
        None => {
            footers.push((class.to_string(), String::new()));
            footers.len() - 1
        }
    };

    &mut footers[index].1
}

/// `escape_macro_body` turns a multi-line buffer into a single macro body
/// with line continuations.
fn escape_macro_body(body: &str) -> String {
    body.trim_end().replace('\n', "\\\n\t")
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */
