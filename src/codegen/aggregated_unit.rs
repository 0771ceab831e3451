use derive_builder::Builder;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

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
/*                           Enum: AggregateSection                           */
/* -------------------------------------------------------------------------- */

/// `AggregateSection` names the logical positions of the aggregated
/// artifact. Every entity is offered to the generators once per section, in
/// this order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateSection {
    Includes,
    Vectors,
    EnumValues,
    TypeDefs,
    AccessorFuncDef,
    AccessorFuncPtrArr,
    EmplaceFuncDef,
    TemplateInsts,
}

impl AggregateSection {
    pub const ALL: [AggregateSection; 8] = [
        AggregateSection::Includes,
        AggregateSection::Vectors,
        AggregateSection::EnumValues,
        AggregateSection::TypeDefs,
        AggregateSection::AccessorFuncDef,
        AggregateSection::AccessorFuncPtrArr,
        AggregateSection::EmplaceFuncDef,
        AggregateSection::TemplateInsts,
    ];

    const COUNT: usize = AggregateSection::ALL.len();

    fn index(self) -> usize {
        match self {
            AggregateSection::Includes => 0,
            AggregateSection::Vectors => 1,
            AggregateSection::EnumValues => 2,
            AggregateSection::TypeDefs => 3,
            AggregateSection::AccessorFuncDef => 4,
            AggregateSection::AccessorFuncPtrArr => 5,
            AggregateSection::EmplaceFuncDef => 6,
            AggregateSection::TemplateInsts => 7,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                         Struct: AggregatedEnvState                         */
/* -------------------------------------------------------------------------- */

/// `AggregatedEnvState` is the environment extension an aggregated unit
/// installs: the section currently being filled, plus a first-entity flag
/// generators use to open `if`/`else if` chains.
#[derive(Clone, Copy, Debug)]
pub struct AggregatedEnvState {
    pub is_first: bool,
    pub section: AggregateSection,
}

/* -------------------------------------------------------------------------- */
/*                       Struct: AggregatedUnitSettings                       */
/* -------------------------------------------------------------------------- */

/// `AggregatedUnitSettings` configures the single artifact an aggregated
/// unit emits.
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct AggregatedUnitSettings {
    pub class_name: String,
    pub file_name: String,
    pub header_file_extension: String,
    pub namespace_name: String,
    pub output_directory: PathBuf,
}

impl Default for AggregatedUnitSettings {
    fn default() -> Self {
        AggregatedUnitSettings {
            class_name: "DataState".to_string(),
            file_name: "DataState".to_string(),
            header_file_extension: ".h.hpp".to_string(),
            namespace_name: String::new(),
            output_directory: PathBuf::new(),
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                        Struct: AggregatedCodeGenUnit                       */
/* -------------------------------------------------------------------------- */

/// `AggregatedCodeGenUnit` collects code for every input file of a run into
/// shared per-section buffers and assembles them into one artifact header in
/// `post_generate_code`. Buffers accumulate across files; the single
/// environment of the all-files pass carries the section selector between
/// unit and generators.
pub struct AggregatedCodeGenUnit {
    iteration_count: u8,
    modules: Vec<Box<dyn CodeGenModule>>,
    sections: [String; AggregateSection::COUNT],
    settings: AggregatedUnitSettings,
}

impl AggregatedCodeGenUnit {
    pub fn new(settings: AggregatedUnitSettings) -> Self {
        AggregatedCodeGenUnit {
            iteration_count: 1,
            modules: Vec::new(),
            sections: Default::default(),
            settings,
        }
    }

    pub fn add_module(&mut self, module: impl CodeGenModule + 'static) {
        self.modules.push(Box::new(module));
    }

    pub fn set_iteration_count(&mut self, iteration_count: u8) {
        self.iteration_count = iteration_count;
    }

    pub fn settings(&self) -> &AggregatedUnitSettings {
        &self.settings
    }

    fn section(&mut self, section: AggregateSection) -> &mut String {
        &mut self.sections[section.index()]
    }
}

/* ---------------------------- Impl: CodeGenUnit ---------------------------- */

impl CodeGenUnit for AggregatedCodeGenUnit {
    fn clone_boxed(&self) -> Box<dyn CodeGenUnit> {
        Box::new(AggregatedCodeGenUnit {
            iteration_count: self.iteration_count,
            modules: self.modules.iter().map(|m| m.clone_boxed()).collect(),
            sections: self.sections.clone(),
            settings: self.settings.clone(),
        })
    }

    fn output_directory(&self) -> &Path {
        &self.settings.output_directory
    }

    fn iteration_count(&self) -> u8 {
        self.iteration_count
    }

    /// The aggregate depends on every input file; always regenerate.
    fn is_up_to_date(&self, _input: &Path) -> bool {
        false
    }

    fn create_env(&self, logger: SharedLogger) -> CodeGenEnv {
        CodeGenEnv::new(logger)
    }

    /// Seeds each section with its opener; the closers land in
    /// `post_generate_code`.
    fn pre_generate_code(&mut self, env: &mut CodeGenEnv) -> bool {
        for section in &mut self.sections {
            section.clear();
        }

        self.section(AggregateSection::Includes)
            .push_str("#include <array>\n#include <variant>\n#include <vector>\n");
        self.section(AggregateSection::EnumValues)
            .push_str("enum DataType : unsigned char\n{\n");
        self.section(AggregateSection::TypeDefs)
            .push_str("typedef std::variant<");
        self.section(AggregateSection::AccessorFuncDef)
            .push_str("template<DataType _DataType>\ninline DatasPtrVariant GetDatasPtrVar()\n{\n");
        self.section(AggregateSection::AccessorFuncPtrArr).push_str(
            "constexpr static std::array<GetDatasPtrVarFuncPtr, DataType_COUNT> getDatasPtrVarFuncPtrArr = {\n",
        );
        self.section(AggregateSection::EmplaceFuncDef)
            .push_str("template<DataType _DataType>\ninline void EmplaceBackData()\n{\n");

        env.set_extension(AggregatedEnvState {
            is_first: true,
            section: AggregateSection::Includes,
        });

        true
    }

    fn generate_code(&mut self, result: Arc<FileParsingResult>, env: &mut CodeGenEnv) -> bool {
        env.set_file_result(result.clone());

        let AggregatedCodeGenUnit {
            modules, sections, ..
        } = self;

        if modules.is_empty() {
            return true;
        }

        for module in modules.iter_mut() {
            if !initial_generate_with_module(
                module,
                env,
                &mut sections[AggregateSection::Includes.index()],
            ) {
                return false;
            }
        }

        let ok = traverse_entities(&result, &mut |entity| {
            let mut combined = TraversalBehaviour::Break;

            for section in AggregateSection::ALL {
                if let Some(state) = env.extension_mut::<AggregatedEnvState>() {
                    state.section = section;
                }

                let buffer = &mut sections[section.index()];

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
            if !final_generate_with_module(
                module,
                env,
                &mut sections[AggregateSection::TemplateInsts.index()],
            ) {
                return false;
            }
        }

        true
    }

    /// Assembles the aggregate struct: includes, member vectors, the type
    /// enum closed with its count enumerator, variant typedefs, the accessor
    /// and emplace function templates, the function-pointer array, and the
    /// template instantiations.
    fn post_generate_code(&mut self, env: &mut CodeGenEnv) -> bool {
        let settings = &self.settings;
        let path = settings.output_directory.join(format!(
            "{}{}",
            settings.file_name, settings.header_file_extension
        ));

        let mut artifact = GeneratedFile::new(&path);

        artifact.write_line("#pragma once");
        artifact.write_line("");
        artifact.write(&self.sections[AggregateSection::Includes.index()]);
        artifact.write_line("");

        if !settings.namespace_name.is_empty() {
            artifact.write_line(&format!("namespace {}\n{{", settings.namespace_name));
        }

        artifact.write_line(&format!("struct {}\n{{", settings.class_name));

        artifact.write(&self.sections[AggregateSection::Vectors.index()]);

        let enum_values = &self.sections[AggregateSection::EnumValues.index()];
        artifact.write(enum_values);
        artifact.write_line("DataType_COUNT\n};");

        let mut type_defs = self.sections[AggregateSection::TypeDefs.index()].clone();
        if type_defs.ends_with(',') {
            type_defs.pop();
        }
        artifact.write_line(&format!("{type_defs}> DatasPtrVariant;"));
        artifact.write_line("typedef DatasPtrVariant(DataState::* GetDatasPtrVarFuncPtr)();");
        artifact.write_line("");

        artifact.write(&self.sections[AggregateSection::AccessorFuncDef.index()]);
        artifact.write_line("else { static_assert(_DataType == DataType_COUNT, \"Invalid DataType\"); }\n}");
        artifact.write_line("");

        artifact.write(&self.sections[AggregateSection::EmplaceFuncDef.index()]);
        artifact.write_line("else { static_assert(_DataType == DataType_COUNT, \"Invalid DataType\"); }\n}");
        artifact.write_line("");

        let mut func_ptr_arr = self.sections[AggregateSection::AccessorFuncPtrArr.index()].clone();
        if func_ptr_arr.ends_with(",\n") {
            func_ptr_arr.truncate(func_ptr_arr.len() - 2);
            func_ptr_arr.push('\n');
        }
        artifact.write(&func_ptr_arr);
        artifact.write_line("};");

        artifact.write_line("};");

        artifact.write(&self.sections[AggregateSection::TemplateInsts.index()]);

        if !settings.namespace_name.is_empty() {
            artifact.write_line("}");
        }

        if let Err(error) = artifact.commit() {
            env.logger().log(
                LogSeverity::Error,
                &format!("failed to write generated file {path:?}: {error}"),
            );
            return false;
        }

        env.logger().log(
            LogSeverity::Info,
            &format!("aggregated artifact written to {path:?}"),
        );

        true
    }
}
