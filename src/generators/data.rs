use crate::codegen::AggregateSection;
use crate::codegen::AggregatedEnvState;
use crate::codegen::CodeGenEnv;
use crate::codegen::PropertyCodeGen;
use crate::entity::EntityInfo;
use crate::entity::EntityKind;
use crate::entity::EntityKindSet;
use crate::entity::Property;

/* -------------------------------------------------------------------------- */
/*                         Struct: DataPropertyCodeGen                        */
/* -------------------------------------------------------------------------- */

/// `DataPropertyCodeGen` reacts to `Data` on classes and structs, feeding
/// every section of the aggregated DataState artifact: the include for the
/// defining header, a storage vector, a type enumerator, a variant typedef
/// entry, the accessor and emplace `if constexpr` branches, the
/// function-pointer-array entry, and the template instantiation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DataPropertyCodeGen;

/* --------------------------- Impl: PropertyCodeGen ------------------------- */

impl PropertyCodeGen for DataPropertyCodeGen {
    fn property_name(&self) -> &str {
        "Data"
    }

    fn accepted_kinds(&self) -> EntityKindSet {
        EntityKindSet::of(EntityKind::Class).with(EntityKind::Struct)
    }

    fn clone_boxed(&self) -> Box<dyn PropertyCodeGen> {
        Box::new(*self)
    }

    fn generate_code_for_entity(
        &mut self,
        entity: &EntityInfo,
        _property: &Property,
        _index: u8,
        env: &mut CodeGenEnv,
        out: &mut String,
    ) -> bool {
        let Some(state) = env.extension::<AggregatedEnvState>() else {
            return true;
        };
        let section = state.section;
        let is_first = state.is_first;

        let name = &entity.name;
        let full_name = &entity.full_name;

        match section {
            AggregateSection::Includes => {
                let extension = env
                    .file_result_arc()
                    .and_then(|result| {
                        result
                            .parsed_file
                            .extension()
                            .map(|e| format!(".{}", e.to_string_lossy()))
                    })
                    .unwrap_or_default();

                out.push_str(&format!("#include \"{name}{extension}\"\n"));
            }
            AggregateSection::Vectors => {
                out.push_str(&format!("std::vector<{full_name}> data_{name};\n"));
            }
            AggregateSection::EnumValues => {
                out.push_str(&format!("DataType_{name},\n"));
            }
            AggregateSection::TypeDefs => {
                out.push_str(&format!("std::vector<{full_name}>*,"));
            }
            AggregateSection::AccessorFuncDef => {
                // `is_first` stays raised here; the emplace branch below is
                // the one that clears it.
                let keyword = if is_first { "if" } else { "else if" };
                out.push_str(&format!(
                    "{keyword} constexpr (_DataType == DataType_{name}) {{ return &data_{name}; }}\n"
                ));
            }
            AggregateSection::AccessorFuncPtrArr => {
                out.push_str(&format!(
                    "&DataState::template GetDatasPtrVar<DataType_{name}>,\n"
                ));
            }
            AggregateSection::EmplaceFuncDef => {
                let keyword = if is_first { "if" } else { "else if" };
                out.push_str(&format!(
                    "{keyword} constexpr (_DataType == DataType_{name}) {{ data_{name}.emplace_back(); }}\n"
                ));

                if let Some(state) = env.extension_mut::<AggregatedEnvState>() {
                    state.is_first = false;
                }
            }
            AggregateSection::TemplateInsts => {
                out.push_str(&format!(
                    "template void DataState::EmplaceBackData<DataState::DataType_{name}>();\n"
                ));
            }
        }

        true
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::entity::EntityDetail;
    use crate::log::DefaultLogger;

    use super::*;

    fn data_class(name: &str) -> EntityInfo {
        EntityInfo {
            detail: EntityDetail::Class {
                bases: Vec::new(),
                children: Vec::new(),
                is_final: false,
            },
            full_name: name.to_string(),
            kind: EntityKind::Class,
            location: Default::default(),
            name: name.to_string(),
            outer: None,
            properties: Vec::new(),
        }
    }

    fn env_at(section: AggregateSection, is_first: bool) -> CodeGenEnv {
        let mut env = CodeGenEnv::new(Arc::new(DefaultLogger));
        env.set_extension(AggregatedEnvState { is_first, section });
        env
    }

    fn generate(entity: &EntityInfo, env: &mut CodeGenEnv) -> String {
        let property = Property {
            arguments: Vec::new(),
            name: "Data".to_string(),
        };

        let mut out = String::new();
        let mut generator = DataPropertyCodeGen;
        assert!(generator.generate_code_for_entity(entity, &property, 0, env, &mut out));
        out
    }

    #[test]
    fn test_vector_and_enum_sections() {
        // Given: A Data class.
        let entity = data_class("SomeClass");

        // When: Generating the vector and enumerator entries.
        let vectors = generate(&entity, &mut env_at(AggregateSection::Vectors, true));
        let enums = generate(&entity, &mut env_at(AggregateSection::EnumValues, true));

        // Then: Storage and enumerator lines use the entity's name.
        assert_eq!(vectors, "std::vector<SomeClass> data_SomeClass;\n");
        assert_eq!(enums, "DataType_SomeClass,\n");
    }

    #[test]
    fn test_emplace_branch_chains_if_to_else_if() {
        // Given: Two Data classes sharing one environment.
        let first = data_class("A");
        let second = data_class("B");
        let mut env = env_at(AggregateSection::EmplaceFuncDef, true);

        // When: Generating the emplace branches in order.
        let first_branch = generate(&first, &mut env);
        let second_branch = generate(&second, &mut env);

        // Then: The first opens the chain and the second extends it.
        assert!(first_branch.starts_with("if constexpr"));
        assert!(second_branch.starts_with("else if constexpr"));
    }
}
