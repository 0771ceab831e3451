use crate::codegen::CodeGenEnv;
use crate::codegen::MacroEnvState;
use crate::codegen::MacroSection;
use crate::codegen::PropertyCodeGen;
use crate::entity::EntityDetail;
use crate::entity::EntityInfo;
use crate::entity::EntityKind;
use crate::entity::EntityKindSet;
use crate::entity::Property;
use crate::log::LogSeverity;

use super::get::accessor_name;

/* -------------------------------------------------------------------------- */
/*                         Struct: SetPropertyCodeGen                         */
/* -------------------------------------------------------------------------- */

/// `SetPropertyCodeGen` reacts to `Set` on fields: it declares a mutator in
/// the owning class's footer and defines it in the generated source. The
/// only accepted argument is `explicit`, which suppresses the definition.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetPropertyCodeGen;

/* --------------------------- Impl: PropertyCodeGen ------------------------- */

impl PropertyCodeGen for SetPropertyCodeGen {
    fn property_name(&self) -> &str {
        "Set"
    }

    fn accepted_kinds(&self) -> EntityKindSet {
        EntityKindSet::of(EntityKind::Field)
    }

    fn clone_boxed(&self) -> Box<dyn PropertyCodeGen> {
        Box::new(*self)
    }

    fn pre_generate_code_for_entity(
        &mut self,
        entity: &EntityInfo,
        property: &Property,
        _index: u8,
        env: &mut CodeGenEnv,
    ) -> bool {
        if let Some(argument) = property.arguments.iter().find(|a| *a != "explicit") {
            env.logger().log(
                LogSeverity::Error,
                &format!(
                    "Set only accepts the 'explicit' argument, got '{argument}' (entity {})",
                    entity.full_name
                ),
            );
            return false;
        }

        true
    }

    fn generate_code_for_entity(
        &mut self,
        entity: &EntityInfo,
        property: &Property,
        _index: u8,
        env: &mut CodeGenEnv,
        out: &mut String,
    ) -> bool {
        let Some(state) = env.extension::<MacroEnvState>() else {
            return true;
        };

        let EntityDetail::Field {
            is_static,
            type_name,
            ..
        } = &entity.detail
        else {
            return false;
        };

        match state.section {
            MacroSection::ClassFooter => {
                let storage = if *is_static { "static " } else { "" };
                out.push_str(&format!(
                    "{storage}void {}({type_name} value);\n",
                    accessor_name("set", &entity.name)
                ));
                true
            }
            MacroSection::SourceFileHeader => {
                if property.arguments.iter().any(|a| a == "explicit") {
                    return true;
                }

                let Some(result) = env.file_result_arc() else {
                    return false;
                };
                let Some(owner) = result.outer_of(entity) else {
                    return false;
                };

                out.push_str(&format!(
                    "void {}::{}({type_name} value) {{ {} = value; }}\n",
                    owner.full_name,
                    accessor_name("set", &entity.name),
                    entity.name
                ));
                true
            }
            _ => true,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::entity::AccessSpecifier;
    use crate::log::DefaultLogger;

    use super::*;

    #[test]
    fn test_set_declares_mutator_in_class_footer() {
        // Given: An int field with Set, under a class-footer environment.
        let entity = EntityInfo {
            detail: EntityDetail::Field {
                access: AccessSpecifier::Private,
                is_mutable: false,
                is_static: false,
                type_name: "int".to_string(),
            },
            full_name: "Holder::_value".to_string(),
            kind: EntityKind::Field,
            location: Default::default(),
            name: "_value".to_string(),
            outer: None,
            properties: Vec::new(),
        };
        let property = Property {
            arguments: Vec::new(),
            name: "Set".to_string(),
        };

        let mut env = CodeGenEnv::new(Arc::new(DefaultLogger));
        env.set_extension(MacroEnvState {
            section: MacroSection::ClassFooter,
        });

        // When: Generating for the class footer.
        let mut out = String::new();
        let mut generator = SetPropertyCodeGen;
        assert!(generator.generate_code_for_entity(&entity, &property, 0, &mut env, &mut out));

        // Then: The mutator declaration lands in the buffer.
        assert_eq!(out, "void setValue(int value);\n");
    }
}
