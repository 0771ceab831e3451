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

/* -------------------------------------------------------------------------- */
/*                         Struct: GetPropertyCodeGen                         */
/* -------------------------------------------------------------------------- */

/// `GetPropertyCodeGen` reacts to `Get` on fields: it declares an accessor
/// in the owning class's footer and defines it in the generated source.
///
/// Accepted arguments: `const` (pointee/referee and accessor become const),
/// `*` / `&` (return a pointer/reference to the field; mutually exclusive),
/// and `explicit` (declare only, the user supplies the definition).
#[derive(Clone, Copy, Debug, Default)]
pub struct GetPropertyCodeGen;

/* --------------------------- Impl: PropertyCodeGen ------------------------- */

impl PropertyCodeGen for GetPropertyCodeGen {
    fn property_name(&self) -> &str {
        "Get"
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
        let has_ptr = property.arguments.iter().any(|a| a == "*");
        let has_ref = property.arguments.iter().any(|a| a == "&");

        let error_message = if has_ptr && has_ref {
            Some("Get can't accept both '*' and '&' at the same time".to_string())
        } else {
            property
                .arguments
                .iter()
                .find(|a| !matches!(a.as_str(), "*" | "&" | "const" | "explicit"))
                .map(|argument| {
                    format!(
                        "Get only accepts 'const', '*', '&' and 'explicit' arguments, got '{argument}'"
                    )
                })
        };

        if let Some(message) = error_message {
            env.logger().log(
                LogSeverity::Error,
                &format!("{message} (entity {})", entity.full_name),
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

        match state.section {
            MacroSection::ClassFooter => declare(entity, property, out),
            MacroSection::SourceFileHeader => define(entity, property, env, out),
            _ => true,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                             Struct: GetterShape                            */
/* -------------------------------------------------------------------------- */

struct GetterShape {
    is_const: bool,
    is_explicit: bool,
    is_ptr: bool,
    is_ref: bool,
}

impl GetterShape {
    fn of(property: &Property) -> Self {
        GetterShape {
            is_const: property.arguments.iter().any(|a| a == "const"),
            is_explicit: property.arguments.iter().any(|a| a == "explicit"),
            is_ptr: property.arguments.iter().any(|a| a == "*"),
            is_ref: property.arguments.iter().any(|a| a == "&"),
        }
    }

    fn is_indirect(&self) -> bool {
        self.is_ptr || self.is_ref
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Fn: Helpers                                */
/* -------------------------------------------------------------------------- */

/// `accessor_name` derives the accessor identifier from a field name:
/// leading underscores are stripped and the first character is upper-cased,
/// so `_someFloat` becomes `getSomeFloat`.
pub(super) fn accessor_name(prefix: &str, field_name: &str) -> String {
    let trimmed = field_name.trim_start_matches('_');
    let mut chars = trimmed.chars();

    match chars.next() {
        Some(first) => format!("{prefix}{}{}", first.to_uppercase(), chars.as_str()),
        None => format!("{prefix}{field_name}"),
    }
}

/// `signature_parts` builds the return type text and trailing qualifiers of
/// the accessor. A const field access or a by-value getter implies a const
/// accessor; static accessors carry no qualifier.
fn signature_parts(type_name: &str, shape: &GetterShape, is_static: bool) -> (String, String) {
    let mut return_type = format!("{type_name} ");
    let mut post_qualifiers = String::new();

    if !is_static && (shape.is_const || !shape.is_indirect()) {
        post_qualifiers = " const".to_string();
    }

    if shape.is_const && shape.is_indirect() {
        return_type.push_str(" const ");
    }

    if shape.is_ref {
        return_type.push_str("& ");
    } else if shape.is_ptr {
        return_type.push_str("* ");
    }

    (return_type, post_qualifiers)
}

fn declare(entity: &EntityInfo, property: &Property, out: &mut String) -> bool {
    let EntityDetail::Field {
        is_static,
        type_name,
        ..
    } = &entity.detail
    else {
        return false;
    };

    let shape = GetterShape::of(property);
    let (return_type, post_qualifiers) = signature_parts(type_name, &shape, *is_static);
    let storage = if *is_static { "static " } else { "" };

    out.push_str(&format!(
        "{storage}{return_type}{}(){post_qualifiers};\n",
        accessor_name("get", &entity.name)
    ));

    true
}

fn define(
    entity: &EntityInfo,
    property: &Property,
    env: &mut CodeGenEnv,
    out: &mut String,
) -> bool {
    let shape = GetterShape::of(property);

    // The user supplies the definition of an explicit accessor.
    if shape.is_explicit {
        return true;
    }

    let EntityDetail::Field {
        is_static,
        type_name,
        ..
    } = &entity.detail
    else {
        return false;
    };

    let Some(result) = env.file_result_arc() else {
        return false;
    };
    let Some(owner) = result.outer_of(entity) else {
        return false;
    };

    let (return_type, post_qualifiers) = signature_parts(type_name, &shape, *is_static);
    let return_name = if shape.is_ptr {
        format!("&{}", entity.name)
    } else {
        entity.name.clone()
    };

    out.push_str(&format!(
        "{return_type}{}::{}(){post_qualifiers} {{ return {return_name}; }}\n",
        owner.full_name,
        accessor_name("get", &entity.name)
    ));

    true
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use crate::entity::AccessSpecifier;

    use super::*;

    fn field(name: &str, type_name: &str, is_static: bool) -> EntityInfo {
        EntityInfo {
            detail: EntityDetail::Field {
                access: AccessSpecifier::Private,
                is_mutable: false,
                is_static,
                type_name: type_name.to_string(),
            },
            full_name: format!("SomeClass::{name}"),
            kind: EntityKind::Field,
            location: Default::default(),
            name: name.to_string(),
            outer: None,
            properties: Vec::new(),
        }
    }

    fn get_property(arguments: &[&str]) -> Property {
        Property {
            arguments: arguments.iter().map(|s| s.to_string()).collect(),
            name: "Get".to_string(),
        }
    }

    #[test]
    fn test_accessor_name_strips_underscores_and_capitalizes() {
        assert_eq!(accessor_name("get", "_someFloat"), "getSomeFloat");
        assert_eq!(accessor_name("get", "value"), "getValue");
        assert_eq!(accessor_name("set", "__count"), "setCount");
    }

    #[test]
    fn test_declare_const_pointer_getter() {
        // Given: A float field with Get[const, *].
        let entity = field("_someFloat", "float", false);
        let property = get_property(&["const", "*"]);

        // When: Declaring the accessor.
        let mut out = String::new();
        assert!(declare(&entity, &property, &mut out));

        // Then: A const pointer-to-const accessor is declared.
        assert_eq!(out, "float  const * getSomeFloat() const;\n");
    }

    #[test]
    fn test_declare_by_value_getter_is_const() {
        // Given: A plain char field with Get.
        let entity = field("_someChar", "char", false);
        let property = get_property(&[]);

        // When: Declaring the accessor.
        let mut out = String::new();
        assert!(declare(&entity, &property, &mut out));

        // Then: A by-value getter is const-qualified.
        assert_eq!(out, "char getSomeChar() const;\n");
    }

    #[test]
    fn test_declare_static_getter_has_no_qualifier() {
        // Given: A static field with Get.
        let entity = field("_instanceCount", "int", true);
        let property = get_property(&[]);

        // When: Declaring the accessor.
        let mut out = String::new();
        assert!(declare(&entity, &property, &mut out));

        // Then: The accessor is static and unqualified.
        assert_eq!(out, "static int getInstanceCount();\n");
    }

    #[test]
    fn test_pre_generate_rejects_pointer_and_reference_together() {
        // Given: A Get with both '*' and '&'.
        let entity = field("_x", "int", false);
        let property = get_property(&["*", "&"]);
        let mut env = CodeGenEnv::new(std::sync::Arc::new(crate::log::DefaultLogger));

        // When: Validating the pairing.
        // Then: The generator rejects it.
        let mut generator = GetPropertyCodeGen;
        assert!(!generator.pre_generate_code_for_entity(&entity, &property, 0, &mut env));
    }

    #[test]
    fn test_pre_generate_rejects_unknown_argument() {
        // Given: A Get with an unsupported argument.
        let entity = field("_x", "int", false);
        let property = get_property(&["volatile"]);
        let mut env = CodeGenEnv::new(std::sync::Arc::new(crate::log::DefaultLogger));

        // When: Validating the pairing.
        // Then: The generator rejects it.
        let mut generator = GetPropertyCodeGen;
        assert!(!generator.pre_generate_code_for_entity(&entity, &property, 0, &mut env));
    }
}
