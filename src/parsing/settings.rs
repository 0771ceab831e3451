use derive_builder::Builder;
use derive_more::Display;
use std::path::PathBuf;

use crate::entity::EntityKind;
use crate::property::RuleRegistry;

/* -------------------------------------------------------------------------- */
/*                           Struct: PropertySyntax                           */
/* -------------------------------------------------------------------------- */

/// `PropertySyntax` is the character set the property parser splits
/// annotation payloads with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PropertySyntax {
    pub argument_enclosers: [char; 2],
    pub argument_separator: char,
    pub property_separator: char,
}

impl Default for PropertySyntax {
    fn default() -> Self {
        PropertySyntax {
            argument_enclosers: ['[', ']'],
            argument_separator: ',',
            property_separator: ',',
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                           Enum: CompilerIdentity                           */
/* -------------------------------------------------------------------------- */

/// `CompilerIdentity` names the compiler whose header environment input
/// files are written against.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum CompilerIdentity {
    #[display("clang")]
    #[default]
    Clang,
    #[display("gcc")]
    Gcc,
    #[display("msvc")]
    Msvc,
}

impl CompilerIdentity {
    /// `from_name` resolves a configuration string into an identity.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "clang" => Some(CompilerIdentity::Clang),
            "gcc" => Some(CompilerIdentity::Gcc),
            "msvc" => Some(CompilerIdentity::Msvc),
            _ => None,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                             Struct: MacroNames                             */
/* -------------------------------------------------------------------------- */

/// `MacroNames` is the annotation-macro vocabulary, one macro per entity
/// kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MacroNames {
    pub class_macro: String,
    pub enum_macro: String,
    pub enum_value_macro: String,
    pub field_macro: String,
    pub function_macro: String,
    pub method_macro: String,
    pub namespace_macro: String,
    pub struct_macro: String,
}

impl Default for MacroNames {
    fn default() -> Self {
        MacroNames {
            class_macro: "KGClass".to_string(),
            enum_macro: "KGEnum".to_string(),
            enum_value_macro: "KGEnumVal".to_string(),
            field_macro: "KGField".to_string(),
            function_macro: "KGFunction".to_string(),
            method_macro: "KGMethod".to_string(),
            namespace_macro: "KGNamespace".to_string(),
            struct_macro: "KGStruct".to_string(),
        }
    }
}

impl MacroNames {
    /// `tag_pairs` returns every `(macro name, kind tag)` binding in a fixed
    /// order. The tag alphabet is the wire form annotation payloads are
    /// prefixed with.
    pub fn tag_pairs(&self) -> [(&str, &'static str); 8] {
        [
            (self.namespace_macro.as_str(), "KGN"),
            (self.class_macro.as_str(), "KGC"),
            (self.struct_macro.as_str(), "KGS"),
            (self.field_macro.as_str(), "KGF"),
            (self.method_macro.as_str(), "KGM"),
            (self.enum_macro.as_str(), "KGE"),
            (self.enum_value_macro.as_str(), "KGEV"),
            (self.function_macro.as_str(), "KGFN"),
        ]
    }
}

/// `kind_tag` maps an entity kind to the annotation tag that marks it.
pub(crate) fn kind_tag(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Namespace => "KGN",
        EntityKind::Class => "KGC",
        EntityKind::Struct => "KGS",
        EntityKind::Field => "KGF",
        EntityKind::Method => "KGM",
        EntityKind::Enum => "KGE",
        EntityKind::EnumValue => "KGEV",
        EntityKind::Function => "KGFN",
    }
}

/* -------------------------------------------------------------------------- */
/*                           Struct: ParsingSettings                          */
/* -------------------------------------------------------------------------- */

/// `ParsingSettings` configures one [`crate::parsing::FileParser`]: macro
/// vocabulary, property syntax, rule registry, abort policy, and the compiler
/// environment inputs are parsed under.
#[derive(Builder, Clone, Default)]
#[builder(default)]
pub struct ParsingSettings {
    pub compiler: CompilerIdentity,
    pub include_directories: Vec<PathBuf>,
    pub macro_names: MacroNames,
    pub property_syntax: PropertySyntax,
    pub rules: RuleRegistry,
    pub should_abort_on_first_error: bool,
}

impl ParsingSettings {
    /// `make_annotation_arguments` builds the compiler arguments handed to
    /// the AST source: the language selector, the generation marker, one `-D`
    /// rewrite per annotation macro turning it into an annotate-attribute
    /// with the kind tag prefixed to the stringified arguments, and the
    /// include search roots.
    pub fn make_annotation_arguments(&self) -> Vec<String> {
        let pairs = self.macro_names.tag_pairs();
        let mut arguments = Vec::with_capacity(2 + pairs.len() + self.include_directories.len());

        arguments.push("-xc++".to_string());
        arguments.push("-DKODGEN_PARSING".to_string());

        for (name, tag) in pairs {
            arguments.push(format!(
                "-D{name}(...)=__attribute__((annotate(\"{tag}:\"#__VA_ARGS__)))"
            ));
        }

        for directory in &self.include_directories {
            arguments.push(format!("-I{}", directory.display()));
        }

        arguments
    }
}

impl std::fmt::Debug for ParsingSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsingSettings")
            .field("compiler", &self.compiler)
            .field("include_directories", &self.include_directories)
            .field("macro_names", &self.macro_names)
            .field("property_syntax", &self.property_syntax)
            .field("should_abort_on_first_error", &self.should_abort_on_first_error)
            .finish_non_exhaustive()
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_annotation_arguments_wire_form() {
        // Given: Default settings with one include root.
        let settings = ParsingSettingsBuilder::default()
            .include_directories(vec!["/project/include".into()])
            .build()
            .expect("settings build");

        // When: Building the compiler arguments.
        let arguments = settings.make_annotation_arguments();

        // Then: The language selector and marker lead, each macro rewrites to
        // a tagged annotate attribute, and include roots trail.
        assert_eq!(arguments[0], "-xc++");
        assert_eq!(arguments[1], "-DKODGEN_PARSING");
        assert!(arguments.contains(
            &"-DKGClass(...)=__attribute__((annotate(\"KGC:\"#__VA_ARGS__)))".to_string()
        ));
        assert!(arguments.contains(
            &"-DKGEnumVal(...)=__attribute__((annotate(\"KGEV:\"#__VA_ARGS__)))".to_string()
        ));
        assert_eq!(arguments.last().map(String::as_str), Some("-I/project/include"));
    }
}
