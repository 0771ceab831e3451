use itertools::Itertools;

use crate::parsing::PropertySyntax;

use super::EntityKind;

/* -------------------------------------------------------------------------- */
/*                              Struct: Property                              */
/* -------------------------------------------------------------------------- */

/// `Property` is one decoded annotation entry: a name plus the raw textual
/// arguments attached to it. Arguments carry no type information; generators
/// interpret them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    pub arguments: Vec<String>,
    pub name: String,
}

/* -------------------------------------------------------------------------- */
/*                            Struct: PropertyGroup                           */
/* -------------------------------------------------------------------------- */

/// `PropertyGroup` is the ordered sequence of properties decoded from one
/// annotation occurrence, tagged with the entity kind it attaches to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyGroup {
    pub kind: EntityKind,
    pub properties: Vec<Property>,
}

/* --------------------------- Impl: PropertyGroup -------------------------- */

impl PropertyGroup {
    /// `serialize` renders the group back into annotation-payload form using
    /// the provided syntax characters. Re-parsing the output yields an equal
    /// group (modulo whitespace).
    pub fn serialize(&self, syntax: &PropertySyntax) -> String {
        self.properties
            .iter()
            .map(|property| {
                if property.arguments.is_empty() {
                    property.name.clone()
                } else {
                    format!(
                        "{}{}{}{}",
                        property.name,
                        syntax.argument_enclosers[0],
                        property
                            .arguments
                            .iter()
                            .join(&syntax.argument_separator.to_string()),
                        syntax.argument_enclosers[1],
                    )
                }
            })
            .join(&syntax.property_separator.to_string())
    }
}
