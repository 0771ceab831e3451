use chumsky::prelude::*;
use chumsky::text::ascii::ident;
use thiserror::Error;

use crate::entity::EntityInfo;
use crate::entity::EntityKind;
use crate::entity::Property;
use crate::entity::PropertyGroup;
use crate::parsing::PropertySyntax;

use super::RuleRegistry;

/* -------------------------------------------------------------------------- */
/*                         Enum: PropertyParseFailure                         */
/* -------------------------------------------------------------------------- */

/// `PropertyParseFailure` covers every way decoding or validating an
/// annotation payload can fail.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PropertyParseFailure {
    #[error("malformed property syntax: {0}")]
    Malformed(String),

    #[error("unknown property '{0}' on {1} entities")]
    Unknown(String, EntityKind),

    #[error("property '{0}' rejected: {1}")]
    RuleRejected(String, String),
}

/* -------------------------------------------------------------------------- */
/*                        Fn: ParseAnnotationPayload                          */
/* -------------------------------------------------------------------------- */

/// `parse_annotation_payload` decodes an annotation payload into a
/// [`PropertyGroup`] using the configured syntax characters.
///
/// The grammar is `property (SEP property)*` where a property is a name
/// optionally followed by an enclosed, separator-delimited argument list.
/// Arguments are raw text; an encloser character inside an argument is
/// malformed (no nesting), and an empty payload decodes to an empty group.
pub fn parse_annotation_payload(
    payload: &str,
    kind: EntityKind,
    syntax: &PropertySyntax,
) -> Result<PropertyGroup, PropertyParseFailure> {
    let payload = payload.trim();

    if payload.is_empty() {
        return Ok(PropertyGroup {
            kind,
            properties: Vec::new(),
        });
    }

    let mut properties = group_parser(syntax)
        .parse(payload)
        .into_result()
        .map_err(|errors| {
            let detail = errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecognized input".to_string());

            PropertyParseFailure::Malformed(detail)
        })?;

    for property in &mut properties {
        // `Name[]` is a property with zero arguments.
        if property.arguments.len() == 1 && property.arguments[0].is_empty() {
            property.arguments.clear();
        }

        if property.arguments.iter().any(String::is_empty) {
            return Err(PropertyParseFailure::Malformed(format!(
                "property '{}' has an empty argument",
                property.name
            )));
        }
    }

    Ok(PropertyGroup { kind, properties })
}

/* ---------------------------- Fn: group_parser ---------------------------- */

/// [group_parser] creates a parser which parses an annotation payload into a
/// sequence of [`Property`]s, parameterized by the configured separator and
/// encloser characters.
fn group_parser<'src>(
    syntax: &PropertySyntax,
) -> impl Parser<'src, &'src str, Vec<Property>, extra::Err<Rich<'src, char>>> {
    let [open, close] = syntax.argument_enclosers;
    let arg_sep = syntax.argument_separator;
    let prop_sep = syntax.property_separator;

    let argument = any()
        .filter(move |c: &char| *c != arg_sep && *c != open && *c != close)
        .repeated()
        .to_slice()
        .map(|s: &str| s.trim().to_string());

    let arguments = argument
        .separated_by(just(arg_sep))
        .collect::<Vec<String>>()
        .delimited_by(just(open), just(close));

    let property = ident()
        .padded()
        .then(arguments.or_not())
        .padded()
        .map(|(name, arguments): (&str, Option<Vec<String>>)| Property {
            arguments: arguments.unwrap_or_default(),
            name: name.to_string(),
        });

    property
        .separated_by(just(prop_sep))
        .collect::<Vec<Property>>()
        .then_ignore(end())
}

/* -------------------------------------------------------------------------- */
/*                            Fn: ValidateGroup                               */
/* -------------------------------------------------------------------------- */

/// `validate_group` checks every property of a freshly-parsed group against
/// the rule registry: names must be known (unless the kind is permissive) and
/// each known rule must accept the group.
pub fn validate_group(
    group: &PropertyGroup,
    registry: &RuleRegistry,
) -> Result<(), PropertyParseFailure> {
    for (index, property) in group.properties.iter().enumerate() {
        let Some(rule) = registry.lookup(group.kind, &property.name) else {
            if registry.allows_unknown(group.kind) {
                continue;
            }

            return Err(PropertyParseFailure::Unknown(
                property.name.clone(),
                group.kind,
            ));
        };

        if !rule.is_main_prop_syntax_valid(&property.name, group.kind) {
            return Err(PropertyParseFailure::RuleRejected(
                property.name.clone(),
                format!("not applicable to {} entities", group.kind),
            ));
        }

        rule.is_property_group_valid(group, index).map_err(|message| {
            PropertyParseFailure::RuleRejected(property.name.clone(), message)
        })?;
    }

    Ok(())
}

/* -------------------------------------------------------------------------- */
/*                            Fn: ValidateEntity                              */
/* -------------------------------------------------------------------------- */

/// `validate_entity` runs the entity-level rule hook for every property
/// attached to a fully-constructed entity.
pub fn validate_entity(
    entity: &EntityInfo,
    registry: &RuleRegistry,
) -> Result<(), PropertyParseFailure> {
    for group in &entity.properties {
        for (index, property) in group.properties.iter().enumerate() {
            let Some(rule) = registry.lookup(group.kind, &property.name) else {
                continue;
            };

            rule.is_entity_valid(entity, index).map_err(|message| {
                PropertyParseFailure::RuleRejected(property.name.clone(), message)
            })?;
        }
    }

    Ok(())
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::sync::Arc;

    use crate::property::DefaultPropertyRule;
    use crate::property::PropertyRule;

    use super::*;

    fn syntax() -> PropertySyntax {
        PropertySyntax::default()
    }

    #[test]
    fn test_parse_payload_names_and_arguments() {
        // Given: A payload with an argument list and a bare property.
        let payload = "Get[const, *], Set";

        // When: Parsing the payload for a field entity.
        let group = parse_annotation_payload(payload, EntityKind::Field, &syntax())
            .expect("payload parses");

        // Then: Properties and arguments keep their textual order.
        assert_eq!(group.kind, EntityKind::Field);
        assert_eq!(group.properties.len(), 2);
        assert_eq!(group.properties[0].name, "Get");
        assert_eq!(group.properties[0].arguments, vec!["const", "*"]);
        assert_eq!(group.properties[1].name, "Set");
        assert!(group.properties[1].arguments.is_empty());
    }

    #[rstest]
    #[case::empty_payload("", 0)]
    #[case::single_bare("Data", 1)]
    #[case::zero_arguments("Get[]", 1)]
    #[case::whitespace_only("   ", 0)]
    fn test_parse_payload_boundaries(#[case] payload: &str, #[case] expected: usize) {
        // Given: A boundary-shaped payload.
        // When: Parsing the payload.
        let group = parse_annotation_payload(payload, EntityKind::Class, &syntax())
            .expect("payload parses");

        // Then: The expected number of properties is produced.
        assert_eq!(group.properties.len(), expected);
        assert!(group.properties.iter().all(|p| p.arguments.is_empty()));
    }

    #[rstest]
    #[case::nested_encloser("Get[a[b,c]]")]
    #[case::unclosed_arguments("Get[const")]
    #[case::empty_interior_argument("Get[a,,b]")]
    #[case::missing_name("[const]")]
    fn test_parse_payload_malformed(#[case] payload: &str) {
        // Given: A malformed payload.
        // When: Parsing the payload.
        let result = parse_annotation_payload(payload, EntityKind::Field, &syntax());

        // Then: The failure is reported as malformed syntax.
        assert!(matches!(result, Err(PropertyParseFailure::Malformed(_))));
    }

    #[test]
    fn test_parse_payload_round_trip() {
        // Given: A parsed group re-serialized with the same syntax.
        let syntax = syntax();
        let group = parse_annotation_payload("Get[const, *], Set, Data[a]", EntityKind::Field, &syntax)
            .expect("payload parses");

        // When: Re-parsing the serialized form.
        let serialized = group.serialize(&syntax);
        let reparsed = parse_annotation_payload(&serialized, EntityKind::Field, &syntax)
            .expect("serialized form parses");

        // Then: The round trip is lossless.
        assert_eq!(group, reparsed);
    }

    #[test]
    fn test_validate_group_unknown_property_strict() {
        // Given: A registry with no rule for the property's name.
        let registry = RuleRegistry::new();
        let group = parse_annotation_payload("NotARule", EntityKind::Field, &syntax())
            .expect("payload parses");

        // When: Validating the group.
        let result = validate_group(&group, &registry);

        // Then: The unknown name is rejected.
        assert_eq!(
            result,
            Err(PropertyParseFailure::Unknown(
                "NotARule".to_string(),
                EntityKind::Field
            ))
        );
    }

    #[test]
    fn test_validate_group_unknown_property_permissive() {
        // Given: A registry with permissive mode enabled for fields.
        let mut registry = RuleRegistry::new();
        registry.register_parse_all_nested(&[EntityKind::Field]);
        let group = parse_annotation_payload("NotARule", EntityKind::Field, &syntax())
            .expect("payload parses");

        // When: Validating the group.
        // Then: The unknown name passes through.
        assert!(validate_group(&group, &registry).is_ok());
    }

    #[test]
    fn test_validate_group_rule_rejection() {
        // Given: A rule that rejects every group.
        struct RejectEverything;
        impl PropertyRule for RejectEverything {
            fn is_property_group_valid(
                &self,
                _group: &PropertyGroup,
                _index: usize,
            ) -> Result<(), String> {
                Err("never valid".to_string())
            }
        }

        let mut registry = RuleRegistry::new();
        registry.register(&[EntityKind::Field], "Get", Arc::new(RejectEverything));
        registry.register(&[EntityKind::Field], "Set", Arc::new(DefaultPropertyRule));

        let group = parse_annotation_payload("Set, Get", EntityKind::Field, &syntax())
            .expect("payload parses");

        // When: Validating the group.
        let result = validate_group(&group, &registry);

        // Then: The rejecting rule's message surfaces.
        assert_eq!(
            result,
            Err(PropertyParseFailure::RuleRejected(
                "Get".to_string(),
                "never valid".to_string()
            ))
        );
    }
}
