use std::path::Path;
use std::sync::Arc;

use crate::ast::AstSource;
use crate::ast::CursorId;
use crate::ast::CursorKind;
use crate::ast::SourceLocation;
use crate::ast::TranslationUnit;
use crate::ast::VisitControl;
use crate::entity::EntityDetail;
use crate::entity::EntityId;
use crate::entity::EntityInfo;
use crate::entity::EntityKind;
use crate::entity::Parameter;
use crate::entity::PropertyGroup;
use crate::property::parse_annotation_payload;
use crate::property::validate_entity;
use crate::property::validate_group;

use super::FileParsingResult;
use super::ParsingError;
use super::ParsingErrorKind;
use super::ParsingSettings;
use super::class_parser;
use super::enum_parser;
use super::settings::kind_tag;

/* -------------------------------------------------------------------------- */
/*                             Struct: FileParser                             */
/* -------------------------------------------------------------------------- */

/// `FileParser` turns one input file into a [`FileParsingResult`] by walking
/// the cursor tree surfaced by its [`AstSource`]. Parsers are cheap to clone;
/// the manager hands every worker task its own copy.
#[derive(Clone)]
pub struct FileParser {
    settings: Arc<ParsingSettings>,
    source: Arc<dyn AstSource>,
}

impl FileParser {
    pub fn new(source: Arc<dyn AstSource>, settings: Arc<ParsingSettings>) -> Self {
        FileParser { settings, source }
    }

    pub fn settings(&self) -> &ParsingSettings {
        &self.settings
    }

    /// `parse` produces the parsing result for `path`. Failures accumulate in
    /// the result's error list; when the settings request aborting on the
    /// first error, the cursor walk stops at the earliest opportunity.
    pub fn parse(&self, path: &Path) -> FileParsingResult {
        let mut result = FileParsingResult::new(path.to_owned());

        if !path.exists() || path.is_dir() {
            result.errors.push(ParsingError::new(
                ParsingErrorKind::NonexistentFile,
                SourceLocation {
                    file: path.to_owned(),
                    ..SourceLocation::default()
                },
            ));
            return result;
        }

        let index = self.source.create_index();
        let arguments = self.settings.make_annotation_arguments();

        let tu = match self.source.parse_file(&index, path, &arguments) {
            Ok(tu) => tu,
            Err(error) => {
                result.errors.push(ParsingError::new(
                    ParsingErrorKind::TranslationUnitInitFailed(error.to_string()),
                    SourceLocation {
                        file: path.to_owned(),
                        ..SourceLocation::default()
                    },
                ));
                return result;
            }
        };

        let mut ctx = ParseContext {
            result: &mut result,
            settings: &self.settings,
            tu: &tu,
        };

        let mut scope = Vec::new();
        walk_scope(&mut ctx, tu.roots(), None, &mut scope);

        result
    }
}

/* -------------------------------------------------------------------------- */
/*                            Struct: ParseContext                            */
/* -------------------------------------------------------------------------- */

/// `ParseContext` is the mutable state shared by the file, class, and enum
/// parsers while walking one translation unit.
pub(super) struct ParseContext<'a> {
    pub result: &'a mut FileParsingResult,
    pub settings: &'a ParsingSettings,
    pub tu: &'a TranslationUnit,
}

impl<'a> ParseContext<'a> {
    /// `record` appends an error and reports how the walk should proceed.
    pub fn record(&mut self, kind: ParsingErrorKind, location: SourceLocation) -> VisitControl {
        self.result.errors.push(ParsingError::new(kind, location));

        if self.settings.should_abort_on_first_error {
            VisitControl::Break
        } else {
            VisitControl::Continue
        }
    }

    /// `bind_properties` decodes and validates the annotation attached to a
    /// declaration cursor. `Ok(None)` means the declaration is unreflected;
    /// `Err` means the payload failed and the error was recorded.
    pub fn bind_properties(
        &mut self,
        id: CursorId,
        kind: EntityKind,
    ) -> Result<Option<PropertyGroup>, VisitControl> {
        let tu = self.tu;

        let Some((tag, payload)) = tu.annotation_of(id) else {
            return Ok(None);
        };

        if tag != kind_tag(kind) {
            return Ok(None);
        }

        let location = tu.cursor(id).location.clone();

        let decoded = parse_annotation_payload(payload, kind, &self.settings.property_syntax)
            .and_then(|group| {
                validate_group(&group, &self.settings.rules)?;
                Ok(group)
            });

        match decoded {
            Ok(group) => Ok(Some(group)),
            Err(failure) => Err(self.record(ParsingErrorKind::Property(failure), location)),
        }
    }

    /// `insert_validated` runs entity-level rule validation, then moves the
    /// entity into the arena. A rejected entity is not inserted.
    pub fn insert_validated(&mut self, entity: EntityInfo) -> Result<EntityId, VisitControl> {
        if let Err(failure) = validate_entity(&entity, &self.settings.rules) {
            let location = entity.location.clone();
            return Err(self.record(ParsingErrorKind::Property(failure), location));
        }

        Ok(self.result.insert(entity))
    }
}

/* -------------------------------------------------------------------------- */
/*                               Fn: WalkScope                                */
/* -------------------------------------------------------------------------- */

/// `walk_scope` dispatches file- or namespace-scope cursors. Cursors outside
/// the main file contribute nothing.
pub(super) fn walk_scope(
    ctx: &mut ParseContext<'_>,
    children: &[CursorId],
    outer: Option<EntityId>,
    scope: &mut Vec<String>,
) -> VisitControl {
    let tu = ctx.tu;

    for &child in children {
        let cursor = tu.cursor(child);

        if !cursor.is_from_main_file {
            continue;
        }

        let control = match cursor.kind {
            CursorKind::Namespace => parse_namespace(ctx, child, outer, scope),
            CursorKind::ClassDecl => class_parser::parse_class(ctx, child, outer, scope, false),
            CursorKind::StructDecl => class_parser::parse_class(ctx, child, outer, scope, true),
            CursorKind::EnumDecl => enum_parser::parse_enum(ctx, child, outer, scope),
            CursorKind::FunctionDecl => parse_function(ctx, child, outer, scope),
            _ => VisitControl::Continue,
        };

        if control == VisitControl::Break {
            return VisitControl::Break;
        }
    }

    VisitControl::Continue
}

/* ----------------------------- Fn: parse_namespace ------------------------ */

/// `parse_namespace` reflects an annotated namespace into an entity; an
/// unannotated namespace contributes only its scope prefix while nested
/// declarations are still walked.
fn parse_namespace(
    ctx: &mut ParseContext<'_>,
    id: CursorId,
    outer: Option<EntityId>,
    scope: &mut Vec<String>,
) -> VisitControl {
    let tu = ctx.tu;
    let cursor = tu.cursor(id);
    let name = cursor.spelling.clone();

    let group = match ctx.bind_properties(id, EntityKind::Namespace) {
        Ok(group) => group,
        Err(VisitControl::Break) => return VisitControl::Break,
        Err(_) => None,
    };

    let namespace_outer = match group {
        Some(group) => {
            let entity = EntityInfo {
                detail: EntityDetail::Namespace { children: Vec::new() },
                full_name: qualify(scope, &name),
                kind: EntityKind::Namespace,
                location: cursor.location.clone(),
                name: name.clone(),
                outer,
                properties: vec![group],
            };

            match ctx.insert_validated(entity) {
                Ok(id) => Some(id),
                Err(VisitControl::Break) => return VisitControl::Break,
                Err(_) => outer,
            }
        }
        None => outer,
    };

    scope.push(name);
    let control = walk_scope(ctx, &cursor.children, namespace_outer, scope);
    scope.pop();

    control
}

/* ----------------------------- Fn: parse_function ------------------------- */

/// `parse_function` reflects an annotated free function.
fn parse_function(
    ctx: &mut ParseContext<'_>,
    id: CursorId,
    outer: Option<EntityId>,
    scope: &mut Vec<String>,
) -> VisitControl {
    let tu = ctx.tu;
    let cursor = tu.cursor(id);

    let group = match ctx.bind_properties(id, EntityKind::Function) {
        Ok(Some(group)) => group,
        Ok(None) => return VisitControl::Continue,
        Err(control) => return control,
    };

    let entity = EntityInfo {
        detail: EntityDetail::Function {
            parameters: parameters_of(tu, id),
            return_type: cursor.type_name.clone().unwrap_or_default(),
        },
        full_name: qualify(scope, &cursor.spelling),
        kind: EntityKind::Function,
        location: cursor.location.clone(),
        name: cursor.spelling.clone(),
        outer,
        properties: vec![group],
    };

    match ctx.insert_validated(entity) {
        Ok(_) => VisitControl::Continue,
        Err(control) => control,
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Fn: Helpers                                */
/* -------------------------------------------------------------------------- */

/// `qualify` joins the scope prefix and a local name into a qualified path.
pub(super) fn qualify(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

/// `parameters_of` collects the parameter cursors of a method or function.
pub(super) fn parameters_of(tu: &TranslationUnit, id: CursorId) -> Vec<Parameter> {
    tu.cursor(id)
        .children
        .iter()
        .map(|child| tu.cursor(*child))
        .filter(|cursor| cursor.kind == CursorKind::ParamDecl)
        .map(|cursor| Parameter {
            name: cursor.spelling.clone(),
            type_name: cursor.type_name.clone().unwrap_or_default(),
        })
        .collect()
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */
