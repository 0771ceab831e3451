use crate::ast::CursorId;
use crate::ast::CursorKind;
use crate::ast::VisitControl;
use crate::entity::AccessSpecifier;
use crate::entity::BaseSpecifier;
use crate::entity::EntityDetail;
use crate::entity::EntityId;
use crate::entity::EntityInfo;
use crate::entity::EntityKind;

use super::enum_parser;
use super::file_parser::ParseContext;
use super::file_parser::parameters_of;
use super::file_parser::qualify;

/* -------------------------------------------------------------------------- */
/*                               Fn: ParseClass                               */
/* -------------------------------------------------------------------------- */

/// `parse_class` reflects a class or struct declaration: base list, final
/// flag, and members under the access specifier in force at their position.
/// An unannotated class is not reflected itself, but nested types are still
/// walked so reflected declarations inside it are found.
pub(super) fn parse_class(
    ctx: &mut ParseContext<'_>,
    id: CursorId,
    outer: Option<EntityId>,
    scope: &mut Vec<String>,
    is_struct: bool,
) -> VisitControl {
    let tu = ctx.tu;
    let cursor = tu.cursor(id);
    let name = cursor.spelling.clone();

    let kind = if is_struct {
        EntityKind::Struct
    } else {
        EntityKind::Class
    };

    let group = match ctx.bind_properties(id, kind) {
        Ok(group) => group,
        Err(VisitControl::Break) => return VisitControl::Break,
        Err(_) => None,
    };

    let Some(group) = group else {
        scope.push(name);
        let control = walk_nested_types(ctx, &cursor.children, outer, scope);
        scope.pop();
        return control;
    };

    let bases: Vec<BaseSpecifier> = cursor
        .children
        .iter()
        .map(|child| tu.cursor(*child))
        .filter(|c| c.kind == CursorKind::BaseSpecifier)
        .map(|c| BaseSpecifier {
            access: c.access.unwrap_or(if is_struct {
                AccessSpecifier::Public
            } else {
                AccessSpecifier::Private
            }),
            name: c.spelling.clone(),
        })
        .collect();

    let is_final = cursor
        .children
        .iter()
        .any(|child| tu.cursor(*child).kind == CursorKind::FinalAttr);

    let entity = EntityInfo {
        detail: EntityDetail::Class {
            bases,
            children: Vec::new(),
            is_final,
        },
        full_name: qualify(scope, &name),
        kind,
        location: cursor.location.clone(),
        name: name.clone(),
        outer,
        properties: vec![group],
    };

    let class_id = match ctx.insert_validated(entity) {
        Ok(class_id) => class_id,
        Err(VisitControl::Break) => return VisitControl::Break,
        Err(_) => {
            scope.push(name);
            let control = walk_nested_types(ctx, &cursor.children, outer, scope);
            scope.pop();
            return control;
        }
    };

    scope.push(name);

    let mut access = if is_struct {
        AccessSpecifier::Public
    } else {
        AccessSpecifier::Private
    };

    for &child in &cursor.children {
        let child_cursor = tu.cursor(child);

        let control = match child_cursor.kind {
            CursorKind::AccessSpecifier => {
                if let Some(specified) = child_cursor.access {
                    access = specified;
                }
                VisitControl::Continue
            }
            CursorKind::FieldDecl => parse_field(ctx, child, class_id, scope, access, false),
            CursorKind::VarDecl => parse_field(ctx, child, class_id, scope, access, true),
            CursorKind::Method => parse_method(ctx, child, class_id, scope, access),
            CursorKind::ClassDecl => parse_class(ctx, child, Some(class_id), scope, false),
            CursorKind::StructDecl => parse_class(ctx, child, Some(class_id), scope, true),
            CursorKind::EnumDecl => enum_parser::parse_enum(ctx, child, Some(class_id), scope),
            _ => VisitControl::Continue,
        };

        if control == VisitControl::Break {
            scope.pop();
            return VisitControl::Break;
        }
    }

    scope.pop();
    VisitControl::Continue
}

/* --------------------------- Fn: walk_nested_types ------------------------- */

/// `walk_nested_types` descends into the type declarations of an unreflected
/// class so annotated nested types attach to the nearest reflected ancestor.
fn walk_nested_types(
    ctx: &mut ParseContext<'_>,
    children: &[CursorId],
    outer: Option<EntityId>,
    scope: &mut Vec<String>,
) -> VisitControl {
    let tu = ctx.tu;

    for &child in children {
        let control = match tu.cursor(child).kind {
            CursorKind::ClassDecl => parse_class(ctx, child, outer, scope, false),
            CursorKind::StructDecl => parse_class(ctx, child, outer, scope, true),
            CursorKind::EnumDecl => enum_parser::parse_enum(ctx, child, outer, scope),
            _ => VisitControl::Continue,
        };

        if control == VisitControl::Break {
            return VisitControl::Break;
        }
    }

    VisitControl::Continue
}

/* ------------------------------ Fn: parse_field ---------------------------- */

/// `parse_field` reflects an annotated member variable. `force_static` marks
/// members the source reported as variable declarations (static storage).
fn parse_field(
    ctx: &mut ParseContext<'_>,
    id: CursorId,
    class_id: EntityId,
    scope: &mut Vec<String>,
    access: AccessSpecifier,
    force_static: bool,
) -> VisitControl {
    let tu = ctx.tu;
    let cursor = tu.cursor(id);

    let group = match ctx.bind_properties(id, EntityKind::Field) {
        Ok(Some(group)) => group,
        Ok(None) => return VisitControl::Continue,
        Err(control) => return control,
    };

    let entity = EntityInfo {
        detail: EntityDetail::Field {
            access,
            is_mutable: cursor.is_mutable,
            is_static: force_static || cursor.is_static,
            type_name: cursor.type_name.clone().unwrap_or_default(),
        },
        full_name: qualify(scope, &cursor.spelling),
        kind: EntityKind::Field,
        location: cursor.location.clone(),
        name: cursor.spelling.clone(),
        outer: Some(class_id),
        properties: vec![group],
    };

    match ctx.insert_validated(entity) {
        Ok(_) => VisitControl::Continue,
        Err(control) => control,
    }
}

/* ------------------------------ Fn: parse_method --------------------------- */

/// `parse_method` reflects an annotated member function with its qualifiers
/// and parameter list.
fn parse_method(
    ctx: &mut ParseContext<'_>,
    id: CursorId,
    class_id: EntityId,
    scope: &mut Vec<String>,
    access: AccessSpecifier,
) -> VisitControl {
    let tu = ctx.tu;
    let cursor = tu.cursor(id);

    let group = match ctx.bind_properties(id, EntityKind::Method) {
        Ok(Some(group)) => group,
        Ok(None) => return VisitControl::Continue,
        Err(control) => return control,
    };

    let entity = EntityInfo {
        detail: EntityDetail::Method {
            access,
            is_const: cursor.is_const,
            is_static: cursor.is_static,
            is_virtual: cursor.is_virtual,
            parameters: parameters_of(tu, id),
            return_type: cursor.type_name.clone().unwrap_or_default(),
        },
        full_name: qualify(scope, &cursor.spelling),
        kind: EntityKind::Method,
        location: cursor.location.clone(),
        name: cursor.spelling.clone(),
        outer: Some(class_id),
        properties: vec![group],
    };

    match ctx.insert_validated(entity) {
        Ok(_) => VisitControl::Continue,
        Err(control) => control,
    }
}
