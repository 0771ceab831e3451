use crate::ast::CursorId;
use crate::ast::CursorKind;
use crate::ast::VisitControl;
use crate::entity::EntityDetail;
use crate::entity::EntityId;
use crate::entity::EntityInfo;
use crate::entity::EntityKind;

use super::file_parser::ParseContext;
use super::file_parser::qualify;

/* -------------------------------------------------------------------------- */
/*                                Fn: ParseEnum                               */
/* -------------------------------------------------------------------------- */

/// `parse_enum` reflects an annotated enum and all of its values. Values
/// carry their own optional property groups; the values of an unannotated
/// enum are not reflected.
pub(super) fn parse_enum(
    ctx: &mut ParseContext<'_>,
    id: CursorId,
    outer: Option<EntityId>,
    scope: &mut Vec<String>,
) -> VisitControl {
    let tu = ctx.tu;
    let cursor = tu.cursor(id);
    let name = cursor.spelling.clone();

    let group = match ctx.bind_properties(id, EntityKind::Enum) {
        Ok(Some(group)) => group,
        Ok(None) => return VisitControl::Continue,
        Err(control) => return control,
    };

    let entity = EntityInfo {
        detail: EntityDetail::Enum {
            children: Vec::new(),
            underlying_type: cursor.type_name.clone(),
        },
        full_name: qualify(scope, &name),
        kind: EntityKind::Enum,
        location: cursor.location.clone(),
        name: name.clone(),
        outer,
        properties: vec![group],
    };

    let enum_id = match ctx.insert_validated(entity) {
        Ok(enum_id) => enum_id,
        Err(control) => return control,
    };

    scope.push(name);

    for &child in &cursor.children {
        let child_cursor = tu.cursor(child);

        if child_cursor.kind != CursorKind::EnumConstantDecl {
            continue;
        }

        let group = match ctx.bind_properties(child, EntityKind::EnumValue) {
            Ok(group) => group,
            Err(VisitControl::Break) => {
                scope.pop();
                return VisitControl::Break;
            }
            Err(_) => None,
        };

        let value = EntityInfo {
            detail: EntityDetail::EnumValue,
            full_name: qualify(scope, &child_cursor.spelling),
            kind: EntityKind::EnumValue,
            location: child_cursor.location.clone(),
            name: child_cursor.spelling.clone(),
            outer: Some(enum_id),
            properties: group.into_iter().collect(),
        };

        if let Err(VisitControl::Break) = ctx.insert_validated(value) {
            scope.pop();
            return VisitControl::Break;
        }
    }

    scope.pop();
    VisitControl::Continue
}
