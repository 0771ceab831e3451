use derive_more::Display;

use crate::ast::SourceLocation;

use super::PropertyGroup;

/* -------------------------------------------------------------------------- */
/*                              Struct: EntityId                              */
/* -------------------------------------------------------------------------- */

/// `EntityId` indexes an entity inside the arena of the parsing result that
/// produced it. Back-references between entities are expressed through ids so
/// the arena stays the single owner of every entity.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("#{_0}")]
pub struct EntityId(pub(crate) usize);

/* -------------------------------------------------------------------------- */
/*                              Enum: EntityKind                              */
/* -------------------------------------------------------------------------- */

/// `EntityKind` identifies which declaration family a reflected entity comes
/// from.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum EntityKind {
    Namespace,
    Class,
    Struct,
    Field,
    Method,
    Function,
    Enum,
    EnumValue,
}

impl EntityKind {
    const fn bit(self) -> u16 {
        match self {
            EntityKind::Namespace => 1 << 0,
            EntityKind::Class => 1 << 1,
            EntityKind::Struct => 1 << 2,
            EntityKind::Field => 1 << 3,
            EntityKind::Method => 1 << 4,
            EntityKind::Function => 1 << 5,
            EntityKind::Enum => 1 << 6,
            EntityKind::EnumValue => 1 << 7,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                            Struct: EntityKindSet                           */
/* -------------------------------------------------------------------------- */

/// `EntityKindSet` is a set of [`EntityKind`]s, used by property generators
/// to advertise which entities they accept.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EntityKindSet(u16);

impl EntityKindSet {
    pub const fn empty() -> Self {
        EntityKindSet(0)
    }

    pub const fn of(kind: EntityKind) -> Self {
        EntityKindSet(kind.bit())
    }

    pub const fn with(self, kind: EntityKind) -> Self {
        EntityKindSet(self.0 | kind.bit())
    }

    pub const fn contains(self, kind: EntityKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

impl From<EntityKind> for EntityKindSet {
    fn from(kind: EntityKind) -> Self {
        EntityKindSet::of(kind)
    }
}

impl std::ops::BitOr for EntityKindSet {
    type Output = EntityKindSet;

    fn bitor(self, rhs: EntityKindSet) -> EntityKindSet {
        EntityKindSet(self.0 | rhs.0)
    }
}

/* -------------------------------------------------------------------------- */
/*                           Enum: AccessSpecifier                            */
/* -------------------------------------------------------------------------- */

/// `AccessSpecifier` records the access level a class member was declared
/// under.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum AccessSpecifier {
    Public,
    Protected,
    Private,
}

/* -------------------------------------------------------------------------- */
/*                            Struct: BaseSpecifier                           */
/* -------------------------------------------------------------------------- */

/// `BaseSpecifier` is one entry of a class's base list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BaseSpecifier {
    pub access: AccessSpecifier,
    pub name: String,
}

/* -------------------------------------------------------------------------- */
/*                             Struct: Parameter                              */
/* -------------------------------------------------------------------------- */

/// `Parameter` is one parameter of a method or free function, in canonical
/// textual form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

/* -------------------------------------------------------------------------- */
/*                             Struct: EntityInfo                             */
/* -------------------------------------------------------------------------- */

/// `EntityInfo` is one reflected declaration. Entities are created by the
/// file parser and never mutated afterward; `outer` points at the enclosing
/// entity through the owning arena and never owns anything itself.
#[derive(Clone, Debug)]
pub struct EntityInfo {
    pub detail: EntityDetail,
    pub full_name: String,
    pub kind: EntityKind,
    pub location: SourceLocation,
    pub name: String,
    pub outer: Option<EntityId>,
    pub properties: Vec<PropertyGroup>,
}

/* ---------------------------- Enum: EntityDetail -------------------------- */

/// `EntityDetail` carries the attributes specific to one [`EntityKind`].
/// `Class` is shared by classes and structs.
#[derive(Clone, Debug)]
pub enum EntityDetail {
    Namespace {
        children: Vec<EntityId>,
    },
    Class {
        bases: Vec<BaseSpecifier>,
        children: Vec<EntityId>,
        is_final: bool,
    },
    Field {
        access: AccessSpecifier,
        is_mutable: bool,
        is_static: bool,
        type_name: String,
    },
    Method {
        access: AccessSpecifier,
        is_const: bool,
        is_static: bool,
        is_virtual: bool,
        parameters: Vec<Parameter>,
        return_type: String,
    },
    Function {
        parameters: Vec<Parameter>,
        return_type: String,
    },
    Enum {
        children: Vec<EntityId>,
        underlying_type: Option<String>,
    },
    EnumValue,
}

/* ---------------------------- Impl: EntityInfo ---------------------------- */

impl EntityInfo {
    /// `children` returns the ordered child entity ids of this entity, empty
    /// for leaf kinds.
    pub fn children(&self) -> &[EntityId] {
        match &self.detail {
            EntityDetail::Namespace { children }
            | EntityDetail::Class { children, .. }
            | EntityDetail::Enum { children, .. } => children,
            _ => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<EntityId>> {
        match &mut self.detail {
            EntityDetail::Namespace { children }
            | EntityDetail::Class { children, .. }
            | EntityDetail::Enum { children, .. } => Some(children),
            _ => None,
        }
    }

    /// `field_type` returns the canonical type text of a field entity.
    pub fn field_type(&self) -> Option<&str> {
        match &self.detail {
            EntityDetail::Field { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// `is_static_field` reports whether this entity is a static field.
    pub fn is_static_field(&self) -> bool {
        matches!(&self.detail, EntityDetail::Field { is_static: true, .. })
    }
}
