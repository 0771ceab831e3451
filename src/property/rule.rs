use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::EntityInfo;
use crate::entity::EntityKind;
use crate::entity::PropertyGroup;

/* -------------------------------------------------------------------------- */
/*                             Trait: PropertyRule                            */
/* -------------------------------------------------------------------------- */

/// `PropertyRule` validates one property name against the entities and groups
/// it appears in. Rules are registered per `(entity kind, property name)`
/// pair and shared across worker threads.
pub trait PropertyRule: Send + Sync {
    /// `is_main_prop_syntax_valid` reports whether the property name itself
    /// is acceptable on the given entity kind.
    fn is_main_prop_syntax_valid(&self, _property_name: &str, _kind: EntityKind) -> bool {
        true
    }

    /// `is_property_group_valid` validates the property at `index` in the
    /// context of its whole group.
    fn is_property_group_valid(&self, _group: &PropertyGroup, _index: usize) -> Result<(), String> {
        Ok(())
    }

    /// `is_entity_valid` validates the fully-constructed entity the property
    /// at `index` is attached to.
    fn is_entity_valid(&self, _entity: &EntityInfo, _index: usize) -> Result<(), String> {
        Ok(())
    }
}

/* -------------------------------------------------------------------------- */
/*                         Struct: DefaultPropertyRule                        */
/* -------------------------------------------------------------------------- */

/// `DefaultPropertyRule` accepts every group and entity. Registering it for a
/// `(kind, name)` pair makes the name known without constraining its use.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPropertyRule;

impl PropertyRule for DefaultPropertyRule {}

/* -------------------------------------------------------------------------- */
/*                          Struct: ParseAllNestedRule                        */
/* -------------------------------------------------------------------------- */

/// `ParseAllNestedRule` is the permissive-mode rule: registering it for an
/// entity kind lets property names without an explicit rule pass through
/// instead of failing as unknown.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseAllNestedRule;

impl PropertyRule for ParseAllNestedRule {}

/* -------------------------------------------------------------------------- */
/*                            Struct: RuleRegistry                            */
/* -------------------------------------------------------------------------- */

/// `RuleRegistry` maps `(entity kind, property name)` to the rule validating
/// it. Kinds without a [`ParseAllNestedRule`] are strict: a property name
/// with no registered rule is an error.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    permissive: Vec<EntityKind>,
    rules: HashMap<(EntityKind, String), Arc<dyn PropertyRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        RuleRegistry::default()
    }

    /// `register` binds `rule` to `name` for each of the given kinds.
    pub fn register(&mut self, kinds: &[EntityKind], name: &str, rule: Arc<dyn PropertyRule>) {
        for kind in kinds {
            self.rules.insert((*kind, name.to_string()), rule.clone());
        }
    }

    /// `register_parse_all_nested` switches the given kinds to permissive
    /// mode.
    pub fn register_parse_all_nested(&mut self, kinds: &[EntityKind]) {
        for kind in kinds {
            if !self.permissive.contains(kind) {
                self.permissive.push(*kind);
            }
        }
    }

    pub fn lookup(&self, kind: EntityKind, name: &str) -> Option<&Arc<dyn PropertyRule>> {
        self.rules.get(&(kind, name.to_string()))
    }

    /// `allows_unknown` reports whether unknown property names pass through
    /// for the given kind.
    pub fn allows_unknown(&self, kind: EntityKind) -> bool {
        self.permissive.contains(&kind)
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("permissive", &self.permissive)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}
