use derive_more::Display;

use crate::entity::EntityInfo;
use crate::entity::EntityKindSet;
use crate::entity::Property;

use super::CodeGenEnv;

/* -------------------------------------------------------------------------- */
/*                          Enum: TraversalBehaviour                          */
/* -------------------------------------------------------------------------- */

/// `TraversalBehaviour` is how a module steers the entity traversal from its
/// per-entity hook: descend into the entity's children, skip them, or
/// abandon the remaining siblings at the current depth and resume at the
/// parent.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum TraversalBehaviour {
    Break,
    Continue,
    Recurse,
}

impl TraversalBehaviour {
    /// `prefer` combines the behaviours requested by several modules for the
    /// same entity; the most permissive one wins (`Recurse` over `Continue`
    /// over `Break`).
    pub fn prefer(self, other: TraversalBehaviour) -> TraversalBehaviour {
        match (self, other) {
            (TraversalBehaviour::Recurse, _) | (_, TraversalBehaviour::Recurse) => {
                TraversalBehaviour::Recurse
            }
            (TraversalBehaviour::Continue, _) | (_, TraversalBehaviour::Continue) => {
                TraversalBehaviour::Continue
            }
            _ => TraversalBehaviour::Break,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                           Trait: PropertyCodeGen                           */
/* -------------------------------------------------------------------------- */

/// `PropertyCodeGen` generates code for one property name on the entity
/// kinds it accepts. The generation hook is invoked once per occurrence of
/// the property in an entity's group, in textual order, with `index` telling
/// the occurrence's position inside the group.
///
/// `out` is an appendable buffer owned by the calling unit; every hook
/// returns a success flag, and a `false` aborts the surrounding generation
/// pass.
pub trait PropertyCodeGen: Send {
    /// `property_name` is the name this generator reacts to.
    fn property_name(&self) -> &str;

    /// `accepted_kinds` is the set of entity kinds this generator applies
    /// to.
    fn accepted_kinds(&self) -> EntityKindSet;

    /// `clone_boxed` duplicates the generator for another worker.
    fn clone_boxed(&self) -> Box<dyn PropertyCodeGen>;

    /// `initial_generate_code` runs once before any entity is visited.
    fn initial_generate_code(&mut self, _env: &mut CodeGenEnv, _out: &mut String) -> bool {
        true
    }

    /// `pre_generate_code_for_entity` validates an entity/property pairing
    /// before generation; returning `false` aborts the pass.
    fn pre_generate_code_for_entity(
        &mut self,
        _entity: &EntityInfo,
        _property: &Property,
        _index: u8,
        _env: &mut CodeGenEnv,
    ) -> bool {
        true
    }

    /// `generate_code_for_entity` appends this generator's output for one
    /// property occurrence to `out`.
    fn generate_code_for_entity(
        &mut self,
        entity: &EntityInfo,
        property: &Property,
        index: u8,
        env: &mut CodeGenEnv,
        out: &mut String,
    ) -> bool;

    /// `final_generate_code` runs once after the last entity was visited.
    fn final_generate_code(&mut self, _env: &mut CodeGenEnv, _out: &mut String) -> bool {
        true
    }
}

/* -------------------------------------------------------------------------- */
/*                            Trait: CodeGenModule                            */
/* -------------------------------------------------------------------------- */

/// `CodeGenModule` aggregates [`PropertyCodeGen`]s and optionally generates
/// whole-entity code of its own. Modules are cloned into every worker so no
/// mutable state is ever shared between tasks.
pub trait CodeGenModule: Send {
    /// `clone_boxed` duplicates the module (and its property generators) for
    /// another worker.
    fn clone_boxed(&self) -> Box<dyn CodeGenModule>;

    /// `property_code_gens_mut` exposes the registered property generators
    /// in registration order.
    fn property_code_gens_mut(&mut self) -> &mut [Box<dyn PropertyCodeGen>];

    /// `initial_generate_code` runs once before any entity is visited.
    fn initial_generate_code(&mut self, _env: &mut CodeGenEnv, _out: &mut String) -> bool {
        true
    }

    /// `generate_code_for_entity` generates whole-entity code and steers the
    /// traversal over the entity tree.
    fn generate_code_for_entity(
        &mut self,
        entity: &EntityInfo,
        env: &mut CodeGenEnv,
        out: &mut String,
    ) -> TraversalBehaviour;

    /// `final_generate_code` runs once after the last entity was visited.
    fn final_generate_code(&mut self, _env: &mut CodeGenEnv, _out: &mut String) -> bool {
        true
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefer_orders_behaviours_by_permissiveness() {
        // Given: Every pairing of traversal behaviours.
        // When: Combining them.
        // Then: Recurse beats Continue beats Break.
        use TraversalBehaviour::*;

        assert_eq!(Recurse.prefer(Break), Recurse);
        assert_eq!(Break.prefer(Recurse), Recurse);
        assert_eq!(Continue.prefer(Break), Continue);
        assert_eq!(Break.prefer(Break), Break);
        assert_eq!(Continue.prefer(Continue), Continue);
    }
}
