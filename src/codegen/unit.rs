use std::path::Path;
use std::sync::Arc;

use crate::entity::EntityId;
use crate::entity::EntityInfo;
use crate::log::LogSeverity;
use crate::log::SharedLogger;
use crate::parsing::FileParsingResult;

use super::CodeGenEnv;
use super::CodeGenModule;
use super::TraversalBehaviour;

/* -------------------------------------------------------------------------- */
/*                             Trait: CodeGenUnit                             */
/* -------------------------------------------------------------------------- */

/// `CodeGenUnit` orchestrates modules over parsed entity trees and owns the
/// artifact-emission policy. The manager clones one unit per worker task and
/// drives the fixed stage order `pre_generate_code` → `generate_code` (once
/// per parsing result) → `post_generate_code`; a stage returning `false`
/// stops the pass and no artifact is written.
pub trait CodeGenUnit: Send {
    /// `clone_boxed` duplicates the unit (and its modules) for another
    /// worker.
    fn clone_boxed(&self) -> Box<dyn CodeGenUnit>;

    /// `output_directory` is where this unit emits its artifacts.
    fn output_directory(&self) -> &Path;

    /// `iteration_count` is how many times the whole parse → generate
    /// pipeline repeats; iteration N sees the artifacts iteration N-1 wrote.
    /// Always at least 1; the manager rejects units advertising 0.
    fn iteration_count(&self) -> u8 {
        1
    }

    /// `is_up_to_date` reports whether the artifacts for `input` are already
    /// current, letting the manager skip the file.
    fn is_up_to_date(&self, input: &Path) -> bool;

    /// `create_env` builds the environment one generation pass runs over.
    fn create_env(&self, logger: SharedLogger) -> CodeGenEnv;

    /// `pre_generate_code` prepares unit state (buffers, seeded section
    /// prefixes) before any entity is generated for.
    fn pre_generate_code(&mut self, env: &mut CodeGenEnv) -> bool;

    /// `generate_code` runs the module/property fan-out over one parsing
    /// result's entity tree.
    fn generate_code(&mut self, result: Arc<FileParsingResult>, env: &mut CodeGenEnv) -> bool;

    /// `post_generate_code` assembles and writes the artifact files; either
    /// the full artifact lands or nothing does.
    fn post_generate_code(&mut self, env: &mut CodeGenEnv) -> bool;
}

/* -------------------------------------------------------------------------- */
/*                            Fn: TraverseEntities                            */
/* -------------------------------------------------------------------------- */

/// `traverse_entities` drives a deterministic depth-first walk over a
/// parsing result's reflected entities. The visitor's returned behaviour
/// steers the walk: `Recurse` descends, `Continue` skips children, `Break`
/// abandons the remaining siblings at the current depth.
pub(super) fn traverse_entities(
    result: &FileParsingResult,
    visit: &mut impl FnMut(&EntityInfo) -> Option<TraversalBehaviour>,
) -> bool {
    walk_level(result, result.roots(), visit)
}

fn walk_level(
    result: &FileParsingResult,
    ids: &[EntityId],
    visit: &mut impl FnMut(&EntityInfo) -> Option<TraversalBehaviour>,
) -> bool {
    for &id in ids {
        let entity = result.entity(id);

        match visit(entity) {
            // A generator failed; unwind the whole traversal.
            None => return false,
            Some(TraversalBehaviour::Recurse) => {
                if !walk_level(result, entity.children(), visit) {
                    return false;
                }
            }
            Some(TraversalBehaviour::Continue) => {}
            Some(TraversalBehaviour::Break) => return true,
        }
    }

    true
}

/* -------------------------------------------------------------------------- */
/*                        Fn: GenerateEntityWithModule                        */
/* -------------------------------------------------------------------------- */

/// `generate_entity_with_module` runs one module's whole-entity hook and
/// fans out to its property generators: each generator fires once per
/// occurrence of its property in the entity's groups, in textual order.
/// Returns `None` when a generator failed or rejected the entity.
pub(super) fn generate_entity_with_module(
    module: &mut Box<dyn CodeGenModule>,
    entity: &EntityInfo,
    env: &mut CodeGenEnv,
    out: &mut String,
) -> Option<TraversalBehaviour> {
    let behaviour = module.generate_code_for_entity(entity, env, out);

    for generator in module.property_code_gens_mut() {
        if !generator.accepted_kinds().contains(entity.kind) {
            continue;
        }

        for group in &entity.properties {
            for (index, property) in group.properties.iter().enumerate() {
                if property.name != generator.property_name() {
                    continue;
                }

                let index = index as u8;

                if !generator.pre_generate_code_for_entity(entity, property, index, env) {
                    env.logger().log(
                        LogSeverity::Error,
                        &format!(
                            "property '{}' rejected entity {}",
                            property.name, entity.full_name
                        ),
                    );
                    return None;
                }

                if !generator.generate_code_for_entity(entity, property, index, env, out) {
                    env.logger().log(
                        LogSeverity::Error,
                        &format!(
                            "generation failed for property '{}' on entity {}",
                            property.name, entity.full_name
                        ),
                    );
                    return None;
                }
            }
        }
    }

    Some(behaviour)
}

/* -------------------------------------------------------------------------- */
/*                          Fn: Initial/FinalGenerate                         */
/* -------------------------------------------------------------------------- */

/// `initial_generate_with_module` runs a module's initial hook and its
/// property generators' initial hooks.
pub(super) fn initial_generate_with_module(
    module: &mut Box<dyn CodeGenModule>,
    env: &mut CodeGenEnv,
    out: &mut String,
) -> bool {
    if !module.initial_generate_code(env, out) {
        return false;
    }

    module
        .property_code_gens_mut()
        .iter_mut()
        .all(|generator| generator.initial_generate_code(env, out))
}

/// `final_generate_with_module` runs a module's final hook and its property
/// generators' final hooks.
pub(super) fn final_generate_with_module(
    module: &mut Box<dyn CodeGenModule>,
    env: &mut CodeGenEnv,
    out: &mut String,
) -> bool {
    if !module.final_generate_code(env, out) {
        return false;
    }

    module
        .property_code_gens_mut()
        .iter_mut()
        .all(|generator| generator.final_generate_code(env, out))
}
