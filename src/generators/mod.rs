mod data;
mod get;
mod set;

use crate::codegen::CodeGenEnv;
use crate::codegen::CodeGenModule;
use crate::codegen::PropertyCodeGen;
use crate::codegen::TraversalBehaviour;
use crate::entity::EntityInfo;
use crate::entity::EntityKind;
use crate::log::LogSeverity;

/* -------------------------------- Mod: Data ------------------------------- */

pub use data::DataPropertyCodeGen;

/* --------------------------------- Mod: Get ------------------------------- */

pub use get::GetPropertyCodeGen;

/* --------------------------------- Mod: Set ------------------------------- */

pub use set::SetPropertyCodeGen;

/* -------------------------------------------------------------------------- */
/*                        Struct: FieldAccessorModule                         */
/* -------------------------------------------------------------------------- */

/// `FieldAccessorModule` bundles the accessor generators reacting to `Get`
/// and `Set` on fields. Made for per-file units: declarations land in class
/// footers, definitions in the generated source.
pub struct FieldAccessorModule {
    property_code_gens: Vec<Box<dyn PropertyCodeGen>>,
}

impl FieldAccessorModule {
    pub fn new() -> Self {
        FieldAccessorModule {
            property_code_gens: vec![
                Box::new(GetPropertyCodeGen),
                Box::new(SetPropertyCodeGen),
            ],
        }
    }
}

impl Default for FieldAccessorModule {
    fn default() -> Self {
        FieldAccessorModule::new()
    }
}

/* --------------------------- Impl: CodeGenModule --------------------------- */

impl CodeGenModule for FieldAccessorModule {
    fn clone_boxed(&self) -> Box<dyn CodeGenModule> {
        Box::new(FieldAccessorModule {
            property_code_gens: self
                .property_code_gens
                .iter()
                .map(|g| g.clone_boxed())
                .collect(),
        })
    }

    fn property_code_gens_mut(&mut self) -> &mut [Box<dyn PropertyCodeGen>] {
        &mut self.property_code_gens
    }

    fn generate_code_for_entity(
        &mut self,
        entity: &EntityInfo,
        _env: &mut CodeGenEnv,
        _out: &mut String,
    ) -> TraversalBehaviour {
        // Fields live inside classes inside namespaces; descend through all
        // of them.
        match entity.kind {
            EntityKind::Namespace | EntityKind::Class | EntityKind::Struct => {
                TraversalBehaviour::Recurse
            }
            _ => TraversalBehaviour::Continue,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                        Struct: DataAggregateModule                         */
/* -------------------------------------------------------------------------- */

/// `DataAggregateModule` bundles the `Data` generator feeding an aggregated
/// unit. It walks namespaces for classes and structs and prunes everything
/// below them.
pub struct DataAggregateModule {
    property_code_gens: Vec<Box<dyn PropertyCodeGen>>,
}

impl DataAggregateModule {
    pub fn new() -> Self {
        DataAggregateModule {
            property_code_gens: vec![Box::new(DataPropertyCodeGen)],
        }
    }
}

impl Default for DataAggregateModule {
    fn default() -> Self {
        DataAggregateModule::new()
    }
}

/* --------------------------- Impl: CodeGenModule --------------------------- */

impl CodeGenModule for DataAggregateModule {
    fn clone_boxed(&self) -> Box<dyn CodeGenModule> {
        Box::new(DataAggregateModule {
            property_code_gens: self
                .property_code_gens
                .iter()
                .map(|g| g.clone_boxed())
                .collect(),
        })
    }

    fn property_code_gens_mut(&mut self) -> &mut [Box<dyn PropertyCodeGen>] {
        &mut self.property_code_gens
    }

    fn generate_code_for_entity(
        &mut self,
        entity: &EntityInfo,
        env: &mut CodeGenEnv,
        _out: &mut String,
    ) -> TraversalBehaviour {
        match entity.kind {
            EntityKind::Namespace => TraversalBehaviour::Recurse,
            EntityKind::Class | EntityKind::Struct => {
                env.logger().log(
                    LogSeverity::Info,
                    &format!("aggregating entity {}", entity.full_name),
                );
                // The aggregate cares about the type itself, not its members.
                TraversalBehaviour::Continue
            }
            _ => TraversalBehaviour::Break,
        }
    }
}
