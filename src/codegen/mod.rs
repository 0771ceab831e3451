mod aggregated_unit;
mod env;
mod generated_file;
mod macro_unit;
mod manager;
mod module;
mod result;
mod unit;

/* --------------------------- Mod: AggregatedUnit -------------------------- */

pub use aggregated_unit::AggregateSection;
pub use aggregated_unit::AggregatedCodeGenUnit;
pub use aggregated_unit::AggregatedEnvState;
pub use aggregated_unit::AggregatedUnitSettings;
pub use aggregated_unit::AggregatedUnitSettingsBuilder;

/* --------------------------------- Mod: Env ------------------------------- */

pub use env::CodeGenEnv;

/* ---------------------------- Mod: GeneratedFile --------------------------- */

pub use generated_file::GeneratedFile;

/* ------------------------------ Mod: MacroUnit ----------------------------- */

pub use macro_unit::MacroCodeGenUnit;
pub use macro_unit::MacroEnvState;
pub use macro_unit::MacroSection;
pub use macro_unit::MacroUnitSettings;
pub use macro_unit::MacroUnitSettingsBuilder;

/* ------------------------------- Mod: Manager ------------------------------ */

pub use manager::CodeGenManager;
pub use manager::CodeGenManagerSettings;
pub use manager::CodeGenManagerSettingsBuilder;
pub use manager::GenerationForces;

/* ------------------------------- Mod: Module ------------------------------- */

pub use module::CodeGenModule;
pub use module::PropertyCodeGen;
pub use module::TraversalBehaviour;

/* ------------------------------- Mod: Result ------------------------------- */

pub use result::CodeGenError;
pub use result::CodeGenResult;

/* -------------------------------- Mod: Unit -------------------------------- */

pub use unit::CodeGenUnit;
