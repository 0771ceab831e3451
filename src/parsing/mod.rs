mod class_parser;
mod enum_parser;
mod error;
mod file_parser;
mod result;
mod settings;

/* ------------------------------- Mod: Error ------------------------------- */

pub use error::ParsingError;
pub use error::ParsingErrorKind;

/* ----------------------------- Mod: FileParser ---------------------------- */

pub use file_parser::FileParser;

/* ------------------------------- Mod: Result ------------------------------ */

pub use result::FileParsingResult;

/* ------------------------------ Mod: Settings ----------------------------- */

pub use settings::CompilerIdentity;
pub use settings::MacroNames;
pub use settings::ParsingSettings;
pub use settings::ParsingSettingsBuilder;
pub use settings::PropertySyntax;
