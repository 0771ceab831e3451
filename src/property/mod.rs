mod parser;
mod rule;

/* ------------------------------- Mod: Parser ------------------------------ */

pub use parser::PropertyParseFailure;
pub use parser::parse_annotation_payload;
pub use parser::validate_entity;
pub use parser::validate_group;

/* -------------------------------- Mod: Rule ------------------------------- */

pub use rule::DefaultPropertyRule;
pub use rule::ParseAllNestedRule;
pub use rule::PropertyRule;
pub use rule::RuleRegistry;
