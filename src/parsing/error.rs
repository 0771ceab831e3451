use thiserror::Error;

use crate::ast::SourceLocation;
use crate::property::PropertyParseFailure;

/* -------------------------------------------------------------------------- */
/*                           Enum: ParsingErrorKind                           */
/* -------------------------------------------------------------------------- */

/// `ParsingErrorKind` classifies failures accumulated while parsing one
/// input file.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParsingErrorKind {
    #[error("input file does not exist or is a directory")]
    NonexistentFile,

    #[error("failed to initialize translation unit: {0}")]
    TranslationUnitInitFailed(String),

    #[error(transparent)]
    Property(PropertyParseFailure),
}

impl ParsingErrorKind {
    /// `is_unknown_property` matches the strict-mode unknown-name failure.
    pub fn is_unknown_property(&self) -> bool {
        matches!(
            self,
            ParsingErrorKind::Property(PropertyParseFailure::Unknown(..))
        )
    }

    /// `is_malformed_property` matches a payload-syntax failure.
    pub fn is_malformed_property(&self) -> bool {
        matches!(
            self,
            ParsingErrorKind::Property(PropertyParseFailure::Malformed(..))
        )
    }
}

/* -------------------------------------------------------------------------- */
/*                            Struct: ParsingError                            */
/* -------------------------------------------------------------------------- */

/// `ParsingError` is one failure with the source position it was detected
/// at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsingError {
    pub kind: ParsingErrorKind,
    pub location: SourceLocation,
}

impl ParsingError {
    pub fn new(kind: ParsingErrorKind, location: SourceLocation) -> Self {
        ParsingError { kind, location }
    }
}

impl std::fmt::Display for ParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}
