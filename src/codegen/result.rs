use itertools::Itertools;
use std::path::PathBuf;
use thiserror::Error;

use crate::parsing::ParsingError;

/* -------------------------------------------------------------------------- */
/*                             Enum: CodeGenError                             */
/* -------------------------------------------------------------------------- */

/// `CodeGenError` covers the failures a generation run can surface in its
/// result.
#[derive(Clone, Debug, Error)]
pub enum CodeGenError {
    #[error("invalid generation setup: {0}")]
    SetupInvalid(String),

    #[error("parsing {file:?} failed: {error}")]
    Parsing { error: ParsingError, file: PathBuf },

    #[error("failed to write generated file {0:?}: {1}")]
    OutputWriteFailed(PathBuf, String),
}

/* -------------------------------------------------------------------------- */
/*                            Struct: CodeGenResult                           */
/* -------------------------------------------------------------------------- */

/// `CodeGenResult` is the outcome of a generation task or a whole run:
/// whether every stage completed, which files were parsed, the errors
/// encountered, and the wall-clock duration.
#[derive(Clone, Debug, Default)]
pub struct CodeGenResult {
    pub completed: bool,
    pub duration_secs: f32,
    pub errors: Vec<CodeGenError>,
    pub parsed_files: Vec<PathBuf>,
}

impl CodeGenResult {
    /// `merge` folds another result into this one: completion is the AND of
    /// both, parsed files union (order-preserving), errors concatenate.
    /// Merging is associative, and commutative over the parsed-file set.
    pub fn merge(&mut self, other: CodeGenResult) {
        self.completed &= other.completed;
        self.parsed_files = std::mem::take(&mut self.parsed_files)
            .into_iter()
            .chain(other.parsed_files)
            .unique()
            .collect();
        self.errors.extend(other.errors);
    }

    /// `record_parsed_file` adds a file to the parsed set without
    /// duplicating it.
    pub fn record_parsed_file(&mut self, file: PathBuf) {
        if !self.parsed_files.contains(&file) {
            self.parsed_files.push(file);
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn result(completed: bool, files: &[&str]) -> CodeGenResult {
        CodeGenResult {
            completed,
            duration_secs: 0.0,
            errors: Vec::new(),
            parsed_files: files.iter().map(PathBuf::from).collect(),
        }
    }

    fn file_set(result: &CodeGenResult) -> BTreeSet<PathBuf> {
        result.parsed_files.iter().cloned().collect()
    }

    #[test]
    fn test_merge_unions_files_and_ands_completion() {
        // Given: Two results with overlapping file sets.
        let mut left = result(true, &["a.h", "b.h"]);
        let right = result(false, &["b.h", "c.h"]);

        // When: Merging.
        left.merge(right);

        // Then: Files union without duplicates, completion is the AND.
        assert!(!left.completed);
        assert_eq!(
            left.parsed_files,
            vec![PathBuf::from("a.h"), PathBuf::from("b.h"), PathBuf::from("c.h")]
        );
    }

    #[test]
    fn test_merge_is_associative_and_commutative_on_file_sets() {
        // Given: Three results.
        let a = result(true, &["a.h"]);
        let b = result(true, &["b.h", "a.h"]);
        let c = result(true, &["c.h"]);

        // When: Merging in both associations and both orders.
        let mut left = a.clone();
        left.merge(b.clone());
        left.merge(c.clone());

        let mut right = b;
        right.merge(c);
        let mut outer = a;
        outer.merge(right);

        // Then: The underlying file sets agree.
        assert_eq!(file_set(&left), file_set(&outer));
    }
}
