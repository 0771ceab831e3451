mod header_source;
mod lexer;

use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

use crate::entity::AccessSpecifier;

/* --------------------------- Mod: HeaderSource ---------------------------- */

pub use header_source::HeaderAstSource;

/* ------------------------------- Mod: Lexer ------------------------------- */

pub use lexer::HeaderToken;
pub use lexer::lex_header;

/* -------------------------------------------------------------------------- */
/*                               Enum: AstError                               */
/* -------------------------------------------------------------------------- */

/// `AstError` covers failures raised by an [`AstSource`] while producing a
/// translation unit.
#[derive(Debug, Error)]
pub enum AstError {
    #[error("failed to read input file {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to initialize translation unit for {0:?}: {1}")]
    TranslationUnitInit(PathBuf, String),
}

/* -------------------------------------------------------------------------- */
/*                           Struct: SourceLocation                           */
/* -------------------------------------------------------------------------- */

/// `SourceLocation` pins a cursor or diagnostic to a position in an input
/// file. `offset` is the byte offset, kept so error reports can render source
/// context.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SourceLocation {
    pub column: usize,
    pub file: PathBuf,
    pub line: usize,
    pub offset: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/* -------------------------------------------------------------------------- */
/*                               Struct: Index                                */
/* -------------------------------------------------------------------------- */

/// `Index` is the scoped handle an [`AstSource`] parses translation units
/// under. Dropping it releases whatever the source allocated for it, on every
/// exit path.
pub struct Index {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Index {
    /// `new` creates an index with no backing resources.
    pub fn new() -> Self {
        Index { release: None }
    }

    /// `with_release` creates an index whose `release` hook runs exactly once
    /// when the index is dropped.
    pub fn with_release(release: impl FnOnce() + Send + 'static) -> Self {
        Index {
            release: Some(Box::new(release)),
        }
    }
}

impl Default for Index {
    fn default() -> Self {
        Index::new()
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                              Enum: CursorKind                              */
/* -------------------------------------------------------------------------- */

/// `CursorKind` is the declaration family of one cursor in a translation
/// unit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CursorKind {
    AccessSpecifier,
    AnnotateAttr,
    BaseSpecifier,
    ClassDecl,
    EnumConstantDecl,
    EnumDecl,
    FieldDecl,
    FinalAttr,
    FunctionDecl,
    Method,
    Namespace,
    ParamDecl,
    StructDecl,
    /// A static member variable; distinct from `FieldDecl` the way indexers
    /// report storage.
    VarDecl,
}

/* -------------------------------------------------------------------------- */
/*                              Struct: CursorId                              */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CursorId(pub(crate) usize);

/* -------------------------------------------------------------------------- */
/*                               Struct: Cursor                               */
/* -------------------------------------------------------------------------- */

/// `Cursor` is one node of the cursor tree surfaced by an [`AstSource`].
#[derive(Clone, Debug)]
pub struct Cursor {
    pub access: Option<AccessSpecifier>,
    /// Annotation payload, set only on `AnnotateAttr` cursors; bit-exact
    /// `"<TAG>:<args>"` form.
    pub annotation: Option<String>,
    pub children: Vec<CursorId>,
    pub display_name: String,
    pub is_const: bool,
    pub is_from_main_file: bool,
    pub is_mutable: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub kind: CursorKind,
    pub location: SourceLocation,
    pub spelling: String,
    /// Canonical type text: the declared type for fields and parameters, the
    /// return type for methods and functions, the underlying type for enums.
    pub type_name: Option<String>,
}

impl Cursor {
    pub(crate) fn new(
        kind: CursorKind,
        spelling: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        let spelling = spelling.into();

        Cursor {
            access: None,
            annotation: None,
            children: Vec::new(),
            display_name: spelling.clone(),
            is_const: false,
            is_from_main_file: true,
            is_mutable: false,
            is_static: false,
            is_virtual: false,
            kind,
            location,
            spelling,
            type_name: None,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                          Struct: TranslationUnit                           */
/* -------------------------------------------------------------------------- */

/// `TranslationUnit` owns the cursor arena produced by parsing one input
/// file.
#[derive(Clone, Debug, Default)]
pub struct TranslationUnit {
    cursors: Vec<Cursor>,
    roots: Vec<CursorId>,
}

impl TranslationUnit {
    pub fn cursor(&self, id: CursorId) -> &Cursor {
        &self.cursors[id.0]
    }

    pub fn roots(&self) -> &[CursorId] {
        &self.roots
    }

    /// `annotation_of` returns the `(tag, payload)` split of the first
    /// `AnnotateAttr` child of `id`, if any.
    pub fn annotation_of(&self, id: CursorId) -> Option<(&str, &str)> {
        let first = *self.cursor(id).children.first()?;
        let cursor = self.cursor(first);

        if cursor.kind != CursorKind::AnnotateAttr {
            return None;
        }

        cursor.annotation.as_deref()?.split_once(':')
    }

    pub(crate) fn push(&mut self, cursor: Cursor) -> CursorId {
        self.cursors.push(cursor);
        CursorId(self.cursors.len() - 1)
    }

    pub(crate) fn push_root(&mut self, id: CursorId) {
        self.roots.push(id);
    }

    pub(crate) fn attach(&mut self, parent: CursorId, child: CursorId) {
        self.cursors[parent.0].children.push(child);
    }

    pub(crate) fn cursor_mut(&mut self, id: CursorId) -> &mut Cursor {
        &mut self.cursors[id.0]
    }
}

/* -------------------------------------------------------------------------- */
/*                             Enum: VisitControl                             */
/* -------------------------------------------------------------------------- */

/// `VisitControl` steers [`visit`]: keep going over siblings, descend into
/// children, or abort the whole walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisitControl {
    Continue,
    Recurse,
    Break,
}

/* -------------------------------------------------------------------------- */
/*                                 Fn: Visit                                  */
/* -------------------------------------------------------------------------- */

/// `visit` walks the children of `id` (or the roots when `id` is `None`),
/// invoking `callback` on each cursor. Returns `false` when the callback
/// aborted the walk with [`VisitControl::Break`].
pub fn visit(
    tu: &TranslationUnit,
    id: Option<CursorId>,
    callback: &mut impl FnMut(&TranslationUnit, CursorId) -> VisitControl,
) -> bool {
    let children: Vec<CursorId> = match id {
        Some(id) => tu.cursor(id).children.clone(),
        None => tu.roots().to_vec(),
    };

    for child in children {
        match callback(tu, child) {
            VisitControl::Continue => {}
            VisitControl::Recurse => {
                if !visit(tu, Some(child), callback) {
                    return false;
                }
            }
            VisitControl::Break => return false,
        }
    }

    true
}

/* -------------------------------------------------------------------------- */
/*                              Trait: AstSource                              */
/* -------------------------------------------------------------------------- */

/// `AstSource` abstracts the C/C++ indexer the file parser drives. The
/// built-in implementation is [`HeaderAstSource`]; an implementation backed
/// by a full indexer plugs in behind the same two operations.
pub trait AstSource: Send + Sync {
    /// `create_index` allocates the scoped handle translation units are
    /// parsed under.
    fn create_index(&self) -> Index;

    /// `parse_file` parses `path` into a cursor tree. `compiler_args` carry
    /// the `-D` annotation-macro rewrites produced by
    /// [`crate::parsing::ParsingSettings::make_annotation_arguments`].
    fn parse_file(
        &self,
        index: &Index,
        path: &Path,
        compiler_args: &[String],
    ) -> Result<TranslationUnit, AstError>;
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TranslationUnit {
        // namespace { class { field, field }, enum }
        let mut tu = TranslationUnit::default();

        let ns = tu.push(Cursor::new(CursorKind::Namespace, "ns", Default::default()));
        tu.push_root(ns);

        let class = tu.push(Cursor::new(CursorKind::ClassDecl, "C", Default::default()));
        tu.attach(ns, class);
        let field_a = tu.push(Cursor::new(CursorKind::FieldDecl, "a", Default::default()));
        tu.attach(class, field_a);
        let field_b = tu.push(Cursor::new(CursorKind::FieldDecl, "b", Default::default()));
        tu.attach(class, field_b);

        let decl = tu.push(Cursor::new(CursorKind::EnumDecl, "E", Default::default()));
        tu.attach(ns, decl);

        tu
    }

    #[test]
    fn test_visit_recurse_reaches_nested_cursors() {
        // Given: A nested cursor tree.
        let tu = sample_tree();

        // When: Visiting with Recurse everywhere.
        let mut seen = Vec::new();
        let finished = visit(&tu, None, &mut |tu, id| {
            seen.push(tu.cursor(id).spelling.clone());
            VisitControl::Recurse
        });

        // Then: Every cursor is visited depth-first in declaration order.
        assert!(finished);
        assert_eq!(seen, vec!["ns", "C", "a", "b", "E"]);
    }

    #[test]
    fn test_visit_continue_skips_children() {
        // Given: A nested cursor tree.
        let tu = sample_tree();

        // When: Visiting with Continue on the class.
        let mut seen = Vec::new();
        visit(&tu, None, &mut |tu, id| {
            seen.push(tu.cursor(id).spelling.clone());
            if tu.cursor(id).kind == CursorKind::ClassDecl {
                VisitControl::Continue
            } else {
                VisitControl::Recurse
            }
        });

        // Then: The class's fields are skipped, its siblings are not.
        assert_eq!(seen, vec!["ns", "C", "E"]);
    }

    #[test]
    fn test_visit_break_aborts_the_walk() {
        // Given: A nested cursor tree.
        let tu = sample_tree();

        // When: Breaking on the first field.
        let mut seen = Vec::new();
        let finished = visit(&tu, None, &mut |tu, id| {
            seen.push(tu.cursor(id).spelling.clone());
            if tu.cursor(id).kind == CursorKind::FieldDecl {
                VisitControl::Break
            } else {
                VisitControl::Recurse
            }
        });

        // Then: Nothing after the break is visited.
        assert!(!finished);
        assert_eq!(seen, vec!["ns", "C", "a"]);
    }

    #[test]
    fn test_index_release_runs_on_drop() {
        // Given: An index with a release hook.
        let released = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = released.clone();
        let index = Index::with_release(move || {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        // When: Dropping the index.
        drop(index);

        // Then: The hook ran exactly once.
        assert!(released.load(std::sync::atomic::Ordering::SeqCst));
    }
}
