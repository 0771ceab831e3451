use chumsky::span::SimpleSpan;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use crate::entity::AccessSpecifier;

use super::AstError;
use super::AstSource;
use super::Cursor;
use super::CursorId;
use super::CursorKind;
use super::HeaderToken;
use super::Index;
use super::SourceLocation;
use super::TranslationUnit;
use super::lex_header;

/* -------------------------------------------------------------------------- */
/*                          Struct: HeaderAstSource                           */
/* -------------------------------------------------------------------------- */

/// `HeaderAstSource` is the built-in indexer: a tolerant declaration scanner
/// over a C-family header subset (namespaces, classes and structs with base
/// lists and access specifiers, fields, methods, enums, free functions).
///
/// It learns the annotation-macro vocabulary from the `-D …annotate(…)`
/// rewrites in the compiler arguments and materializes recognized macro calls
/// as `AnnotateAttr` child cursors carrying the same `"<TAG>:<args>"` payload
/// a full indexer would surface. Preprocessor lines and function bodies are
/// skipped; `#include`s are not expanded, so included headers contribute no
/// cursors.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderAstSource;

impl HeaderAstSource {
    pub fn new() -> Self {
        HeaderAstSource
    }

    /// `parse_source` scans already-loaded source text. `parse_file` is a
    /// thin filesystem wrapper around this.
    pub fn parse_source(
        &self,
        path: &Path,
        src: &str,
        compiler_args: &[String],
    ) -> Result<TranslationUnit, AstError> {
        let tokens = lex_header(src).map_err(|errors| {
            let detail = errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecognized input".to_string());

            AstError::TranslationUnitInit(path.to_owned(), detail)
        })?;

        let macros = decode_macro_bindings(compiler_args);

        Ok(Scanner::new(path.to_owned(), src, tokens, macros).scan())
    }
}

/* ----------------------------- Impl: AstSource ---------------------------- */

impl AstSource for HeaderAstSource {
    fn create_index(&self) -> Index {
        Index::new()
    }

    fn parse_file(
        &self,
        _index: &Index,
        path: &Path,
        compiler_args: &[String],
    ) -> Result<TranslationUnit, AstError> {
        let src =
            std::fs::read_to_string(path).map_err(|e| AstError::Io(path.to_owned(), e))?;

        self.parse_source(path, &src, compiler_args)
    }
}

/* -------------------------------------------------------------------------- */
/*                          Fn: DecodeMacroBindings                           */
/* -------------------------------------------------------------------------- */

/// `decode_macro_bindings` extracts the macro-name → kind-tag table from
/// `-D<macro>(...)=__attribute__((annotate("<TAG>:"#__VA_ARGS__)))` compiler
/// arguments. Arguments in any other shape are ignored.
fn decode_macro_bindings(compiler_args: &[String]) -> HashMap<String, String> {
    let mut bindings = HashMap::new();

    for arg in compiler_args {
        let Some(rest) = arg.strip_prefix("-D") else {
            continue;
        };
        let Some((name, expansion)) = rest.split_once("(...)=") else {
            continue;
        };
        let Some(index) = expansion.find("annotate(\"") else {
            continue;
        };
        let after = &expansion[index + "annotate(\"".len()..];
        let Some((tag, _)) = after.split_once(':') else {
            continue;
        };

        bindings.insert(name.to_string(), tag.to_string());
    }

    bindings
}

/* -------------------------------------------------------------------------- */
/*                              Struct: Scanner                               */
/* -------------------------------------------------------------------------- */

struct Scanner<'src> {
    line_starts: Vec<usize>,
    macros: HashMap<String, String>,
    path: PathBuf,
    pos: usize,
    src: &'src str,
    tokens: Vec<(HeaderToken, SimpleSpan)>,
    tu: TranslationUnit,
}

impl<'src> Scanner<'src> {
    fn new(
        path: PathBuf,
        src: &'src str,
        tokens: Vec<(HeaderToken, SimpleSpan)>,
        macros: HashMap<String, String>,
    ) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in src.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }

        Scanner {
            line_starts,
            macros,
            path,
            pos: 0,
            src,
            tokens,
            tu: TranslationUnit::default(),
        }
    }

    fn scan(mut self) -> TranslationUnit {
        self.parse_scope_items(None);
        self.tu
    }

    /* ------------------------------ Token access ----------------------------- */

    fn peek(&self) -> Option<&HeaderToken> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_at(&self, n: usize) -> Option<&HeaderToken> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    fn bump(&mut self) -> Option<(HeaderToken, SimpleSpan)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(c))
    }

    fn at_ident(&self, spelling: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(spelling))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn eat_ident(&mut self, spelling: &str) -> bool {
        if self.at_ident(spelling) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn location(&self, span: SimpleSpan) -> SourceLocation {
        let offset = span.start;
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };

        SourceLocation {
            column: offset - self.line_starts[line] + 1,
            file: self.path.clone(),
            line: line + 1,
            offset,
        }
    }

    fn attach(&mut self, parent: Option<CursorId>, id: CursorId) {
        match parent {
            Some(parent) => self.tu.attach(parent, id),
            None => self.tu.push_root(id),
        }
    }

    /* ------------------------------ Annotations ------------------------------ */

    /// `try_annotation` consumes `<Macro>(<args>)` when the next token names a
    /// known annotation macro, producing an `AnnotateAttr` cursor with the
    /// `"<TAG>:<args>"` payload a preprocessor rewrite would have left behind.
    fn try_annotation(&mut self) -> Option<CursorId> {
        let name = match self.peek() {
            Some(HeaderToken::Ident(name)) if self.macros.contains_key(name) => name.clone(),
            _ => return None,
        };

        if !self.peek_at(1).is_some_and(|t| t.is_punct('(')) {
            return None;
        }

        let (_, name_span) = self.bump().expect("peeked identifier");
        let (_, open_span) = self.bump().expect("peeked open paren");

        let mut depth = 1usize;
        let mut close_span = open_span;
        while let Some((token, span)) = self.bump() {
            if token.is_punct('(') {
                depth += 1;
            } else if token.is_punct(')') {
                depth -= 1;
                if depth == 0 {
                    close_span = span;
                    break;
                }
            }
        }

        let payload = self.src[open_span.end..close_span.start].trim();
        let tag = self.macros[&name].clone();

        let mut cursor = Cursor::new(
            CursorKind::AnnotateAttr,
            format!("{tag}:{payload}"),
            self.location(name_span),
        );
        cursor.annotation = Some(format!("{tag}:{payload}"));

        Some(self.tu.push(cursor))
    }

    /* ------------------------------ Scope items ------------------------------ */

    /// `parse_scope_items` scans declarations at namespace or file scope until
    /// the closing brace of the enclosing scope (or end of input).
    fn parse_scope_items(&mut self, parent: Option<CursorId>) {
        let mut pending: Option<CursorId> = None;

        while let Some(token) = self.peek() {
            if token.is_punct('}') && parent.is_some() {
                return;
            }

            if self.at_ident("namespace") {
                self.pos += 1;
                self.parse_namespace(parent, pending.take());
            } else if self.at_ident("class") || self.at_ident("struct") {
                let is_struct = self.at_ident("struct");
                self.pos += 1;
                self.parse_class(parent, pending.take(), is_struct);
            } else if self.at_ident("enum") {
                self.pos += 1;
                self.parse_enum(parent, pending.take());
            } else if let Some(annotation) = self.try_annotation() {
                pending = Some(annotation);
            } else if pending.is_some() {
                // An annotated free declaration (function or variable).
                self.parse_member(parent, pending.take(), true);
            } else if self.at_punct('{') {
                self.skip_balanced('{', '}');
            } else {
                self.pos += 1;
            }
        }
    }

    fn parse_namespace(&mut self, parent: Option<CursorId>, pending: Option<CursorId>) {
        let Some(HeaderToken::Ident(name)) = self.peek().cloned() else {
            return;
        };
        let (_, name_span) = self.bump().expect("peeked identifier");

        let annotation = pending.or_else(|| self.try_annotation());

        let cursor = Cursor::new(CursorKind::Namespace, name, self.location(name_span));
        let id = self.tu.push(cursor);
        if let Some(annotation) = annotation {
            self.tu.attach(id, annotation);
        }
        self.attach(parent, id);

        if self.eat_punct('{') {
            self.parse_scope_items(Some(id));
            self.eat_punct('}');
        }
    }

    /* --------------------------- Classes and structs -------------------------- */

    fn parse_class(&mut self, parent: Option<CursorId>, pending: Option<CursorId>, is_struct: bool) {
        let annotation = pending.or_else(|| self.try_annotation());

        let Some(HeaderToken::Ident(name)) = self.peek().cloned() else {
            // Anonymous aggregate; nothing to reflect.
            self.skip_declaration();
            return;
        };
        let (_, name_span) = self.bump().expect("peeked identifier");

        let kind = if is_struct {
            CursorKind::StructDecl
        } else {
            CursorKind::ClassDecl
        };
        let location = self.location(name_span);
        let id = self.tu.push(Cursor::new(kind, name, location.clone()));
        if let Some(annotation) = annotation {
            self.tu.attach(id, annotation);
        }
        self.attach(parent, id);

        if self.eat_ident("final") {
            let attr = self.tu.push(Cursor::new(CursorKind::FinalAttr, "final", location));
            self.tu.attach(id, attr);
        }

        if self.eat_punct(':') {
            self.parse_bases(id, is_struct);
        }

        if self.eat_punct('{') {
            self.parse_class_body(id);
            self.eat_punct('}');
        }

        self.eat_punct(';');
    }

    fn parse_bases(&mut self, class: CursorId, is_struct: bool) {
        while !self.at_punct('{') && !self.at_punct(';') && self.peek().is_some() {
            let mut access = if is_struct {
                AccessSpecifier::Public
            } else {
                AccessSpecifier::Private
            };

            loop {
                if self.eat_ident("public") {
                    access = AccessSpecifier::Public;
                } else if self.eat_ident("protected") {
                    access = AccessSpecifier::Protected;
                } else if self.eat_ident("private") {
                    access = AccessSpecifier::Private;
                } else if self.eat_ident("virtual") {
                    continue;
                } else {
                    break;
                }
            }

            let (name, span) = self.parse_qualified_name();
            if name.is_empty() {
                // Unparseable base entry; resynchronize on the next one.
                while !self.at_punct(',') && !self.at_punct('{') && self.peek().is_some() {
                    self.pos += 1;
                }
            } else {
                let mut cursor =
                    Cursor::new(CursorKind::BaseSpecifier, name, self.location(span));
                cursor.access = Some(access);
                let base = self.tu.push(cursor);
                self.tu.attach(class, base);
            }

            if !self.eat_punct(',') {
                break;
            }
        }
    }

    /// `parse_qualified_name` reads `A::B::C<...>`-shaped names, returning
    /// the joined text and the span of the first token.
    fn parse_qualified_name(&mut self) -> (String, SimpleSpan) {
        let start = self
            .tokens
            .get(self.pos)
            .map(|(_, span)| *span)
            .unwrap_or(SimpleSpan::from(0..0));

        let mut pieces = Vec::new();
        loop {
            match self.peek() {
                Some(HeaderToken::Ident(name)) => {
                    pieces.push(HeaderToken::Ident(name.clone()));
                    self.pos += 1;
                }
                _ => break,
            }

            if self.at_punct('<') {
                let open = self.tokens[self.pos].clone();
                pieces.push(open.0);
                self.pos += 1;
                let mut depth = 1usize;
                while depth > 0 {
                    match self.bump() {
                        Some((token, _)) => {
                            if token.is_punct('<') {
                                depth += 1;
                            } else if token.is_punct('>') {
                                depth -= 1;
                            }
                            pieces.push(token);
                        }
                        None => break,
                    }
                }
            }

            if matches!(self.peek(), Some(HeaderToken::ColonColon)) {
                pieces.push(HeaderToken::ColonColon);
                self.pos += 1;
            } else {
                break;
            }
        }

        (join_type_tokens(&pieces), start)
    }

    fn parse_class_body(&mut self, class: CursorId) {
        let mut pending: Option<CursorId> = None;

        while let Some(token) = self.peek() {
            if token.is_punct('}') {
                return;
            }

            let is_access = (self.at_ident("public")
                || self.at_ident("protected")
                || self.at_ident("private"))
                && self.peek_at(1).is_some_and(|t| t.is_punct(':'))
                && !matches!(self.peek_at(1), Some(HeaderToken::ColonColon));

            if is_access {
                let Some((HeaderToken::Ident(name), span)) = self.bump() else {
                    continue;
                };
                self.pos += 1; // ':'

                let access = match name.as_str() {
                    "public" => AccessSpecifier::Public,
                    "protected" => AccessSpecifier::Protected,
                    _ => AccessSpecifier::Private,
                };

                let mut cursor =
                    Cursor::new(CursorKind::AccessSpecifier, name, self.location(span));
                cursor.access = Some(access);
                let id = self.tu.push(cursor);
                self.tu.attach(class, id);
            } else if self.at_ident("class") || self.at_ident("struct") {
                let is_struct = self.at_ident("struct");
                self.pos += 1;
                self.parse_class(Some(class), pending.take(), is_struct);
            } else if self.at_ident("enum") {
                self.pos += 1;
                self.parse_enum(Some(class), pending.take());
            } else if self.at_ident("using") || self.at_ident("typedef") || self.at_ident("friend")
            {
                self.skip_declaration();
            } else if let Some(annotation) = self.try_annotation() {
                pending = Some(annotation);
            } else {
                self.parse_member(Some(class), pending.take(), false);
            }
        }
    }

    /* ----------------------------- Member parsing ----------------------------- */

    /// `parse_member` scans one field, method, or free-function declaration.
    /// Constructors, operators, and anything it cannot shape into a
    /// declaration are consumed without producing a cursor.
    fn parse_member(&mut self, parent: Option<CursorId>, pending: Option<CursorId>, top_level: bool) {
        let mut is_static = false;
        let mut is_mutable = false;
        let mut is_virtual = false;

        loop {
            if self.eat_ident("static") {
                is_static = true;
            } else if self.eat_ident("mutable") {
                is_mutable = true;
            } else if self.eat_ident("virtual") {
                is_virtual = true;
            } else if self.at_ident("inline") || self.at_ident("constexpr") || self.at_ident("explicit")
            {
                self.pos += 1;
            } else {
                break;
            }
        }

        // Declarator tokens up to the initializer, parameter list, or end of
        // the declaration. Template argument lists are kept intact.
        let mut tokens: Vec<(HeaderToken, SimpleSpan)> = Vec::new();
        let mut angle_depth = 0usize;

        let terminator = loop {
            let Some(token) = self.peek().cloned() else {
                return;
            };

            match &token {
                HeaderToken::Punct('<') => angle_depth += 1,
                HeaderToken::Punct('>') if angle_depth > 0 => angle_depth -= 1,
                HeaderToken::Punct('(') if angle_depth == 0 => break '(',
                HeaderToken::Punct('=') if angle_depth == 0 => break '=',
                HeaderToken::Punct(';') if angle_depth == 0 => break ';',
                HeaderToken::Punct('{') if angle_depth == 0 => break '{',
                HeaderToken::Punct('}') if angle_depth == 0 => return,
                _ => {}
            }

            let (_, span) = self.bump().expect("peeked token");
            tokens.push((token, span));
        };

        // Split the trailing identifier off as the declared name.
        let name_index = tokens
            .iter()
            .rposition(|(token, _)| matches!(token, HeaderToken::Ident(_)));

        match terminator {
            '(' => {
                let Some(name_index) = name_index else {
                    self.skip_declaration();
                    return;
                };
                let (name_token, name_span) = tokens.remove(name_index);
                let HeaderToken::Ident(name) = name_token else {
                    unreachable!("rposition matched an identifier");
                };
                let return_type = join_type_tokens(
                    &tokens.iter().map(|(t, _)| t.clone()).collect::<Vec<_>>(),
                );

                if return_type.is_empty() {
                    // Constructor or conversion; not a reflected declaration.
                    self.skip_declaration();
                    return;
                }

                let kind = if top_level {
                    CursorKind::FunctionDecl
                } else {
                    CursorKind::Method
                };
                let mut cursor = Cursor::new(kind, name.clone(), self.location(name_span));
                cursor.display_name = format!("{name}()");
                cursor.type_name = Some(return_type);
                cursor.is_static = is_static;
                cursor.is_virtual = is_virtual;

                let id = self.tu.push(cursor);
                if let Some(annotation) = pending {
                    self.tu.attach(id, annotation);
                }

                self.pos += 1; // '('
                self.parse_parameters(id);

                // Trailing qualifiers, pure/default/delete markers, and body.
                loop {
                    if self.eat_ident("const") {
                        self.tu.cursor_mut(id).is_const = true;
                    } else if self.at_ident("override")
                        || self.at_ident("final")
                        || self.at_ident("noexcept")
                    {
                        self.pos += 1;
                    } else if self.at_punct('=') {
                        self.skip_declaration();
                        break;
                    } else if self.at_punct('{') {
                        self.skip_balanced('{', '}');
                        break;
                    } else if self.eat_punct(';') {
                        break;
                    } else if self.peek().is_none() || self.at_punct('}') {
                        break;
                    } else {
                        self.pos += 1;
                    }
                }

                self.attach(parent, id);
            }
            '=' | ';' => {
                let Some(name_index) = name_index else {
                    self.skip_declaration();
                    return;
                };
                let (name_token, name_span) = tokens.remove(name_index);
                let HeaderToken::Ident(name) = name_token else {
                    unreachable!("rposition matched an identifier");
                };
                let type_name = join_type_tokens(
                    &tokens.iter().map(|(t, _)| t.clone()).collect::<Vec<_>>(),
                );

                if type_name.is_empty() {
                    // A stray identifier (e.g. a generated-code splice macro).
                    self.skip_declaration();
                    return;
                }

                let kind = if is_static || top_level {
                    CursorKind::VarDecl
                } else {
                    CursorKind::FieldDecl
                };
                let mut cursor = Cursor::new(kind, name, self.location(name_span));
                cursor.type_name = Some(type_name);
                cursor.is_static = is_static;
                cursor.is_mutable = is_mutable;

                let id = self.tu.push(cursor);
                if let Some(annotation) = pending {
                    self.tu.attach(id, annotation);
                }
                self.attach(parent, id);

                self.skip_declaration();
            }
            _ => {
                // '{' without a recognizable declarator.
                self.skip_balanced('{', '}');
            }
        }
    }

    fn parse_parameters(&mut self, owner: CursorId) {
        let mut tokens: Vec<HeaderToken> = Vec::new();
        let mut spans: Vec<SimpleSpan> = Vec::new();
        let mut depth = 1usize;
        let mut angle_depth = 0usize;

        let flush =
            |scanner: &mut Scanner<'src>, tokens: &mut Vec<HeaderToken>, spans: &mut Vec<SimpleSpan>| {
                if tokens.is_empty() {
                    return;
                }

                let name_index = tokens
                    .iter()
                    .rposition(|token| matches!(token, HeaderToken::Ident(_)));

                let (name, type_tokens) = match name_index {
                    Some(index) if tokens.len() > 1 => {
                        let HeaderToken::Ident(name) = tokens[index].clone() else {
                            unreachable!("rposition matched an identifier");
                        };
                        let mut type_tokens = tokens.clone();
                        type_tokens.remove(index);
                        (name, type_tokens)
                    }
                    // Unnamed parameter; the whole declarator is the type.
                    _ => (String::new(), tokens.clone()),
                };

                let location = scanner.location(spans[0]);
                let mut cursor = Cursor::new(CursorKind::ParamDecl, name, location);
                cursor.type_name = Some(join_type_tokens(&type_tokens));

                let id = scanner.tu.push(cursor);
                scanner.tu.attach(owner, id);

                tokens.clear();
                spans.clear();
            };

        loop {
            let Some((token, span)) = self.bump() else {
                return;
            };

            match &token {
                HeaderToken::Punct('(') => depth += 1,
                HeaderToken::Punct(')') => {
                    depth -= 1;
                    if depth == 0 {
                        flush(self, &mut tokens, &mut spans);
                        return;
                    }
                }
                HeaderToken::Punct('<') => angle_depth += 1,
                HeaderToken::Punct('>') if angle_depth > 0 => angle_depth -= 1,
                HeaderToken::Punct(',') if depth == 1 && angle_depth == 0 => {
                    flush(self, &mut tokens, &mut spans);
                    continue;
                }
                _ => {}
            }

            tokens.push(token);
            spans.push(span);
        }
    }

    /* ------------------------------ Enumerations ------------------------------ */

    fn parse_enum(&mut self, parent: Option<CursorId>, pending: Option<CursorId>) {
        if self.at_ident("class") || self.at_ident("struct") {
            self.pos += 1;
        }

        let mut annotation = pending.or_else(|| self.try_annotation());

        let Some(HeaderToken::Ident(name)) = self.peek().cloned() else {
            self.skip_declaration();
            return;
        };
        let (_, name_span) = self.bump().expect("peeked identifier");

        annotation = annotation.or_else(|| self.try_annotation());

        let mut underlying = None;
        if self.eat_punct(':') {
            let mut tokens = Vec::new();
            while let Some(token) = self.peek() {
                if token.is_punct('{') || token.is_punct(';') {
                    break;
                }
                if let Some(annotation_id) = self.try_annotation() {
                    annotation = annotation.or(Some(annotation_id));
                    continue;
                }
                tokens.push(self.bump().expect("peeked token").0);
            }
            if !tokens.is_empty() {
                underlying = Some(join_type_tokens(&tokens));
            }
        }

        annotation = annotation.or_else(|| self.try_annotation());

        let mut cursor = Cursor::new(CursorKind::EnumDecl, name, self.location(name_span));
        cursor.type_name = underlying;
        let id = self.tu.push(cursor);
        if let Some(annotation) = annotation {
            self.tu.attach(id, annotation);
        }
        self.attach(parent, id);

        if self.eat_punct('{') {
            self.parse_enum_values(id);
            self.eat_punct('}');
        }
        self.eat_punct(';');
    }

    fn parse_enum_values(&mut self, owner: CursorId) {
        loop {
            if self.at_punct('}') || self.peek().is_none() {
                return;
            }

            let annotation = self.try_annotation();

            let Some(HeaderToken::Ident(name)) = self.peek().cloned() else {
                self.pos += 1;
                continue;
            };
            let (_, name_span) = self.bump().expect("peeked identifier");

            let cursor =
                Cursor::new(CursorKind::EnumConstantDecl, name, self.location(name_span));
            let id = self.tu.push(cursor);
            if let Some(annotation) = annotation {
                self.tu.attach(id, annotation);
            }
            self.tu.attach(owner, id);

            // Skip any initializer expression up to the next separator.
            let mut depth = 0usize;
            while let Some(token) = self.peek() {
                if depth == 0 && (token.is_punct(',') || token.is_punct('}')) {
                    break;
                }
                if token.is_punct('(') || token.is_punct('{') {
                    depth += 1;
                } else if token.is_punct(')') || token.is_punct('}') {
                    depth = depth.saturating_sub(1);
                }
                self.pos += 1;
            }
            self.eat_punct(',');
        }
    }

    /* -------------------------------- Skipping -------------------------------- */

    /// `skip_declaration` consumes up to and including the next top-level
    /// `;`, walking over balanced braces, parens, and brackets.
    fn skip_declaration(&mut self) {
        let mut depth = 0usize;

        while let Some(token) = self.peek().cloned() {
            if depth == 0 {
                if token.is_punct(';') {
                    self.pos += 1;
                    return;
                }
                if token.is_punct('}') {
                    return;
                }
            }

            if token.is_punct('{') || token.is_punct('(') || token.is_punct('[') {
                depth += 1;
            } else if token.is_punct('}') || token.is_punct(')') || token.is_punct(']') {
                depth = depth.saturating_sub(1);
            }

            self.pos += 1;
        }
    }

    fn skip_balanced(&mut self, open: char, close: char) {
        if !self.eat_punct(open) {
            return;
        }

        let mut depth = 1usize;
        while let Some((token, _)) = self.bump() {
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                            Fn: JoinTypeTokens                              */
/* -------------------------------------------------------------------------- */

/// `join_type_tokens` renders declarator tokens into canonical type text:
/// word tokens are space-separated, scope and punctuation attach tightly.
/// `["unsigned", "long", "long"]` → `unsigned long long`;
/// `["std", "::", "vector", "<", "SomeClass", ">"]` → `std::vector<SomeClass>`;
/// `["SomeNestedClass", "*"]` → `SomeNestedClass*`.
fn join_type_tokens(tokens: &[HeaderToken]) -> String {
    let mut out = String::new();
    let mut prev_wordy = false;

    for token in tokens {
        let (text, wordy) = match token {
            HeaderToken::Ident(s) => (s.clone(), true),
            HeaderToken::Number(s) => (s.clone(), true),
            HeaderToken::ColonColon => ("::".to_string(), false),
            HeaderToken::Punct(c) => (c.to_string(), false),
            HeaderToken::Str(s) => (format!("\"{s}\""), true),
            HeaderToken::CharLit(s) => (format!("'{s}'"), true),
        };

        if prev_wordy && wordy {
            out.push(' ');
        }

        out.push_str(&text);
        prev_wordy = wordy;
    }

    out
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn kg_args() -> Vec<String> {
        vec![
            "-DKGClass(...)=__attribute__((annotate(\"KGC:\"#__VA_ARGS__)))".to_string(),
            "-DKGField(...)=__attribute__((annotate(\"KGF:\"#__VA_ARGS__)))".to_string(),
            "-DKGNamespace(...)=__attribute__((annotate(\"KGN:\"#__VA_ARGS__)))".to_string(),
            "-DKGEnum(...)=__attribute__((annotate(\"KGE:\"#__VA_ARGS__)))".to_string(),
        ]
    }

    fn scan(src: &str) -> TranslationUnit {
        HeaderAstSource::new()
            .parse_source(Path::new("Test.h"), src, &kg_args())
            .expect("scan failed")
    }

    #[test]
    fn test_decode_macro_bindings_reads_annotate_rewrites() {
        // Given: The standard -D rewrite arguments.
        let args = kg_args();

        // When: Decoding the macro bindings.
        let bindings = decode_macro_bindings(&args);

        // Then: Macro names map to their kind tags.
        assert_eq!(bindings.get("KGClass").map(String::as_str), Some("KGC"));
        assert_eq!(bindings.get("KGField").map(String::as_str), Some("KGF"));
    }

    #[test]
    fn test_scan_annotated_class_with_fields() {
        // Given: A class annotated between keyword and name, with annotated
        // and unannotated members.
        let src = r#"
            #pragma once

            class KGClass(Data) SomeClass
            {
                public:
                    class SomeNestedClass {};

                private:
                    KGField(Get[const, *], Set)
                    float _someFloat = 3.14f;

                    int _notReflected = 0;
            };
        "#;

        // When: Scanning the source.
        let tu = scan(src);

        // Then: One root class with the annotation as first child.
        assert_eq!(tu.roots().len(), 1);
        let class = tu.cursor(tu.roots()[0]);
        assert_eq!(class.kind, CursorKind::ClassDecl);
        assert_eq!(class.spelling, "SomeClass");
        assert_eq!(
            tu.annotation_of(tu.roots()[0]),
            Some(("KGC", "Data"))
        );

        // Then: The annotated field carries its payload and type text.
        let field = class
            .children
            .iter()
            .map(|id| (*id, tu.cursor(*id)))
            .find(|(_, c)| c.kind == CursorKind::FieldDecl)
            .expect("field cursor");
        assert_eq!(field.1.spelling, "_someFloat");
        assert_eq!(field.1.type_name.as_deref(), Some("float"));
        assert_eq!(tu.annotation_of(field.0), Some(("KGF", "Get[const, *], Set")));

        // Then: The unannotated field is still scanned, without annotation.
        let plain = class
            .children
            .iter()
            .map(|id| (*id, tu.cursor(*id)))
            .filter(|(_, c)| c.kind == CursorKind::FieldDecl)
            .nth(1)
            .expect("second field cursor");
        assert_eq!(plain.1.spelling, "_notReflected");
        assert_eq!(tu.annotation_of(plain.0), None);
    }

    #[test]
    fn test_scan_namespace_nesting_and_methods() {
        // Given: Nested annotated namespaces around a class with a method.
        let src = r#"
            namespace Outer KGNamespace()
            {
                namespace Inner KGNamespace()
                {
                    class KGClass() Widget
                    {
                        public:
                            virtual unsigned long long count() const;
                            Widget() = default;
                    };
                }
            }
        "#;

        // When: Scanning the source.
        let tu = scan(src);

        // Then: The namespace chain nests and the method keeps qualifiers.
        let outer = tu.cursor(tu.roots()[0]);
        assert_eq!(outer.kind, CursorKind::Namespace);
        let inner_id = outer
            .children
            .iter()
            .copied()
            .find(|id| tu.cursor(*id).kind == CursorKind::Namespace)
            .expect("inner namespace");
        let widget_id = tu
            .cursor(inner_id)
            .children
            .iter()
            .copied()
            .find(|id| tu.cursor(*id).kind == CursorKind::ClassDecl)
            .expect("class cursor");

        let method = tu
            .cursor(widget_id)
            .children
            .iter()
            .map(|id| tu.cursor(*id))
            .find(|c| c.kind == CursorKind::Method)
            .expect("method cursor");
        assert_eq!(method.spelling, "count");
        assert_eq!(method.type_name.as_deref(), Some("unsigned long long"));
        assert!(method.is_const);
        assert!(method.is_virtual);

        // Then: The defaulted constructor produced no cursor.
        assert!(
            !tu.cursor(widget_id)
                .children
                .iter()
                .any(|id| tu.cursor(*id).spelling == "Widget")
        );
    }

    #[test]
    fn test_scan_enum_with_underlying_type() {
        // Given: An annotated scoped enum with an underlying type.
        let src = "enum class KGEnum() Color : unsigned char { Red, Green = 3, Blue };";

        // When: Scanning the source.
        let tu = scan(src);

        // Then: The enum cursor carries the underlying type and its values.
        let decl = tu.cursor(tu.roots()[0]);
        assert_eq!(decl.kind, CursorKind::EnumDecl);
        assert_eq!(decl.type_name.as_deref(), Some("unsigned char"));

        let values: Vec<&str> = decl
            .children
            .iter()
            .map(|id| tu.cursor(*id))
            .filter(|c| c.kind == CursorKind::EnumConstantDecl)
            .map(|c| c.spelling.as_str())
            .collect();
        assert_eq!(values, vec!["Red", "Green", "Blue"]);
    }

    #[test]
    fn test_scan_base_list_and_final() {
        // Given: A final class with mixed-access bases.
        let src = "class KGClass() Derived final : public Base, private detail::Impl {};";

        // When: Scanning the source.
        let tu = scan(src);

        // Then: Final attribute and base specifiers are children.
        let class = tu.cursor(tu.roots()[0]);
        assert!(
            class
                .children
                .iter()
                .any(|id| tu.cursor(*id).kind == CursorKind::FinalAttr)
        );

        let bases: Vec<(&str, AccessSpecifier)> = class
            .children
            .iter()
            .map(|id| tu.cursor(*id))
            .filter(|c| c.kind == CursorKind::BaseSpecifier)
            .map(|c| (c.spelling.as_str(), c.access.expect("base access")))
            .collect();
        assert_eq!(
            bases,
            vec![
                ("Base", AccessSpecifier::Public),
                ("detail::Impl", AccessSpecifier::Private),
            ]
        );
    }
}
