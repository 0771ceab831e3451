use chumsky::prelude::*;
use chumsky::text;

/* -------------------------------------------------------------------------- */
/*                             Enum: HeaderToken                              */
/* -------------------------------------------------------------------------- */

/// `HeaderToken` is one lexical unit of a C-family header. Whitespace,
/// comments, and preprocessor lines are consumed by the lexer and never
/// surface as tokens.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeaderToken {
    /// A character literal; the content excludes the surrounding quotes.
    CharLit(String),
    ColonColon,
    Ident(String),
    Number(String),
    Punct(char),
    /// A string literal; the content excludes the surrounding quotes.
    Str(String),
}

impl HeaderToken {
    /// `is_ident` matches an identifier token with the given spelling.
    pub fn is_ident(&self, spelling: &str) -> bool {
        matches!(self, HeaderToken::Ident(s) if s == spelling)
    }

    /// `is_punct` matches a punctuation token with the given character.
    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, HeaderToken::Punct(p) if *p == c)
    }
}

/* -------------------------------------------------------------------------- */
/*                               Fn: LexHeader                                */
/* -------------------------------------------------------------------------- */

/// `lex_header` lexes header source text into spanned [`HeaderToken`]s.
/// Spans are byte ranges into the input.
pub fn lex_header(src: &str) -> Result<Vec<(HeaderToken, SimpleSpan)>, Vec<Rich<'_, char>>> {
    lexer().parse(src).into_result()
}

/* -------------------------------- Fn: lexer ------------------------------- */

/// [lexer] creates a lexer which lexes header source text into a sequence of
/// [`HeaderToken`]s.
fn lexer<'src>()
-> impl Parser<'src, &'src str, Vec<(HeaderToken, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    // Trivia: whitespace, comments, and preprocessor lines carry no meaning
    // for declaration scanning.

    let whitespace = any().filter(|c: &char| c.is_whitespace()).ignored();

    let line_comment = just("//")
        .then(any().and_is(text::newline().not()).repeated())
        .ignored();

    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored();

    let preprocessor = just('#')
        .then(any().and_is(text::newline().not()).repeated())
        .ignored();

    let trivia = choice((line_comment, block_comment, preprocessor, whitespace))
        .repeated()
        .ignored();

    // Tokens

    let ident = text::ascii::ident().map(|s: &str| HeaderToken::Ident(s.to_string()));

    let number = any()
        .filter(|c: &char| c.is_ascii_digit())
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '.')
                .repeated(),
        )
        .to_slice()
        .map(|s: &str| HeaderToken::Number(s.to_string()));

    let string = none_of("\\\"")
        .ignored()
        .or(just('\\').then(any()).ignored())
        .repeated()
        .to_slice()
        .delimited_by(just('"'), just('"'))
        .map(|s: &str| HeaderToken::Str(s.to_string()));

    let char_lit = none_of("\\'")
        .ignored()
        .or(just('\\').then(any()).ignored())
        .repeated()
        .to_slice()
        .delimited_by(just('\''), just('\''))
        .map(|s: &str| HeaderToken::CharLit(s.to_string()));

    let scope = just("::").to(HeaderToken::ColonColon);

    let punct = one_of("{}()[]<>;:,*&=~!^|+-/%.?").map(HeaderToken::Punct);

    let token = choice((scope, string, char_lit, number, ident, punct))
        .map_with(|token, info| (token, info.span()));

    token
        .padded_by(trivia.clone())
        .repeated()
        .collect()
        .then_ignore(trivia)
        .then_ignore(end())
}

/* -------------------------------------------------------------------------- */
/*                                 Mod: Tests                                 */
/* -------------------------------------------------------------------------- */
