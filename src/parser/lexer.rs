//! Lexer for template markup using logos
//!
//! Every input byte belongs to some token: whitespace is significant in
//! markup, so nothing is skipped. Markup the engine does not care about
//! lexes as `Word` runs and single-character symbols.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Placeholder delimiters (longer patterns win over the single braces)
    #[token("{{")]
    PlaceholderOpen,
    #[token("}}")]
    PlaceholderClose,

    // Nested template blocks; produced by `lex` from `<` + `template`
    // and `<` + `/template` + `>` runs
    TemplateOpen,
    TemplateClose,

    // `<!-- ... -->`; an unterminated comment runs to the end of input
    #[token("<!--", comment_body)]
    Comment,

    // Single-character symbols
    #[token("<")]
    AngleOpen,
    #[token(">")]
    AngleClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("@")]
    At,
    #[token("=")]
    Equals,
    #[token("\"")]
    Quote,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r#"[^ \t\r\n{}<>@="]+"#, |lex| lex.slice().to_string())]
    Word(String),
}

/// Extend a comment token through its closing `-->`
fn comment_body(lex: &mut logos::Lexer<Token>) {
    let rest = lex.remainder();
    let len = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
    lex.bump(len);
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    let tokens: Vec<(Token, Span)> = Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
        .collect();
    merge_template_tags(tokens).into_iter()
}

/// Fold the tokens of `<template` and `</template>` into single tokens
///
/// Done here rather than with logos literals so that tags sharing a
/// prefix (`<table`, `<templates>`) still lex as ordinary words.
fn merge_template_tags(tokens: Vec<(Token, Span)>) -> Vec<(Token, Span)> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let (tok, span) = &tokens[i];
        if *tok == Token::AngleOpen {
            match tokens.get(i + 1) {
                Some((Token::Word(w), next)) if w == "template" => {
                    out.push((Token::TemplateOpen, span.start..next.end));
                    i += 2;
                    continue;
                }
                Some((Token::Word(w), _)) if w == "/template" => {
                    if let Some((Token::AngleClose, close)) = tokens.get(i + 2) {
                        out.push((Token::TemplateClose, span.start..close.end));
                        i += 3;
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push((tok.clone(), span.clone()));
        i += 1;
    }
    out
}
