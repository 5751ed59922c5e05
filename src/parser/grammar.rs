//! Template grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse template markup into a flat fragment
pub fn parse(input: &str) -> Result<Fragment, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    fragment_parser(input)
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// Source text under a span; empty repetitions may report an inverted span
fn source_text(source: &str, span: &std::ops::Range<usize>) -> String {
    source.get(span.clone()).unwrap_or_default().to_string()
}

fn fragment_parser<'a, I>(
    source: &'a str,
) -> impl Parser<'a, I, Fragment, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let word = select! {
        Token::Word(w) => w,
    }
    .map_with(|w, e| Spanned::new(w, span_range(&e.span())));

    // Raw text of everything up to `}}`, kept verbatim for the path parser
    let placeholder = any()
        .filter(|t: &Token| !matches!(t, Token::PlaceholderOpen | Token::PlaceholderClose))
        .repeated()
        .map_with(move |_, e| {
            let span = span_range(&e.span());
            Spanned::new(source_text(source, &span), span)
        })
        .delimited_by(
            just(Token::PlaceholderOpen),
            just(Token::PlaceholderClose).labelled("'}}'"),
        );

    let literal = any()
        .filter(|t: &Token| {
            !matches!(
                t,
                Token::Quote | Token::PlaceholderOpen | Token::PlaceholderClose
            )
        })
        .repeated()
        .at_least(1)
        .map_with(move |_, e| Segment::Literal(source_text(source, &span_range(&e.span()))));

    let quoted_value = choice((placeholder.clone().map(Segment::Placeholder), literal))
        .repeated()
        .collect::<Vec<_>>()
        .map_with(|segments, e| Spanned::new(segments, span_range(&e.span())))
        .delimited_by(just(Token::Quote), just(Token::Quote));

    let attribute = word
        .clone()
        .then_ignore(just(Token::Equals))
        .then(quoted_value)
        .map(|(name, value)| Attribute { name, value });

    let handler = any()
        .filter(|t: &Token| !matches!(t, Token::Quote))
        .repeated()
        .map_with(move |_, e| {
            let span = span_range(&e.span());
            Spanned::new(source_text(source, &span), span)
        })
        .delimited_by(just(Token::Quote), just(Token::Quote));

    let event = just(Token::At)
        .ignore_then(word)
        .then_ignore(just(Token::Equals))
        .then(handler)
        .map(|(name, handler)| EventAttribute { name, handler });

    // Anything that does not open or close a construct; comments are
    // single tokens and stay opaque
    let text = any()
        .filter(|t: &Token| {
            !matches!(
                t,
                Token::PlaceholderOpen
                    | Token::PlaceholderClose
                    | Token::TemplateOpen
                    | Token::TemplateClose
                    | Token::AngleClose
            )
        })
        .to(Node::Text);

    let node = recursive(|node| {
        let template = just(Token::TemplateOpen)
            .ignore_then(node.repeated().collect::<Vec<_>>())
            .then_ignore(just(Token::TemplateClose).labelled("'</template>'"))
            .map(|body| Node::Template(TemplateBlock::new(body)));

        // Order matters: event and attribute before plain text, since both
        // start with tokens text would otherwise swallow
        choice((
            template,
            placeholder.map(Node::Placeholder),
            event.map(Node::Event),
            attribute.map(Node::Attribute),
            just(Token::AngleClose).to(Node::TagEnd),
            text,
        ))
        .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
        .boxed()
    });

    node.repeated()
        .collect()
        .then_ignore(end())
        .map(|nodes| Fragment { nodes })
}
