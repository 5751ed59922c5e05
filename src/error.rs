//! Error types for template parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Template markup that violates the placeholder, attribute or nesting syntax
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Format every error of a failed parse, one report after another
pub fn format_errors(errors: &[ParseError], source: &str, filename: &str) -> String {
    errors
        .iter()
        .map(|e| e.format(source, filename))
        .collect::<Vec<_>>()
        .join("\n")
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use crate::parser::lexer::Token;
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found.as_deref() {
                Some(Token::PlaceholderClose) => "'}}' without a matching '{{'".to_string(),
                Some(Token::TemplateClose) => {
                    "'</template>' without a matching '<template'".to_string()
                }
                Some(tok) => format!("Unexpected {}", format_token(tok)),
                None => "Unexpected end of input".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::PlaceholderOpen => "'{{'".to_string(),
        Token::PlaceholderClose => "'}}'".to_string(),
        Token::TemplateOpen => "'<template'".to_string(),
        Token::TemplateClose => "'</template>'".to_string(),
        Token::Comment => "comment".to_string(),
        Token::AngleOpen => "'<'".to_string(),
        Token::AngleClose => "'>'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::At => "'@'".to_string(),
        Token::Equals => "'='".to_string(),
        Token::Quote => "'\"'".to_string(),
        Token::Whitespace => "whitespace".to_string(),
        Token::Word(w) => format!("'{}'", w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclosed_placeholder_report() {
        let source = "<p>{{ name</p>";
        let errors = crate::parser::parse(source).unwrap_err();
        assert!(!errors.is_empty());
        let report = errors[0].format(source, "card.html");
        assert!(report.contains("card.html"));
    }

    #[test]
    fn test_stray_close_messages() {
        let errors = crate::parser::parse("<p>name }}</p>").unwrap_err();
        assert!(errors[0].to_string().contains("without a matching '{{'"));
        let errors = crate::parser::parse("<p></template>").unwrap_err();
        assert!(errors[0].to_string().contains("without a matching '<template'"));
    }

    #[test]
    fn test_format_errors_joins_reports() {
        let source = "<p>{{ name</p>";
        let errors = crate::parser::parse(source).unwrap_err();
        let report = format_errors(&errors, source, "card.html");
        assert!(report.contains("card.html"));
    }

    #[test]
    fn test_display_includes_message() {
        let err = ParseError::Syntax {
            span: 3..5,
            message: "Unexpected '}}'".to_string(),
            expected: vec![],
        };
        assert!(err.to_string().contains("Unexpected '}}'"));
        assert_eq!(err.span(), &(3..5));
    }
}
