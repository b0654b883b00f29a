//! Error types for reading markup

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::markup::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

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
    /// Source span of the error
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
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
                render_report(
                    ReportKind::Error,
                    source,
                    filename,
                    span,
                    message,
                    &format!("{}{}", message, expected_str),
                    Color::Red,
                )
            }
        }
    }
}

/// Render a single-label ariadne report into a string
pub(crate) fn render_report(
    kind: ReportKind<'_>,
    source: &str,
    filename: &str,
    span: &Span,
    message: &str,
    label: &str,
    color: Color,
) -> String {
    let mut buf = Vec::new();
    let written = Report::build(kind, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span.clone()))
                .with_message(label)
                .with_color(color),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("{}: {}", filename, message),
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
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
fn format_token(tok: &Token) -> String {
    match tok {
        Token::StartTag(tag) if tag.self_closing => format!("empty element <{}/>", tag.name),
        Token::StartTag(tag) => format!("start tag <{}>", tag.name),
        Token::EndTag(name) => format!("end tag </{}>", name),
        Token::Text(s) if s.trim().is_empty() => "whitespace".to_string(),
        Token::Text(s) => format!("text \"{}\"", s.trim()),
        Token::CData(_) => "CDATA section".to_string(),
        Token::Comment => "comment".to_string(),
        Token::Stray => "'<' outside of a tag".to_string(),
        Token::ProcessingInstruction => "processing instruction".to_string(),
        Token::Doctype => "doctype".to_string(),
    }
}
