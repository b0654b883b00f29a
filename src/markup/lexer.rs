//! Lexer for interface markup using logos
//!
//! Tags are lexed whole: a start tag token already carries its name and
//! decoded attributes, so the grammar only has to match tags against each
//! other and collect content.

use logos::{Lexer, Logos};

use super::tree::{Attribute, Span};

/// A lexed start tag (`<name attr="v">` or `<name attr="v"/>`)
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Declarations and processing instructions carry nothing we use
    #[regex(r"<\?([^?]|\?[^>])*\?>", logos::skip)]
    ProcessingInstruction,

    #[regex(r"<!DOCTYPE[^>]*>", logos::skip)]
    Doctype,

    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    #[regex(r"<!\[CDATA\[([^\]]|\][^\]]|\]\][^>])*\]\]>", |lex| {
        let s = lex.slice();
        s[9..s.len() - 3].to_string()
    })]
    CData(String),

    #[regex(
        r#"<[A-Za-z_][A-Za-z0-9_.:-]*([ \t\r\n]+[A-Za-z_][A-Za-z0-9_.:-]*[ \t\r\n]*=[ \t\r\n]*("[^"]*"|'[^']*'))*[ \t\r\n]*/?>"#,
        start_tag
    )]
    StartTag(StartTag),

    #[regex(r"</[A-Za-z_][A-Za-z0-9_.:-]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end().to_string()
    })]
    EndTag(String),

    // Character data, entities decoded
    #[regex(r"[^<]+", |lex| decode_entities(lex.slice()))]
    Text(String),

    // A `<` that does not open any well-formed markup
    #[token("<")]
    Stray,
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

fn start_tag(lex: &mut Lexer<Token>) -> Option<StartTag> {
    let base = lex.span().start;
    let slice = lex.slice();
    let bytes = slice.as_bytes();

    let is_name_byte = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-');

    let mut pos = 1;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    let name = slice.get(1..pos)?.to_string();

    let mut attributes = Vec::new();
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos)? {
            b'/' | b'>' => break,
            _ => {}
        }

        let attr_start = pos;
        while pos < bytes.len() && is_name_byte(bytes[pos]) {
            pos += 1;
        }
        let attr_name = slice.get(attr_start..pos)?.to_string();

        while pos < bytes.len() && bytes[pos] != b'=' {
            pos += 1;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let quote = *bytes.get(pos)?;
        let value_start = pos + 1;
        let value_len = slice.get(value_start..)?.find(quote as char)?;
        let value_end = value_start + value_len;
        let value = decode_entities(slice.get(value_start..value_end)?);
        pos = value_end + 1;

        attributes.push(Attribute {
            name: attr_name,
            value,
            span: (base + attr_start)..(base + pos),
        });
    }

    Some(StartTag {
        name,
        attributes,
        self_closing: slice.ends_with("/>"),
    })
}

/// Decode predefined entities and numeric character references.
///
/// Unknown or malformed references are kept literally.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_reference(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).map(|(t, _)| t).collect()
    }

    #[test]
    fn test_start_tag_attributes() {
        let toks = tokens(r#"<object class="GtkWindow" id='main'>"#);
        assert_eq!(toks.len(), 1);
        let Token::StartTag(tag) = &toks[0] else {
            panic!("expected start tag, got {:?}", toks[0]);
        };
        assert_eq!(tag.name, "object");
        assert!(!tag.self_closing);
        let attrs: Vec<_> = tag
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(attrs, vec![("class", "GtkWindow"), ("id", "main")]);
    }

    #[test]
    fn test_attribute_spans_are_absolute() {
        let input = r#"  <signal name="clicked" handler="go"/>"#;
        let (tok, _) = lex(input).find(|(t, _)| matches!(t, Token::StartTag(_))).unwrap();
        let Token::StartTag(tag) = tok else { unreachable!() };
        assert!(tag.self_closing);
        let handler = &tag.attributes[1];
        assert_eq!(&input[handler.span.clone()], r#"handler="go""#);
    }

    #[test]
    fn test_end_tag_and_text() {
        let toks = tokens("<property name=\"label\">Hello &amp; bye</property >");
        assert_eq!(toks[1], Token::Text("Hello & bye".to_string()));
        assert_eq!(toks[2], Token::EndTag("property".to_string()));
    }

    #[test]
    fn test_prolog_and_doctype_skipped() {
        let toks = tokens("<?xml version=\"1.0\"?><!DOCTYPE interface><interface/>");
        assert_eq!(toks.len(), 1);
        assert!(matches!(&toks[0], Token::StartTag(t) if t.name == "interface"));
    }

    #[test]
    fn test_comment_and_cdata() {
        let toks = tokens("a<!-- note -->b<![CDATA[<raw>]]>");
        assert_eq!(
            toks,
            vec![
                Token::Text("a".to_string()),
                Token::Comment,
                Token::Text("b".to_string()),
                Token::CData("<raw>".to_string()),
            ]
        );
    }

    #[test]
    fn test_stray_angle_bracket() {
        let toks = tokens("<object id=\"x\"");
        assert_eq!(toks[0], Token::Stray);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("fish &chips"), "fish &chips");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }
}
