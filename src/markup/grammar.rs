//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::markup::lexer::{StartTag, Token};
use crate::markup::tree::*;

/// Parse markup text into its root element
pub fn parse(input: &str) -> Result<Element, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::markup::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn element_from(tag: StartTag, children: Vec<Node>, span: Span) -> Element {
    Element {
        tag: tag.name,
        attributes: tag.attributes,
        children,
        span,
    }
}

/// Drop comments and join adjacent character data into single text segments
fn merge_text(items: Vec<Option<Node>>) -> Vec<Node> {
    let mut nodes: Vec<Node> = Vec::with_capacity(items.len());
    for node in items.into_iter().flatten() {
        if let (Node::Text(next), Some(Node::Text(prev))) = (&node, nodes.last_mut()) {
            prev.node.push_str(&next.node);
            prev.span.end = next.span.end;
            continue;
        }
        nodes.push(node);
    }
    nodes
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Element, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let element = recursive(|element| {
        let text = select! {
            Token::Text(s) => s,
            Token::CData(s) => s,
        }
        .map_with(|s, e| Node::Text(Spanned::new(s, span_range(&e.span()))));

        let content = choice((
            element.map(|e| Some(Node::Element(e))),
            text.map(Some),
            just(Token::Comment).to(None),
        ))
        .repeated()
        .collect::<Vec<_>>()
        .map(merge_text);

        let empty = select! {
            Token::StartTag(tag) if tag.self_closing => tag,
        }
        .map_with(|tag, e| element_from(tag, Vec::new(), span_range(&e.span())));

        let open = select! {
            Token::StartTag(tag) if !tag.self_closing => tag,
        }
        .labelled("start tag");

        let close = select! {
            Token::EndTag(name) => name,
        }
        .labelled("end tag");

        let nested = open
            .then(content)
            .then(close)
            .try_map(|((tag, children), end), span| {
                if tag.name == end {
                    Ok(element_from(tag, children, span_range(&span)))
                } else {
                    Err(Rich::custom(
                        span,
                        format!("closing tag </{}> does not match <{}>", end, tag.name),
                    ))
                }
            });

        choice((empty, nested))
    });

    // Whitespace and comments may surround the root element
    let misc = choice((
        just(Token::Comment).ignored(),
        select! { Token::Text(s) if s.trim().is_empty() => () },
    ))
    .repeated();

    misc.clone()
        .ignore_then(element)
        .then_ignore(misc)
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = parse(
            r#"<?xml version="1.0"?>
<!-- generated -->
<interface>
  <object class="NsWindow" id="Main">
    <property name="title">Hello</property>
  </object>
</interface>
"#,
        )
        .expect("Should parse");

        assert_eq!(root.tag, "interface");
        let object = root.elements().next().expect("object");
        assert_eq!(object.attr("id"), Some("Main"));
        let property = object.elements().next().expect("property");
        assert_eq!(property.single_text(), Some("Hello"));
    }

    #[test]
    fn test_self_closing_element() {
        let root = parse(r#"<interface><signal name="clicked" handler="go"/></interface>"#)
            .expect("Should parse");
        let signal = root.elements().next().unwrap();
        assert_eq!(signal.tag, "signal");
        assert!(signal.children.is_empty());
    }

    #[test]
    fn test_element_span_covers_end_tag() {
        let input = "<a><b>x</b></a>";
        let root = parse(input).expect("Should parse");
        let b = root.elements().next().unwrap();
        assert_eq!(&input[b.span.clone()], "<b>x</b>");
        assert_eq!(root.span, 0..input.len());
    }

    #[test]
    fn test_comment_inside_property_joins_text() {
        let input = "<property name=\"x\">a<!-- dropped -->b</property>";
        let root = parse(input).expect("Should parse");
        assert_eq!(root.text_segments().count(), 1);
        assert_eq!(root.single_text(), Some("ab"));
        let segment = root.text_segments().next().unwrap();
        assert_eq!(&input[segment.span.clone()], "a<!-- dropped -->b");
    }

    #[test]
    fn test_cdata_joins_surrounding_text() {
        let root = parse("<property name=\"x\">Less than <![CDATA[<5]]> items</property>").expect("Should parse");
        assert_eq!(root.single_text(), Some("Less than <5 items"));
    }

    #[test]
    fn test_element_still_separates_text() {
        let root = parse("<child>a<!-- c --><b/>c</child>").expect("Should parse");
        let texts: Vec<&str> = root.text_segments().map(|t| t.node.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_mismatched_close_tag() {
        let errors = parse("<interface><object></interface></object>").unwrap_err();
        assert!(!errors.is_empty());
        assert!(parse("<a></b>").is_err());
    }

    #[test]
    fn test_trailing_content_rejected() {
        assert!(parse("<a/><b/>").is_err());
    }

    #[test]
    fn test_unterminated_tag_rejected() {
        assert!(parse("<interface><object id=\"x\"</interface>").is_err());
    }
}
