//! Document tree types for interface markup

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Tree node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// An attribute on a start tag: `name="value"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Value with entities already decoded
    pub value: String,
    pub span: Span,
}

/// A markup element with its attributes and content
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Span of the whole element, start tag through end tag
    pub span: Span,
}

/// Content of an element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// A run of character data, CDATA sections included.
    /// Comments are dropped and never split a segment.
    Text(Spanned<String>),
}

impl Element {
    /// Look up an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Iterate over child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate over child elements with the given tag
    pub fn elements_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.tag == tag)
    }

    /// Iterate over the text segments directly inside this element
    pub fn text_segments(&self) -> impl Iterator<Item = &Spanned<String>> {
        self.children.iter().filter_map(|n| match n {
            Node::Text(t) => Some(t),
            _ => None,
        })
    }

    /// The element's text when it consists of exactly one segment
    pub fn single_text(&self) -> Option<&str> {
        let mut segments = self.text_segments();
        match (segments.next(), segments.next()) {
            (Some(t), None) => Some(t.node.as_str()),
            _ => None,
        }
    }

    /// Span covering just the start tag's name, for pointing diagnostics at an element
    pub fn tag_span(&self) -> Span {
        let start = self.span.start;
        start..(start + 1 + self.tag.len()).min(self.span.end)
    }
}
