//! Diagnostics and warnings produced while checking and compiling documents

use std::fmt;

use ariadne::{Color, ReportKind};
use thiserror::Error;

use crate::error::render_report;
use crate::markup::Span;

/// The structural rule a fatal diagnostic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Root element is not `<interface>`
    RootTag,
    /// `<interface>` has no `<object>` children
    NoObjects,
    /// A required attribute is absent
    MissingAttribute,
    /// A required attribute is present but empty
    EmptyAttribute,
    /// A class name the namespace policy cannot split
    ClassName,
    /// `<property>` does not hold exactly one text segment
    PropertyText,
    /// `<property>` contains an element
    PropertyNested,
    /// `<child>` has no child elements
    ChildEmpty,
    /// First element of `<child>` is not `<object>`
    ChildObject,
    /// Second element of `<child>` is not `<packing>`
    ChildPacking,
    /// `<packing>` contains something other than `<property>`
    PackingProperty,
    /// The object system has no type for a class
    UnresolvedType,
    /// Two objects share an id
    DuplicateId,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Rule::RootTag => "root-tag",
            Rule::NoObjects => "no-objects",
            Rule::MissingAttribute => "missing-attribute",
            Rule::EmptyAttribute => "empty-attribute",
            Rule::ClassName => "class-name",
            Rule::PropertyText => "property-text",
            Rule::PropertyNested => "property-nested",
            Rule::ChildEmpty => "child-empty",
            Rule::ChildObject => "child-object",
            Rule::ChildPacking => "child-packing",
            Rule::PackingProperty => "packing-property",
            Rule::UnresolvedType => "unresolved-type",
            Rule::DuplicateId => "duplicate-id",
        };
        write!(f, "{}", code)
    }
}

/// A fatal problem with a document: the `BadInput` error of validation and
/// compilation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message} [{rule}]")]
pub struct Diagnostic {
    /// Element path, e.g. `/interface/object[Main]/child[0]`
    pub path: String,
    pub rule: Rule,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(path: impl Into<String>, rule: Rule, message: impl Into<String>, span: Span) -> Self {
        Self {
            path: path.into(),
            rule,
            message: message.into(),
            span,
        }
    }

    /// Create a missing attribute diagnostic
    pub fn missing_attribute(path: impl Into<String>, element: &str, attribute: &str, span: Span) -> Self {
        Self::new(
            path,
            Rule::MissingAttribute,
            format!("<{}> has no '{}' attribute", element, attribute),
            span,
        )
    }

    /// Format the diagnostic with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        render_report(
            ReportKind::Error,
            source,
            filename,
            &self.span,
            &format!("{} [{}]", self.message, self.rule),
            &self.path,
            Color::Red,
        )
    }
}

/// Category of non-fatal finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    UnknownAttribute,
    UnknownElement,
    ExtraElement,
    StrayText,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::UnknownAttribute => write!(f, "unknown-attribute"),
            WarningKind::UnknownElement => write!(f, "unknown-element"),
            WarningKind::ExtraElement => write!(f, "extra-element"),
            WarningKind::StrayText => write!(f, "stray-text"),
        }
    }
}

/// Something in a document that is tolerated but ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub path: String,
    pub kind: WarningKind,
    pub message: String,
    pub span: Span,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.path, self.message, self.kind)
    }
}

impl Warning {
    /// Format the warning with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        render_report(
            ReportKind::Warning,
            source,
            filename,
            &self.span,
            &format!("{} [{}]", self.message, self.kind),
            &self.path,
            Color::Yellow,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::missing_attribute("/interface/object", "object", "id", 11..18);
        assert_eq!(
            d.to_string(),
            "/interface/object: <object> has no 'id' attribute [missing-attribute]"
        );
    }

    #[test]
    fn test_warning_display() {
        let w = Warning {
            path: "/interface/object[Main]".to_string(),
            kind: WarningKind::UnknownAttribute,
            message: "unknown attribute 'foo'".to_string(),
            span: 0..3,
        };
        assert_eq!(
            w.to_string(),
            "/interface/object[Main]: unknown attribute 'foo' [unknown-attribute]"
        );
    }

    #[test]
    fn test_format_points_at_source() {
        let source = "<interface>\n  <object class=\"NsWindow\"/>\n</interface>";
        let d = Diagnostic::missing_attribute("/interface/object", "object", "id", 14..21);
        let rendered = d.format(source, "main.ui");
        assert!(rendered.contains("main.ui"));
        assert!(rendered.contains("missing-attribute"));
    }
}
