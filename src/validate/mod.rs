//! Structural checks on interface documents.
//!
//! Runs before compilation. The first rule violation aborts with a
//! [`Diagnostic`]; anything merely unrecognised is collected as a [`Warning`]
//! (and logged) so that documents produced by interface designers, which carry
//! plenty of attributes this crate does not interpret, still compile.

mod diagnostic;

pub use diagnostic::{Diagnostic, Rule, Warning, WarningKind};

use tracing::warn;

use crate::config::BuilderConfig;
use crate::markup::{Attribute, Element, Node};

/// Check a document tree, returning the warnings found on success
pub fn validate(root: &Element, config: &BuilderConfig) -> Result<Vec<Warning>, Diagnostic> {
    let mut validator = Validator {
        config,
        warnings: Vec::new(),
    };
    validator.interface(root)?;
    Ok(validator.warnings)
}

/// Path segment for an `<object>`: `object[id]`, or plain `object` when it has no id
pub(crate) fn object_segment(elt: &Element) -> String {
    match elt.attr("id") {
        Some(id) => format!("object[{}]", id),
        None => "object".to_string(),
    }
}

/// Value of an attribute that must be present and non-empty
pub(crate) fn required_attr<'e>(elt: &'e Element, name: &str, path: &str) -> Result<&'e str, Diagnostic> {
    let value = elt
        .attr(name)
        .ok_or_else(|| Diagnostic::missing_attribute(path, &elt.tag, name, elt.tag_span()))?;
    if value.is_empty() {
        return Err(Diagnostic::new(
            path,
            Rule::EmptyAttribute,
            format!("<{}> has an empty '{}' attribute", elt.tag, name),
            elt.tag_span(),
        ));
    }
    Ok(value)
}

struct Validator<'c> {
    config: &'c BuilderConfig,
    warnings: Vec<Warning>,
}

impl Validator<'_> {
    fn warn(&mut self, path: &str, kind: WarningKind, message: String, span: crate::markup::Span) {
        warn!(path = %path, kind = %kind, "{}", message);
        self.warnings.push(Warning {
            path: path.to_string(),
            kind,
            message,
            span,
        });
    }

    fn check_attributes(&mut self, elt: &Element, known: &[&str], path: &str) {
        let unknown: Vec<&Attribute> = elt
            .attributes
            .iter()
            .filter(|a| !known.contains(&a.name.as_str()))
            .collect();
        for attr in unknown {
            self.warn(
                path,
                WarningKind::UnknownAttribute,
                format!("unknown attribute '{}' on <{}>", attr.name, elt.tag),
                attr.span.clone(),
            );
        }
    }

    fn check_stray_text(&mut self, elt: &Element, path: &str) {
        let stray: Vec<_> = elt
            .text_segments()
            .filter(|t| !t.node.trim().is_empty())
            .map(|t| (t.node.trim().to_string(), t.span.clone()))
            .collect();
        for (text, span) in stray {
            self.warn(
                path,
                WarningKind::StrayText,
                format!("ignoring text \"{}\" inside <{}>", text, elt.tag),
                span,
            );
        }
    }

    fn interface(&mut self, elt: &Element) -> Result<(), Diagnostic> {
        let path = format!("/{}", elt.tag);
        if elt.tag != "interface" {
            return Err(Diagnostic::new(
                path,
                Rule::RootTag,
                format!("expected <interface> element but got <{}>", elt.tag),
                elt.tag_span(),
            ));
        }
        if elt.elements_named("object").next().is_none() {
            return Err(Diagnostic::new(
                path,
                Rule::NoObjects,
                "<interface> has no <object> children",
                elt.tag_span(),
            ));
        }
        self.check_attributes(elt, &["domain"], &path);

        for child in elt.elements() {
            match child.tag.as_str() {
                "object" => self.object(child, &path)?,
                "requires" => {
                    let requires_path = format!("{}/requires", path);
                    self.check_attributes(child, &["lib", "version"], &requires_path);
                }
                other => self.warn(
                    &path,
                    WarningKind::UnknownElement,
                    format!("unrecognized element <{}> in <interface>", other),
                    child.tag_span(),
                ),
            }
        }
        self.check_stray_text(elt, &path);
        Ok(())
    }

    fn object(&mut self, elt: &Element, parent: &str) -> Result<(), Diagnostic> {
        let path = format!("{}/{}", parent, object_segment(elt));
        required_attr(elt, "id", &path)?;
        let class = required_attr(elt, "class", &path)?;

        if self.config.strict_class_names && self.config.namespace.split(class).is_none() {
            return Err(Diagnostic::new(
                path,
                Rule::ClassName,
                format!(
                    "class '{}' does not match {}",
                    class,
                    self.config.namespace.describe()
                ),
                elt.tag_span(),
            ));
        }
        self.check_attributes(elt, &["id", "class"], &path);

        let mut child_index = 0;
        for node in &elt.children {
            let Node::Element(child) = node else { continue };
            match child.tag.as_str() {
                "property" => self.property(child, &path)?,
                "signal" => self.signal(child, &path)?,
                "child" => {
                    self.child(child, &format!("{}/child[{}]", path, child_index))?;
                    child_index += 1;
                }
                other => self.warn(
                    &path,
                    WarningKind::UnknownElement,
                    format!("unrecognized element <{}> in <object>", other),
                    child.tag_span(),
                ),
            }
        }
        self.check_stray_text(elt, &path);
        Ok(())
    }

    fn property(&mut self, elt: &Element, parent: &str) -> Result<(), Diagnostic> {
        let name = elt.attr("name");
        let path = match name {
            Some(n) => format!("{}/property[{}]", parent, n),
            None => format!("{}/property", parent),
        };
        required_attr(elt, "name", &path)?;

        if let Some(nested) = elt.elements().next() {
            return Err(Diagnostic::new(
                path,
                Rule::PropertyNested,
                format!("<property> contains element <{}>", nested.tag),
                nested.tag_span(),
            ));
        }
        let segments = elt.text_segments().count();
        if segments != 1 {
            return Err(Diagnostic::new(
                path,
                Rule::PropertyText,
                format!("<property> must hold exactly one text segment, found {}", segments),
                elt.tag_span(),
            ));
        }
        self.check_attributes(elt, &["name"], &path);
        Ok(())
    }

    fn signal(&mut self, elt: &Element, parent: &str) -> Result<(), Diagnostic> {
        let path = match elt.attr("name") {
            Some(n) => format!("{}/signal[{}]", parent, n),
            None => format!("{}/signal", parent),
        };
        required_attr(elt, "name", &path)?;
        required_attr(elt, "handler", &path)?;
        self.check_attributes(elt, &["name", "handler"], &path);

        for nested in elt.elements() {
            self.warn(
                &path,
                WarningKind::UnknownElement,
                format!("unrecognized element <{}> in <signal>", nested.tag),
                nested.tag_span(),
            );
        }
        Ok(())
    }

    fn child(&mut self, elt: &Element, path: &str) -> Result<(), Diagnostic> {
        let elements: Vec<&Element> = elt.elements().collect();
        let Some(first) = elements.first() else {
            return Err(Diagnostic::new(
                path,
                Rule::ChildEmpty,
                "<child> has no child elements",
                elt.tag_span(),
            ));
        };
        if first.tag != "object" {
            return Err(Diagnostic::new(
                path,
                Rule::ChildObject,
                format!("first element of <child> is <{}>, not <object>", first.tag),
                first.tag_span(),
            ));
        }
        let packing = elements.get(1).copied();
        if let Some(second) = packing {
            if second.tag != "packing" {
                return Err(Diagnostic::new(
                    path,
                    Rule::ChildPacking,
                    format!("second element of <child> is <{}>, not <packing>", second.tag),
                    second.tag_span(),
                ));
            }
        }
        self.check_attributes(elt, &[], path);

        self.object(first, path)?;
        if let Some(packing) = packing {
            self.packing(packing, &format!("{}/packing", path))?;
        }
        for extra in elements.iter().skip(2) {
            self.warn(
                path,
                WarningKind::ExtraElement,
                format!("ignoring extra element <{}> in <child>", extra.tag),
                extra.tag_span(),
            );
        }
        self.check_stray_text(elt, path);
        Ok(())
    }

    fn packing(&mut self, elt: &Element, path: &str) -> Result<(), Diagnostic> {
        self.check_attributes(elt, &[], path);
        for child in elt.elements() {
            if child.tag != "property" {
                return Err(Diagnostic::new(
                    path,
                    Rule::PackingProperty,
                    format!("<packing> contains <{}>, only <property> is allowed", child.tag),
                    child.tag_span(),
                ));
            }
            self.property(child, path)?;
        }
        self.check_stray_text(elt, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamespacePolicy;
    use crate::markup::parse;

    fn check(source: &str) -> Result<Vec<Warning>, Diagnostic> {
        let root = parse(source).expect("Should parse");
        validate(&root, &BuilderConfig::default())
    }

    fn rule_of(source: &str) -> Rule {
        check(source).expect_err("Should be rejected").rule
    }

    #[test]
    fn test_minimal_document_is_clean() {
        let warnings = check(
            r#"<interface>
                 <object class="NsWindow" id="Main">
                   <property name="title">Hello</property>
                   <signal name="destroy" handler="quit"/>
                 </object>
               </interface>"#,
        )
        .expect("Should validate");
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_root_must_be_interface() {
        assert_eq!(rule_of(r#"<ui><object class="NsA" id="a"/></ui>"#), Rule::RootTag);
    }

    #[test]
    fn test_interface_needs_object() {
        assert_eq!(rule_of("<interface><requires lib=\"gtk+\"/></interface>"), Rule::NoObjects);
    }

    #[test]
    fn test_object_missing_id() {
        let d = check(r#"<interface><object class="NsWindow"/></interface>"#).unwrap_err();
        assert_eq!(d.rule, Rule::MissingAttribute);
        assert_eq!(d.path, "/interface/object");
        assert!(d.message.contains("'id'"));
    }

    #[test]
    fn test_object_empty_id() {
        assert_eq!(
            rule_of(r#"<interface><object class="NsWindow" id=""/></interface>"#),
            Rule::EmptyAttribute
        );
    }

    #[test]
    fn test_object_missing_class() {
        let d = check(r#"<interface><object id="Main"/></interface>"#).unwrap_err();
        assert_eq!(d.rule, Rule::MissingAttribute);
        assert_eq!(d.path, "/interface/object[Main]");
    }

    #[test]
    fn test_class_name_policy() {
        let source = r#"<interface><object class="Window" id="Main"/></interface>"#;
        assert_eq!(rule_of(source), Rule::ClassName);

        let root = parse(source).unwrap();
        let lenient = BuilderConfig::default().with_strict_class_names(false);
        assert!(validate(&root, &lenient).is_ok());

        let prefixed = BuilderConfig::default()
            .with_namespace_policy(NamespacePolicy::Prefix("Gtk".to_string()));
        let root = parse(r#"<interface><object class="NsWindow" id="Main"/></interface>"#).unwrap();
        assert_eq!(validate(&root, &prefixed).unwrap_err().rule, Rule::ClassName);
    }

    #[test]
    fn test_property_text_with_comment_and_cdata() {
        let warnings = check(
            r#"<interface><object class="NsLabel" id="l">
                 <property name="text">a<!-- dropped -->b</property>
                 <property name="hint">Less than <![CDATA[<5]]></property>
               </object></interface>"#,
        )
        .expect("Should validate");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_empty_property_path() {
        let d = check(
            r#"<interface><object class="NsLabel" id="l">
                 <property name="text"><!-- nothing --></property>
               </object></interface>"#,
        )
        .unwrap_err();
        assert_eq!(d.rule, Rule::PropertyText);
        assert_eq!(d.path, "/interface/object[l]/property[text]");
    }

    #[test]
    fn test_property_without_text() {
        assert_eq!(
            rule_of(r#"<interface><object class="NsLabel" id="l"><property name="text"/></object></interface>"#),
            Rule::PropertyText
        );
    }

    #[test]
    fn test_property_nested_element() {
        assert_eq!(
            rule_of(
                r#"<interface><object class="NsLabel" id="l">
                     <property name="text">a<b/></property>
                   </object></interface>"#
            ),
            Rule::PropertyNested
        );
    }

    #[test]
    fn test_property_missing_name() {
        assert_eq!(
            rule_of(r#"<interface><object class="NsLabel" id="l"><property>x</property></object></interface>"#),
            Rule::MissingAttribute
        );
    }

    #[test]
    fn test_signal_needs_handler() {
        let d = check(
            r#"<interface><object class="NsButton" id="b"><signal name="clicked"/></object></interface>"#,
        )
        .unwrap_err();
        assert_eq!(d.rule, Rule::MissingAttribute);
        assert_eq!(d.path, "/interface/object[b]/signal[clicked]");
    }

    #[test]
    fn test_child_with_no_elements() {
        let d = check(r#"<interface><object class="NsBox" id="b"><child> </child></object></interface>"#)
            .unwrap_err();
        assert_eq!(d.rule, Rule::ChildEmpty);
        assert_eq!(d.path, "/interface/object[b]/child[0]");
    }

    #[test]
    fn test_child_first_must_be_object() {
        assert_eq!(
            rule_of(r#"<interface><object class="NsBox" id="b"><child><packing/></child></object></interface>"#),
            Rule::ChildObject
        );
    }

    #[test]
    fn test_child_second_must_be_packing() {
        assert_eq!(
            rule_of(
                r#"<interface><object class="NsBox" id="b"><child>
                     <object class="NsLabel" id="l"/>
                     <property name="x">1</property>
                   </child></object></interface>"#
            ),
            Rule::ChildPacking
        );
    }

    #[test]
    fn test_packing_only_properties() {
        assert_eq!(
            rule_of(
                r#"<interface><object class="NsBox" id="b"><child>
                     <object class="NsLabel" id="l"/>
                     <packing><signal name="a" handler="b"/></packing>
                   </child></object></interface>"#
            ),
            Rule::PackingProperty
        );
    }

    #[test]
    fn test_nested_violation_reports_deep_path() {
        let d = check(
            r#"<interface><object class="NsWindow" id="Main"><child>
                 <object class="NsBox" id="box"><child>
                   <object class="NsLabel"/>
                 </child></object>
               </child></object></interface>"#,
        )
        .unwrap_err();
        assert_eq!(d.path, "/interface/object[Main]/child[0]/object[box]/child[0]/object");
    }

    #[test]
    fn test_unknown_attribute_on_object_warns() {
        let warnings = check(r#"<interface><object class="NsWindow" id="Main" foo="bar"/></interface>"#)
            .expect("Should validate");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnknownAttribute);
        assert_eq!(warnings[0].path, "/interface/object[Main]");
    }

    #[test]
    fn test_unknown_sibling_under_interface_warns() {
        let warnings = check(
            r#"<interface>
                 <requires lib="gtk+" version="3.12"/>
                 <menu id="m"/>
                 <object class="NsWindow" id="Main"/>
               </interface>"#,
        )
        .expect("Should validate");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnknownElement);
        assert!(warnings[0].message.contains("<menu>"));
    }

    #[test]
    fn test_extra_elements_in_child_warn() {
        let warnings = check(
            r#"<interface><object class="NsBox" id="b"><child>
                 <object class="NsLabel" id="l"/>
                 <packing/>
                 <placeholder/>
               </child></object></interface>"#,
        )
        .expect("Should validate");
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::ExtraElement]);
    }

    #[test]
    fn test_translatable_attribute_warns() {
        let warnings = check(
            r#"<interface><object class="NsLabel" id="l">
                 <property name="label" translatable="yes">Hello</property>
                 <signal name="clicked" handler="go" swapped="no"/>
                 stray
               </object></interface>"#,
        )
        .expect("Should validate");
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WarningKind::UnknownAttribute,
                WarningKind::UnknownAttribute,
                WarningKind::StrayText
            ]
        );
    }
}
