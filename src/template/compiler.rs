//! Document tree to template compilation

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{ChildTemplate, PropertyDescriptor, SignalBinding, Template, TemplateSet, TypeRef};
use crate::config::BuilderConfig;
use crate::markup::{Element, Span};
use crate::object::ObjectSystem;
use crate::validate::{object_segment, required_attr, Diagnostic, Rule};

/// Compile an `<interface>` tree into a set of templates.
///
/// The tree should already have passed [`crate::validate::validate`]; on an
/// unvalidated tree, structural problems the compiler relies on are still
/// reported as diagnostics rather than ignored. Unresolvable types and
/// duplicate ids are always reported here.
pub fn compile<S: ObjectSystem>(
    root: &Element,
    objects: &S,
    config: &BuilderConfig,
) -> Result<TemplateSet<S::Type>, Diagnostic> {
    let path = format!("/{}", root.tag);
    if root.tag != "interface" {
        return Err(Diagnostic::new(
            path,
            Rule::RootTag,
            format!("expected <interface> element but got <{}>", root.tag),
            root.tag_span(),
        ));
    }

    let mut compiler = Compiler {
        objects,
        config,
        set: TemplateSet::new(),
        seen: HashMap::new(),
    };
    for elt in root.elements_named("object") {
        let template = compiler.object(elt, &path)?;
        compiler.set.push_root(&template.id);
    }
    if compiler.set.is_empty() {
        return Err(Diagnostic::new(
            path,
            Rule::NoObjects,
            "<interface> has no <object> children",
            root.tag_span(),
        ));
    }

    debug!(templates = compiler.set.len(), "compiled interface");
    Ok(compiler.set)
}

struct Compiler<'a, S: ObjectSystem> {
    objects: &'a S,
    config: &'a BuilderConfig,
    set: TemplateSet<S::Type>,
    /// First occurrence of each id
    seen: HashMap<String, Span>,
}

impl<S: ObjectSystem> Compiler<'_, S> {
    fn object(&mut self, elt: &Element, parent: &str) -> Result<Arc<Template<S::Type>>, Diagnostic> {
        let path = format!("{}/{}", parent, object_segment(elt));
        let id = required_attr(elt, "id", &path)?;
        let class = required_attr(elt, "class", &path)?;

        if let Some(first) = self.seen.get(id) {
            return Err(Diagnostic::new(
                path,
                Rule::DuplicateId,
                format!("duplicate id '{}' (first defined at offset {})", id, first.start),
                elt.tag_span(),
            ));
        }
        self.seen.insert(id.to_string(), elt.tag_span());
        self.set.reserve(id);

        let (namespace, name) = self.config.namespace.split(class).ok_or_else(|| {
            Diagnostic::new(
                &path,
                Rule::ClassName,
                format!(
                    "class '{}' of object '{}' does not match {}",
                    class,
                    id,
                    self.config.namespace.describe()
                ),
                elt.tag_span(),
            )
        })?;
        let resolved = self.objects.lookup_type(namespace, name).ok_or_else(|| {
            Diagnostic::new(
                &path,
                Rule::UnresolvedType,
                format!("cannot resolve class '{}' of object '{}'", class, id),
                elt.tag_span(),
            )
        })?;

        let mut properties = Vec::new();
        let mut signals = Vec::new();
        let mut children = Vec::new();
        for child in elt.elements() {
            match child.tag.as_str() {
                "property" => properties.push(property(child, &path)?),
                "signal" => signals.push(signal(child, &path)?),
                "child" => {
                    let child_path = format!("{}/child[{}]", path, children.len());
                    children.push(self.child(child, &child_path)?);
                }
                _ => {}
            }
        }

        let template = Arc::new(Template {
            id: id.to_string(),
            class: class.to_string(),
            type_ref: TypeRef {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            resolved,
            properties,
            signals,
            children,
            span: elt.span.clone(),
        });
        trace!(id, class, "compiled template");
        self.set.insert(template.clone());
        Ok(template)
    }

    fn child(&mut self, elt: &Element, path: &str) -> Result<ChildTemplate<S::Type>, Diagnostic> {
        let mut elements = elt.elements();
        let object = match elements.next() {
            Some(first) if first.tag == "object" => first,
            Some(first) => {
                return Err(Diagnostic::new(
                    path,
                    Rule::ChildObject,
                    format!("first element of <child> is <{}>, not <object>", first.tag),
                    first.tag_span(),
                ))
            }
            None => {
                return Err(Diagnostic::new(
                    path,
                    Rule::ChildEmpty,
                    "<child> has no child elements",
                    elt.tag_span(),
                ))
            }
        };

        let packing = match elements.next() {
            Some(second) if second.tag == "packing" => packing(second, &format!("{}/packing", path))?,
            Some(second) => {
                return Err(Diagnostic::new(
                    path,
                    Rule::ChildPacking,
                    format!("second element of <child> is <{}>, not <packing>", second.tag),
                    second.tag_span(),
                ))
            }
            None => Vec::new(),
        };

        Ok(ChildTemplate {
            template: self.object(object, path)?,
            packing,
        })
    }
}

fn property(elt: &Element, parent: &str) -> Result<PropertyDescriptor, Diagnostic> {
    let path = match elt.attr("name") {
        Some(n) => format!("{}/property[{}]", parent, n),
        None => format!("{}/property", parent),
    };
    let name = required_attr(elt, "name", &path)?;
    if let Some(nested) = elt.elements().next() {
        return Err(Diagnostic::new(
            path,
            Rule::PropertyNested,
            format!("<property> contains element <{}>", nested.tag),
            nested.tag_span(),
        ));
    }
    let raw = elt.single_text().ok_or_else(|| {
        Diagnostic::new(
            &path,
            Rule::PropertyText,
            "<property> must hold exactly one text segment",
            elt.tag_span(),
        )
    })?;

    Ok(PropertyDescriptor {
        name: name.to_string(),
        raw: raw.to_string(),
        span: elt.span.clone(),
    })
}

fn signal(elt: &Element, parent: &str) -> Result<SignalBinding, Diagnostic> {
    let path = match elt.attr("name") {
        Some(n) => format!("{}/signal[{}]", parent, n),
        None => format!("{}/signal", parent),
    };
    Ok(SignalBinding {
        event: required_attr(elt, "name", &path)?.to_string(),
        handler: required_attr(elt, "handler", &path)?.to_string(),
    })
}

fn packing(elt: &Element, path: &str) -> Result<Vec<PropertyDescriptor>, Diagnostic> {
    elt.elements()
        .map(|child| {
            if child.tag != "property" {
                return Err(Diagnostic::new(
                    path,
                    Rule::PackingProperty,
                    format!("<packing> contains <{}>, only <property> is allowed", child.tag),
                    child.tag_span(),
                ));
            }
            property(child, path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamespacePolicy;
    use crate::markup::parse;
    use crate::object::{MemoryObjects, TypeSpec};

    const MAIN: &str = r#"<interface>
  <object class="NsWindow" id="Main">
    <property name="title">Demo</property>
    <signal name="destroy" handler="onDestroy"/>
    <child>
      <object class="NsLabel" id="lbl">
        <property name="text">Hi</property>
      </object>
      <packing>
        <property name="align">0</property>
      </packing>
    </child>
  </object>
</interface>"#;

    fn compile_str(source: &str, objects: &MemoryObjects) -> Result<TemplateSet<<MemoryObjects as ObjectSystem>::Type>, Diagnostic> {
        let root = parse(source).expect("Should parse");
        compile(&root, objects, &BuilderConfig::default())
    }

    #[test]
    fn test_compile_nested_templates() {
        let set = compile_str(MAIN, &MemoryObjects::permissive()).expect("Should compile");

        assert_eq!(set.ids().collect::<Vec<_>>(), vec!["Main", "lbl"]);
        assert_eq!(set.roots().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["Main"]);

        let main = set.get("Main").unwrap();
        assert_eq!(
            main.type_ref,
            TypeRef {
                namespace: "Ns".to_string(),
                name: "Window".to_string()
            }
        );
        assert_eq!(main.properties[0].name, "title");
        assert_eq!(main.properties[0].raw, "Demo");
        assert_eq!(
            main.signals,
            vec![SignalBinding {
                event: "destroy".to_string(),
                handler: "onDestroy".to_string()
            }]
        );
        assert_eq!(main.children.len(), 1);
        assert_eq!(main.subtree_len(), 2);

        let edge = &main.children[0];
        assert!(Arc::ptr_eq(&edge.template, set.get("lbl").unwrap()));
        assert_eq!(edge.packing.len(), 1);
        assert_eq!(edge.packing[0].name, "align");
        // packing properties stay on the edge
        assert!(edge.template.properties.iter().all(|p| p.name != "align"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let source = r#"<interface>
            <object class="NsWindow" id="a"/>
            <object class="NsWindow" id="b"><child><object class="NsLabel" id="a"/></child></object>
        </interface>"#;
        let d = compile_str(source, &MemoryObjects::permissive()).unwrap_err();
        assert_eq!(d.rule, Rule::DuplicateId);
        assert_eq!(d.path, "/interface/object[b]/child[0]/object[a]");
    }

    #[test]
    fn test_unresolved_type_names_id_and_class() {
        let objects = MemoryObjects::new().with_type("Ns", "Window", TypeSpec::new().container());
        let source = r#"<interface><object class="NsWindow" id="w"><child>
            <object class="NsSpinner" id="spin"/>
        </child></object></interface>"#;
        let d = compile_str(source, &objects).unwrap_err();
        assert_eq!(d.rule, Rule::UnresolvedType);
        assert!(d.message.contains("NsSpinner"));
        assert!(d.message.contains("spin"));
    }

    #[test]
    fn test_prefix_policy() {
        let root = parse(r#"<interface><object class="GtkSourceView" id="v"/></interface>"#).unwrap();
        let config = BuilderConfig::default().with_namespace_policy(NamespacePolicy::Prefix("Gtk".to_string()));
        let set = compile(&root, &MemoryObjects::permissive(), &config).unwrap();
        let view = set.get("v").unwrap();
        assert_eq!(view.type_ref.namespace, "Gtk");
        assert_eq!(view.type_ref.name, "SourceView");
        assert_eq!(view.class, "GtkSourceView");
    }

    #[test]
    fn test_unvalidated_tree_does_not_panic() {
        let cases = [
            (r#"<ui/>"#, Rule::RootTag),
            (r#"<interface/>"#, Rule::NoObjects),
            (r#"<interface><object class="NsA"/></interface>"#, Rule::MissingAttribute),
            (r#"<interface><object class="NsA" id="a"><child/></object></interface>"#, Rule::ChildEmpty),
            (
                r#"<interface><object class="NsA" id="a"><property name="p"/></object></interface>"#,
                Rule::PropertyText,
            ),
            (
                r#"<interface><object class="NsA" id="a"><child><object class="NsB" id="b"/><packing><x/></packing></child></object></interface>"#,
                Rule::PackingProperty,
            ),
        ];
        for (source, rule) in cases {
            let d = compile_str(source, &MemoryObjects::permissive()).unwrap_err();
            assert_eq!(d.rule, rule, "for {}", source);
        }
    }

    #[test]
    fn test_templates_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TemplateSet<<MemoryObjects as ObjectSystem>::Type>>();
    }
}
