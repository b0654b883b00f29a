//! Integration tests for document checking and error reporting

use classbuilder::markup::parse;
use classbuilder::validate::validate;
use classbuilder::{Builder, BuilderConfig, LoadError, MemoryObjects, Rule, WarningKind};

fn rejected(source: &str) -> classbuilder::Diagnostic {
    match Builder::from_str(source, MemoryObjects::permissive(), BuilderConfig::default()) {
        Err(LoadError::BadInput(d)) => d,
        Err(e) => panic!("expected BadInput, got {}", e),
        Ok(_) => panic!("expected BadInput for {}", source),
    }
}

#[test]
fn test_rejects_object_without_id() {
    let d = rejected(r#"<interface><object class="NsWindow"/></interface>"#);
    assert_eq!(d.rule, Rule::MissingAttribute);
}

#[test]
fn test_rejects_property_without_text() {
    let d = rejected(
        r#"<interface><object class="NsLabel" id="l">
             <property name="label"><!-- todo --></property>
           </object></interface>"#,
    );
    assert_eq!(d.rule, Rule::PropertyText);
}

#[test]
fn test_cdata_and_comments_stay_in_one_value() {
    let builder = Builder::from_str(
        r#"<interface><object class="NsLabel" id="l">
             <property name="label">Less than <![CDATA[<5]]></property>
             <property name="tooltip">a<!-- c -->b</property>
           </object></interface>"#,
        MemoryObjects::permissive(),
        BuilderConfig::default(),
    )
    .expect("Should load");
    let label = builder.instantiate("l").unwrap();
    let text = |name: &str| label.object().property(name).and_then(|v| v.as_str().map(String::from));
    assert_eq!(text("label"), Some("Less than <5".to_string()));
    assert_eq!(text("tooltip"), Some("ab".to_string()));
}

#[test]
fn test_rejects_property_with_nested_element() {
    let d = rejected(
        r#"<interface><object class="NsLabel" id="l">
             <property name="label"><b>bold</b></property>
           </object></interface>"#,
    );
    assert_eq!(d.rule, Rule::PropertyNested);
}

#[test]
fn test_rejects_empty_child() {
    let d = rejected(r#"<interface><object class="NsBox" id="b"><child/></object></interface>"#);
    assert_eq!(d.rule, Rule::ChildEmpty);
    assert_eq!(d.path, "/interface/object[b]/child[0]");
}

#[test]
fn test_rejects_child_without_packing_second() {
    let d = rejected(
        r#"<interface><object class="NsBox" id="b"><child>
             <object class="NsLabel" id="l"/>
             <object class="NsLabel" id="m"/>
           </child></object></interface>"#,
    );
    assert_eq!(d.rule, Rule::ChildPacking);
}

#[test]
fn test_warns_on_unknown_object_attribute() {
    let builder = Builder::from_str(
        r#"<interface><object class="NsWindow" id="w" colour="red"/></interface>"#,
        MemoryObjects::permissive(),
        BuilderConfig::default(),
    )
    .expect("Should load");
    let warning = &builder.warnings()[0];
    assert_eq!(warning.kind, WarningKind::UnknownAttribute);
    assert!(warning.message.contains("colour"));
    assert!(builder.instantiate("w").is_ok());
}

#[test]
fn test_warns_on_unknown_interface_child() {
    let root = parse(
        r#"<interface>
             <object class="NsWindow" id="w"/>
             <template class="MyWidget" parent="NsBox"/>
           </interface>"#,
    )
    .unwrap();
    let warnings = validate(&root, &BuilderConfig::default()).expect("Should validate");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::UnknownElement);
    assert_eq!(warnings[0].path, "/interface");
}

#[test]
fn test_diagnostic_renders_source_context() {
    let source = "<interface>\n  <object class=\"NsWindow\" id=\"w\">\n    <child/>\n  </object>\n</interface>\n";
    let err = Builder::from_str(source, MemoryObjects::permissive(), BuilderConfig::default())
        .err()
        .expect("Should fail");
    let rendered = err.format(source, "broken.ui");
    assert!(rendered.contains("broken.ui"));
    assert!(rendered.contains("child-empty"));
}

#[test]
fn test_malformed_markup_is_a_parse_error() {
    let source = "<interface><object class=\"NsWindow\" id=\"w\"></interface>";
    match Builder::from_str(source, MemoryObjects::permissive(), BuilderConfig::default()) {
        Err(LoadError::Parse(errors)) => {
            assert!(!errors.is_empty());
            let rendered = LoadError::Parse(errors).format(source, "bad.ui");
            assert!(rendered.contains("bad.ui"));
        }
        Err(e) => panic!("expected a parse error, got {}", e),
        Ok(_) => panic!("expected a parse error"),
    }
}

#[test]
fn test_entities_reach_property_values() {
    let builder = Builder::from_str(
        r#"<interface><object class="NsLabel" id="l">
             <property name="label">Fish &amp; Chips &lt;3&gt;</property>
           </object></interface>"#,
        MemoryObjects::permissive(),
        BuilderConfig::default(),
    )
    .unwrap();
    let label = builder.instantiate("l").unwrap();
    assert_eq!(
        label.object().property("label").and_then(|v| v.as_str().map(String::from)),
        Some("Fish & Chips <3>".to_string())
    );
}
