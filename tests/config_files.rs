//! The shipped config directory loads and renders.

use std::path::PathBuf;

use view_arch::{
    ConfigLoader, Domain, Evaluation, FieldMetadataProvider, KeepDynamic, ModelFields,
    ProcessorConfig, RecordContext, RelationArity, ViewProcessor, ViewTree,
};

fn config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn shipped_config_loads() {
    let loader = ConfigLoader::new(config_dir());
    assert_eq!(
        loader.load_processor_config().unwrap(),
        ProcessorConfig::default()
    );

    let partner = ModelFields::from_yaml_file(loader.model_path("partner")).unwrap();
    assert_eq!(partner.model(), "Partner");
    assert_eq!(
        partner.field_info("category_ids").unwrap().relation,
        RelationArity::ToMany
    );
}

#[test]
fn partner_form_renders_for_client() {
    let loader = ConfigLoader::new(config_dir());
    let partner = ModelFields::from_yaml_file(loader.model_path("partner")).unwrap();
    let arch = std::fs::read_to_string(config_dir().join("views/partner_form.xml")).unwrap();

    let processor =
        ViewProcessor::new(&partner, &partner, &KeepDynamic).with_config(ProcessorConfig::client());
    let out = processor.process(&arch, &RecordContext::new()).unwrap();
    let tree = ViewTree::parse(&out).unwrap();

    let modifiers_of = |name: &str| -> serde_json::Value {
        let id = tree
            .elements_by_tag("field")
            .into_iter()
            .find(|id| tree.element(*id).unwrap().attr("name") == Some(name))
            .unwrap();
        serde_json::from_str(tree.element(id).unwrap().attr("modifiers").unwrap()).unwrap()
    };

    assert_eq!(modifiers_of("display_name"), serde_json::json!({"readonly": true}));
    assert_eq!(modifiers_of("name"), serde_json::json!({"required": true}));
    assert_eq!(
        modifiers_of("parent_id"),
        serde_json::json!({"invisible": [["is_company", "=", true]]})
    );
    assert_eq!(
        modifiers_of("city"),
        serde_json::json!({"readonly": [["parent_id", "!=", false]]})
    );
    assert_eq!(modifiers_of("email"), serde_json::json!({"required": true}));
    assert_eq!(
        modifiers_of("create_date"),
        serde_json::json!({"readonly": true, "invisible": true})
    );
    assert!(!out.contains("attrs="));
    assert!(out.contains(r#"<label for="email"/>"#));
}

#[test]
fn record_values_resolve_conditions() {
    let loader = ConfigLoader::new(config_dir());
    let partner = ModelFields::from_yaml_file(loader.model_path("partner")).unwrap();
    let arch = std::fs::read_to_string(config_dir().join("views/partner_form.xml")).unwrap();

    let is_company = |domain: &Domain, record: &RecordContext| {
        let leaf = &domain.as_value()[0];
        match leaf[0].as_str().and_then(|f| record.get(f)) {
            Some(value) if leaf[1] == "=" => Evaluation::from(*value == leaf[2]),
            _ => Evaluation::Undetermined,
        }
    };
    let processor = ViewProcessor::new(&partner, &partner, &is_company);
    let record = RecordContext::new().with("is_company", true);
    let out = processor.process(&arch, &record).unwrap();
    assert!(out.contains(r#"<field name="parent_id" attrs="#));
    assert!(out.contains(r#"modifiers="{&quot;invisible&quot;:true}""#));
}
