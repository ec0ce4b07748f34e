use super::*;

#[test]
fn test_defaults() {
    let config = InferConfig::default();
    assert_eq!(config.literal_widening, LiteralWidening::WhenMerging);
    assert_eq!(config.override_tag, "scry-return");
    assert_eq!(config.max_call_depth, 64);
    assert!(config.infer_thrown_from_calls);
}

#[test]
fn test_empty_object_uses_defaults() {
    let config = InferConfig::from_json("{}").expect("valid config");
    assert_eq!(config, InferConfig::default());
}

#[test]
fn test_camel_case_fields() {
    let config = InferConfig::from_json(
        r#"{
            "literalWidening": "always",
            "overrideTag": "@acme-return",
            "maxCallDepth": 8,
            "inferThrownFromCalls": "off"
        }"#,
    )
    .expect("valid config");
    assert_eq!(config.literal_widening, LiteralWidening::Always);
    assert_eq!(config.override_tag, "acme-return");
    assert_eq!(config.max_call_depth, 8);
    assert!(!config.infer_thrown_from_calls);
}

#[test]
fn test_invalid_values_are_reported() {
    let err = InferConfig::from_json(r#"{ "literalWidening": "sometimes" }"#)
        .expect_err("unknown variant");
    assert!(err.to_string().starts_with("invalid inference configuration"));

    assert!(InferConfig::from_json(r#"{ "inferThrownFromCalls": "maybe" }"#).is_err());
}

#[test]
fn test_builders() {
    let config = InferConfig::default()
        .with_literal_widening(LiteralWidening::Never)
        .with_override_tag("@custom")
        .with_max_call_depth(2);
    assert_eq!(config.literal_widening, LiteralWidening::Never);
    assert_eq!(config.override_tag, "custom");
    assert_eq!(config.max_call_depth, 2);
}
