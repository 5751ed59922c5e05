//! Integration tests for template compilation, model paths and configuration

use pretty_assertions::assert_eq;

use vew::model::{leaf_paths, resolve};
use vew::parser::parse;
use vew::{
    CharacterClass, CompileError, Path, PathError, SequentialIdGenerator, TemplateCompiler, Value,
    ViewConfig,
};

fn compile(source: &str, model: &mut Value) -> Result<vew::CompiledTemplate, CompileError> {
    let mut ids = SequentialIdGenerator::new();
    let config = ViewConfig::new().with_binding_id_length(6);
    TemplateCompiler::new("inst", &mut ids, &config).compile(source, model)
}

#[test]
fn test_plain_template_round_trips() {
    let source = r#"
        <article class="post">
            <h2>Title &amp; subtitle</h2>
            <p style="color: red">a = b, c = "d"</p>
            <img src="a.png" alt=''>
        </article>
    "#;
    let compiled = compile(source, &mut Value::map()).expect("Should compile");
    assert_eq!(compiled.html, source);
    assert!(compiled.attribute_bindings.is_empty());
    assert!(compiled.text_bindings.is_empty());
    assert!(compiled.event_bindings.is_empty());
    assert!(compiled.sub_templates.is_empty());
}

#[test]
fn test_binding_metadata() {
    let mut model = Value::map()
        .with("user", Value::map().with("id", 7i64).with("name", "Ada"))
        .with("tab", "posts");
    let compiled = compile(
        r#"<a href="/users/{{user.id}}?tab={{ tab }}" @click="open">{{user.name}}</a>"#,
        &mut model,
    )
    .expect("Should compile");

    assert_eq!(compiled.attribute_bindings.len(), 2);
    for binding in &compiled.attribute_bindings {
        assert_eq!(binding.name, "href");
        assert_eq!(binding.value, "/users/{{user.id}}?tab={{ tab }}");
        assert!(binding.id.bytes().all(|b| b.is_ascii_lowercase()));
        assert_eq!(binding.interpolation.render(&model), "/users/7?tab=posts");
    }
    assert_eq!(compiled.text_bindings.len(), 1);
    assert_eq!(compiled.text_bindings[0].path, Path::parse("user.name").unwrap());
    assert_eq!(compiled.event_bindings.len(), 1);
    assert_eq!(compiled.event_bindings[0].name, "click");

    let ids = [
        compiled.attribute_bindings[0].id.as_str(),
        compiled.attribute_bindings[1].id.as_str(),
        compiled.event_bindings[0].id.as_str(),
    ];
    assert_eq!(ids, ["aaaaaa", "aaaaab", "aaaaac"]);
    assert_eq!(
        compiled.html,
        r#"<a href="/users/7?tab=posts" data-href-aaaaaa data-href-aaaaab @click="open" data-event-click-aaaaac><!--inst | user.name-->Ada</a>"#
    );
}

#[test]
fn test_deeply_nested_templates_stay_opaque() {
    let source = r#"<ul><template id="row"><li>{{a}}<template id="cell"><i @click="x">{{b}}</i></template></li></template></ul>"#;
    let compiled = compile(source, &mut Value::map()).expect("Should compile");
    assert_eq!(compiled.sub_templates.len(), 1);
    assert!(compiled.text_bindings.is_empty());
    assert!(compiled.event_bindings.is_empty());
    assert_eq!(
        compiled.html,
        r#"<ul><template id="instrow"><li>{{a}}<template id="cell"><i @click="x">{{b}}</i></template></li></template></ul>"#
    );
}

#[test]
fn test_prefixed_template_id_not_prefixed_again() {
    let source = r#"<template id="instrow"></template>"#;
    let compiled = compile(source, &mut Value::map()).expect("Should compile");
    assert_eq!(compiled.html, source);
}

#[test]
fn test_parse_errors_have_spans() {
    let source = "<p>{{ name </p>";
    let errors = parse(source).unwrap_err();
    assert!(!errors.is_empty());
    let span = errors[0].span();
    assert!(span.start <= source.len());

    let err = compile("<template id=\"a\"><p>", &mut Value::map()).unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
    let err = compile("<p></template>", &mut Value::map()).unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
}

#[test]
fn test_invalid_paths() {
    assert!(matches!(Path::parse(""), Err(PathError::InvalidPath { .. })));
    assert!(matches!(Path::parse("a..b"), Err(PathError::InvalidPath { .. })));
    assert!(matches!(
        compile("<b @click=\"\">x</b>", &mut Value::map()),
        Err(CompileError::Path(PathError::InvalidPath { .. }))
    ));
    assert!(matches!(
        compile("<p>{{a|b}}</p>", &mut Value::map()),
        Err(CompileError::Path(PathError::InvalidPath { .. }))
    ));
    assert!(matches!(
        compile(r#"<p title="{{ x>y }}"></p>"#, &mut Value::map()),
        Err(CompileError::Path(PathError::InvalidPath { .. }))
    ));
}

#[test]
fn test_resolve_tolerates_missing_intermediates() {
    let model = Value::map().with("a", Value::map().with("b", 1i64));
    assert_eq!(
        resolve(&model, &Path::parse("a.b").unwrap()).unwrap(),
        Some(&Value::from(1i64))
    );
    assert_eq!(resolve(&model, &Path::parse("a.x.y").unwrap()).unwrap(), None);
    assert_eq!(resolve(&model, &Path::parse("z").unwrap()).unwrap(), None);
}

#[test]
fn test_leaf_paths_from_json_model() {
    let json: serde_json::Value = serde_json::from_str(
        r#"{"user": {"name": "Ada", "tags": ["x", "y"], "meta": {}}, "count": 2}"#,
    )
    .unwrap();
    let model = Value::from(json);
    let paths: Vec<String> = leaf_paths(&model).collect();
    assert_eq!(
        paths,
        vec!["user.name", "user.tags.0", "user.tags.1", "count"]
    );
}

#[test]
fn test_config_from_toml_drives_identifiers() {
    let config = ViewConfig::from_toml(
        r#"
        [identifiers]
        instance_length = 3
        binding_length = 2
        binding_charset = "digits"
        "#,
    )
    .expect("Should load");
    assert_eq!(config.instance_id_length, 3);
    assert_eq!(config.binding_charset, CharacterClass::Digits);

    let mut ids = SequentialIdGenerator::new();
    let compiled = TemplateCompiler::new("v", &mut ids, &config)
        .compile(r#"<b class="{{c}}"></b>"#, &mut Value::map())
        .unwrap();
    assert_eq!(compiled.attribute_bindings[0].id, "00");
}

#[test]
fn test_config_rejects_uppercase_binding_ids() {
    let result = ViewConfig::from_toml(
        r#"
        [identifiers]
        binding_charset = "upper"
        "#,
    );
    assert!(result.is_err());
}
