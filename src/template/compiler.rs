//! Template compilation
//!
//! Compilation turns raw template markup into markup that can be inserted
//! into a host document, plus the binding metadata needed to update it
//! later. It runs over the parsed node list in fixed passes:
//!
//! 1. nested `<template>` blocks are emitted whole, with their `id`
//!    namespaced under the instance id
//! 2. attributes whose value holds placeholders get marker attributes and
//!    their initial value
//! 3. text placeholders become a marker comment plus the initial value
//! 4. event attributes get marker attributes
//!
//! Everything else is copied from the source byte for byte.

use crate::config::ViewConfig;
use crate::dom::markup;
use crate::ident::IdGenerator;
use crate::model::{self, Path, Value};
use crate::parser::{self, Attribute, EventAttribute, Node, Span, Spanned, TemplateBlock};

use super::binding::{
    AttributeBinding, CompiledTemplate, EventBinding, Interpolation, SubTemplate, TextBinding,
};
use super::markers;
use super::CompileError;

/// Compiles templates for one view instance
pub struct TemplateCompiler<'a> {
    instance_id: &'a str,
    ids: &'a mut dyn IdGenerator,
    config: &'a ViewConfig,
}

impl<'a> TemplateCompiler<'a> {
    pub fn new(instance_id: &'a str, ids: &'a mut dyn IdGenerator, config: &'a ViewConfig) -> Self {
        Self {
            instance_id,
            ids,
            config,
        }
    }

    /// Compile `source` against the current model
    ///
    /// Paths read for initial values are materialized in `model` so that
    /// later writes to them land in existing maps.
    pub fn compile(
        &mut self,
        source: &str,
        model: &mut Value,
    ) -> Result<CompiledTemplate, CompileError> {
        let fragment = parser::parse(source).map_err(CompileError::Parse)?;
        let nodes = &fragment.nodes;
        let mut compiled = CompiledTemplate::default();
        let mut rendered: Vec<Option<String>> = vec![None; nodes.len()];

        for (index, node) in nodes.iter().enumerate() {
            if let Node::Template(block) = &node.node {
                let sub = self.sub_template(source, &node.span, block);
                rendered[index] = Some(sub.markup.clone());
                compiled.sub_templates.push(sub);
            }
        }

        for (index, node) in nodes.iter().enumerate() {
            if let Node::Attribute(attr) = &node.node {
                if attr.has_placeholders() {
                    let (html, mut bindings) = self.attribute(source, attr, model)?;
                    rendered[index] = Some(html);
                    compiled.attribute_bindings.append(&mut bindings);
                }
            }
        }

        for (index, node) in nodes.iter().enumerate() {
            if let Node::Placeholder(expr) = &node.node {
                let (html, binding) = self.text(expr, model)?;
                rendered[index] = Some(html);
                compiled.text_bindings.push(binding);
            }
        }

        for (index, node) in nodes.iter().enumerate() {
            if let Node::Event(event) = &node.node {
                let (html, binding) = self.event(source, &node.span, event)?;
                rendered[index] = Some(html);
                compiled.event_bindings.push(binding);
            }
        }

        let mut html = String::with_capacity(source.len());
        for (node, out) in nodes.iter().zip(rendered) {
            match out {
                Some(out) => html.push_str(&out),
                None => html.push_str(slice(source, &node.span)),
            }
        }
        compiled.html = html;

        tracing::debug!(
            instance = %self.instance_id,
            attributes = compiled.attribute_bindings.len(),
            texts = compiled.text_bindings.len(),
            events = compiled.event_bindings.len(),
            sub_templates = compiled.sub_templates.len(),
            "compiled template"
        );
        Ok(compiled)
    }

    fn binding_id(&mut self) -> String {
        self.ids.generate(
            self.config.binding_id_length,
            "",
            "",
            self.config.binding_charset,
        )
    }

    fn sub_template(&self, source: &str, span: &Span, block: &TemplateBlock) -> SubTemplate {
        let Some(id) = &block.id else {
            return SubTemplate {
                declared_id: None,
                namespaced_id: None,
                markup: slice(source, span).to_string(),
            };
        };

        let namespaced = namespace(self.instance_id, &id.node);
        let markup = format!(
            "{}{}{}",
            slice(source, &(span.start..id.span.start)),
            markup::escape_attribute(&namespaced),
            slice(source, &(id.span.end..span.end)),
        );
        SubTemplate {
            declared_id: Some(id.node.clone()),
            namespaced_id: Some(namespaced),
            markup,
        }
    }

    fn attribute(
        &mut self,
        source: &str,
        attr: &Attribute,
        model: &mut Value,
    ) -> Result<(String, Vec<AttributeBinding>), CompileError> {
        let interpolation = Interpolation::from_segments(&attr.value.node)?;
        let name = slice(source, &attr.name.span);
        let raw = slice(source, &attr.value.span);
        let initial = interpolation.render_ensuring(model)?;

        let mut html = format!("{}=\"{}\"", name, markup::escape_attribute(&initial));
        let mut bindings = Vec::new();
        for _ in interpolation.paths() {
            let id = self.binding_id();
            html.push(' ');
            html.push_str(&markers::attribute_marker(name, &id));
            bindings.push(AttributeBinding {
                id,
                name: name.to_string(),
                value: raw.to_string(),
                interpolation: interpolation.clone(),
            });
        }
        Ok((html, bindings))
    }

    fn text(
        &self,
        expr: &Spanned<String>,
        model: &mut Value,
    ) -> Result<(String, TextBinding), CompileError> {
        let path = Path::parse(&expr.node)?;
        let initial = model::ensure(model, &path)?
            .map(Value::render)
            .unwrap_or_default();
        let html = format!(
            "{}{}",
            markers::text_comment(self.instance_id, &path),
            markup::escape_text(&initial)
        );
        Ok((html, TextBinding { path, initial }))
    }

    fn event(
        &mut self,
        source: &str,
        span: &Span,
        event: &EventAttribute,
    ) -> Result<(String, EventBinding), CompileError> {
        let path = Path::parse(&event.handler.node)?;
        let id = self.binding_id();
        let html = format!(
            "{} {}",
            slice(source, span),
            markers::event_marker(&event.name.node, &id)
        );
        Ok((
            html,
            EventBinding {
                id,
                name: event.name.node.clone(),
                path,
            },
        ))
    }
}

/// Prefix a nested template id with the instance id, once
pub fn namespace(instance_id: &str, declared: &str) -> String {
    if declared.contains(instance_id) {
        declared.to_string()
    } else {
        format!("{}{}", instance_id, declared)
    }
}

fn slice<'s>(source: &'s str, span: &Span) -> &'s str {
    source.get(span.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{CharacterClass, SequentialIdGenerator};
    use crate::model::PathError;
    use pretty_assertions::assert_eq;

    fn config() -> ViewConfig {
        ViewConfig::new()
            .with_binding_id_length(4)
            .with_binding_charset(CharacterClass::Lower)
    }

    fn compile(source: &str, model: &mut Value) -> Result<CompiledTemplate, CompileError> {
        let mut ids = SequentialIdGenerator::new();
        let config = config();
        TemplateCompiler::new("v1", &mut ids, &config).compile(source, model)
    }

    #[test]
    fn test_no_placeholders_is_byte_identical() {
        let source = "<div class=\"card\">\n  <p title='x'>Plain &amp; simple</p>\n</div>";
        let compiled = compile(source, &mut Value::map()).unwrap();
        assert_eq!(compiled.html, source);
        assert!(compiled.attribute_bindings.is_empty());
        assert!(compiled.text_bindings.is_empty());
        assert!(compiled.event_bindings.is_empty());
    }

    #[test]
    fn test_text_placeholder() {
        let mut model = Value::map().with("user", Value::map().with("name", "Ada"));
        let compiled = compile("<p>Hi {{ user.name }}!</p>", &mut model).unwrap();
        assert_eq!(compiled.html, "<p>Hi <!--v1 | user.name-->Ada!</p>");
        assert_eq!(compiled.text_bindings.len(), 1);
        assert_eq!(compiled.text_bindings[0].initial, "Ada");
    }

    #[test]
    fn test_text_value_escaped() {
        let mut model = Value::map().with("x", "<b>&");
        let compiled = compile("<p>{{x}}</p>", &mut model).unwrap();
        assert_eq!(compiled.html, "<p><!--v1 | x-->&lt;b&gt;&amp;</p>");
    }

    #[test]
    fn test_attribute_binding_per_placeholder() {
        let mut model = Value::map().with("a", "one").with("b", "two");
        let compiled = compile(r#"<span class="{{a}} x {{b}}"></span>"#, &mut model).unwrap();
        assert_eq!(
            compiled.html,
            r#"<span class="one x two" data-class-aaaa data-class-aaab></span>"#
        );
        let ids: Vec<&str> = compiled
            .attribute_bindings
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["aaaa", "aaab"]);
        assert!(compiled
            .attribute_bindings
            .iter()
            .all(|b| b.name == "class" && b.value == "{{a}} x {{b}}"));
        // Attribute placeholders are not text bindings
        assert!(compiled.text_bindings.is_empty());
    }

    #[test]
    fn test_missing_path_renders_empty_and_materializes() {
        let mut model = Value::map();
        let compiled = compile(r#"<i title="{{user.profile.age}}">{{user.name}}</i>"#, &mut model)
            .unwrap();
        assert_eq!(
            compiled.html,
            r#"<i title="" data-title-aaaa><!--v1 | user.name--></i>"#
        );
        let user = model.get("user").unwrap();
        assert_eq!(user.get("profile"), Some(&Value::map()));
    }

    #[test]
    fn test_event_binding() {
        let compiled = compile(
            r#"<button @click="actions.save">Save</button>"#,
            &mut Value::map(),
        )
        .unwrap();
        assert_eq!(
            compiled.html,
            r#"<button @click="actions.save" data-event-click-aaaa>Save</button>"#
        );
        assert_eq!(compiled.event_bindings.len(), 1);
        assert_eq!(compiled.event_bindings[0].name, "click");
        assert_eq!(
            compiled.event_bindings[0].path,
            Path::parse("actions.save").unwrap()
        );
    }

    #[test]
    fn test_nested_template_is_opaque_and_namespaced() {
        let mut model = Value::map().with("title", "T");
        let source =
            r#"<h1>{{title}}</h1><template id="row"><li class="{{x}}">{{y}}</li></template>"#;
        let compiled = compile(source, &mut model).unwrap();
        assert_eq!(
            compiled.html,
            r#"<h1><!--v1 | title-->T</h1><template id="v1row"><li class="{{x}}">{{y}}</li></template>"#
        );
        assert_eq!(compiled.text_bindings.len(), 1);
        assert!(compiled.attribute_bindings.is_empty());
        assert_eq!(compiled.sub_templates.len(), 1);
        assert_eq!(compiled.sub_templates[0].declared_id.as_deref(), Some("row"));
        assert_eq!(compiled.sub_templates[0].namespaced_id.as_deref(), Some("v1row"));
        // The inner model paths were never touched
        assert!(model.get("x").is_none());
    }

    #[test]
    fn test_comments_are_opaque() {
        let mut model = Value::map().with("name", "Ada");
        let source = r#"<p>{{name}}</p><!-- old: {{name}} <b class="{{c}}" @click="go"> -->"#;
        let compiled = compile(source, &mut model).unwrap();
        assert_eq!(
            compiled.html,
            r#"<p><!--v1 | name-->Ada</p><!-- old: {{name}} <b class="{{c}}" @click="go"> -->"#
        );
        assert_eq!(compiled.text_bindings.len(), 1);
        assert!(compiled.attribute_bindings.is_empty());
        assert!(compiled.event_bindings.is_empty());
        assert!(model.get("c").is_none());
    }

    #[test]
    fn test_marker_attribute_names_lowercased() {
        let mut model = Value::map().with("x", "v");
        let compiled = compile(
            r#"<i aria-Label="{{x}}" @dblClick="go"></i>"#,
            &mut model,
        )
        .unwrap();
        assert_eq!(
            compiled.html,
            r#"<i aria-Label="v" data-aria-label-aaaa @dblClick="go" data-event-dblclick-aaab></i>"#
        );
        assert_eq!(compiled.attribute_bindings[0].name, "aria-Label");
    }

    #[test]
    fn test_reserved_path_character_is_invalid_path() {
        let err = compile("<p>{{a|b}}</p>", &mut Value::map()).unwrap_err();
        assert!(matches!(err, CompileError::Path(PathError::InvalidPath { .. })));
    }

    #[test]
    fn test_namespace_not_doubled() {
        assert_eq!(namespace("v1", "row"), "v1row");
        assert_eq!(namespace("v1", "v1row"), "v1row");
    }

    #[test]
    fn test_empty_placeholder_is_invalid_path() {
        let err = compile("<p>{{ }}</p>", &mut Value::map()).unwrap_err();
        assert!(matches!(err, CompileError::Path(PathError::InvalidPath { .. })));
    }

    #[test]
    fn test_unbalanced_braces_is_parse_error() {
        let err = compile("<p>{{ name</p>", &mut Value::map()).unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn test_compiled_snapshot() {
        let mut model = Value::map()
            .with("user", Value::map().with("name", "Ada").with("role", "admin"));
        let compiled = compile(
            r#"<div class="user {{user.role}}"><b>{{user.name}}</b><a @click="go">go</a></div>"#,
            &mut model,
        )
        .unwrap();
        insta::assert_snapshot!(compiled.html, @r#"<div class="user admin" data-class-aaaa><b><!--v1 | user.name-->Ada</b><a @click="go" data-event-click-aaab>go</a></div>"#);
    }
}
