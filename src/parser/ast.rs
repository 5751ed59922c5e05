//! Syntax tree for template markup
//!
//! The tree is deliberately flat: the engine only needs to know where
//! bindings and nested templates are. Everything else is kept as source
//! spans and copied through verbatim by the compiler.

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A node with its source span
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

/// A parsed template fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub nodes: Vec<Spanned<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Markup copied through unchanged
    Text,
    /// The `>` closing a start tag
    TagEnd,
    /// `{{ expr }}` outside an attribute value; holds the inner expression
    Placeholder(Spanned<String>),
    /// `name="value"`
    Attribute(Attribute),
    /// `@event="path"`
    Event(EventAttribute),
    /// `<template ...> ... </template>`, nested to any depth
    Template(TemplateBlock),
}

/// Part of an attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Placeholder(Spanned<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Spanned<String>,
    /// Value segments; the span covers the text between the quotes
    pub value: Spanned<Vec<Segment>>,
}

impl Attribute {
    pub fn has_placeholders(&self) -> bool {
        self.value
            .node
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }

    /// The value when it contains no placeholders
    pub fn literal_value(&self) -> Option<String> {
        self.value
            .node
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Placeholder(_) => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventAttribute {
    pub name: Spanned<String>,
    pub handler: Spanned<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBlock {
    /// The literal `id` attribute of the opening tag; the span covers the
    /// value between the quotes
    pub id: Option<Spanned<String>>,
    pub body: Vec<Spanned<Node>>,
}

impl TemplateBlock {
    pub fn new(body: Vec<Spanned<Node>>) -> Self {
        let id = body
            .iter()
            .take_while(|n| !matches!(n.node, Node::TagEnd))
            .find_map(|n| match &n.node {
                Node::Attribute(attr) if attr.name.node == "id" => attr
                    .literal_value()
                    .map(|value| Spanned::new(value, attr.value.span.clone())),
                _ => None,
            });
        Self { id, body }
    }
}
