//! Binding metadata produced by compilation

use crate::dom::markup;
use crate::model::{self, Path, PathError, Value};
use crate::parser::Segment;

/// A piece of an attribute value: literal text or a model path
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Literal(String),
    Path(Path),
}

/// An attribute value template such as `btn btn-{{state.kind}}`
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    pieces: Vec<Piece>,
}

impl Interpolation {
    /// Build from parsed attribute segments; literals are entity-decoded
    pub fn from_segments(segments: &[Segment]) -> Result<Self, PathError> {
        let pieces = segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => Ok(Piece::Literal(markup::decode(text))),
                Segment::Placeholder(expr) => Path::parse(&expr.node).map(Piece::Path),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pieces })
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Path(path) => Some(path),
            Piece::Literal(_) => None,
        })
    }

    /// Substitute current model values; absent paths render empty
    pub fn render(&self, model: &Value) -> String {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal(text) => text.clone(),
                Piece::Path(path) => render_path(model, path),
            })
            .collect()
    }

    /// Like [`Interpolation::render`], materializing missing intermediates
    pub fn render_ensuring(&self, model: &mut Value) -> Result<String, PathError> {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Path(path) => {
                    if let Some(value) = model::ensure(model, path)? {
                        out.push_str(&value.render());
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Render the value at `path`, or "" when absent
pub fn render_path(model: &Value, path: &Path) -> String {
    match model::resolve(model, path) {
        Ok(Some(value)) => value.render(),
        Ok(None) | Err(_) => String::new(),
    }
}

/// An attribute whose value contains placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBinding {
    /// Binding identifier used in the `data-<name>-<id>` marker
    pub id: String,
    /// Attribute name as written in the template
    pub name: String,
    /// Raw templated value, e.g. `item {{state}}`
    pub value: String,
    pub interpolation: Interpolation,
}

/// A text placeholder, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct TextBinding {
    pub path: Path,
    /// Value rendered into the compiled markup
    pub initial: String,
}

/// An `@event="path"` binding
#[derive(Debug, Clone, PartialEq)]
pub struct EventBinding {
    pub id: String,
    /// Event name, e.g. `click`
    pub name: String,
    pub path: Path,
}

/// A nested `<template>` block carried through compilation untouched
#[derive(Debug, Clone, PartialEq)]
pub struct SubTemplate {
    /// The id as written, if the block declared one
    pub declared_id: Option<String>,
    /// The id after namespacing with the parent instance id
    pub namespaced_id: Option<String>,
    /// The block's markup with the namespaced id
    pub markup: String,
}

/// Output of compiling a template for one instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledTemplate {
    pub html: String,
    pub attribute_bindings: Vec<AttributeBinding>,
    pub text_bindings: Vec<TextBinding>,
    pub event_bindings: Vec<EventBinding>,
    pub sub_templates: Vec<SubTemplate>,
}
