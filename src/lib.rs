//! vew - a minimal view-binding engine
//!
//! Templates are HTML with `{{path}}` placeholders in text and attribute
//! values, `@event="path"` handlers, and nested `<template>` blocks. A
//! [`ViewInstance`] compiles a template once, mounts it into a host
//! [`Document`](dom::Document) between marker comments, and on each
//! update rewrites only the bound attributes and text nodes.
//!
//! # Example
//!
//! ```rust
//! use vew::{render, Value};
//!
//! let mut model = Value::map().with("name", "Ada");
//! let html = render(
//!     r#"<main><template id="hello"><p>Hi {{name}}</p></template></main>"#,
//!     "hello",
//!     &mut model,
//! ).unwrap();
//! assert!(html.contains("Hi "));
//! assert!(html.contains("-->Ada</p>"));
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod ident;
pub mod model;
pub mod parser;
pub mod template;
pub mod view;

pub use config::{ConfigError, ViewConfig};
pub use error::ParseError;
pub use ident::{CharacterClass, IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use model::{Callback, Path, PathError, Value};
pub use template::{CompileError, CompiledTemplate, TemplateCompiler};
pub use view::{MissingBindingTarget, Phase, UpdateSummary, ViewError, ViewInstance, Views};

use thiserror::Error;

use dom::{DomError, MemoryDocument};

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// The host document could not be parsed
    #[error("document error: {0}")]
    Document(#[from] DomError),

    /// Mounting the template failed
    #[error("view error: {0}")]
    View(#[from] ViewError),
}

/// Mount one template of an HTML document and return the resulting markup
///
/// Uses the default configuration and random identifiers.
pub fn render(document: &str, template_id: &str, model: &mut Value) -> Result<String, RenderError> {
    render_with_views(document, template_id, model, &Views::default())
}

/// Like [`render`], creating the view through `views`
///
/// # Example
///
/// ```rust
/// use vew::{render_with_views, SequentialIdGenerator, Value, ViewConfig, Views};
///
/// let config = ViewConfig::new().with_instance_id_length(2);
/// let views = Views::with_generator(config, SequentialIdGenerator::new());
/// let mut model = Value::map().with("name", "Ada");
///
/// let html = render_with_views(
///     r#"<template id="t"><b>{{name}}</b></template>"#,
///     "t",
///     &mut model,
///     &views,
/// ).unwrap();
/// assert!(html.starts_with("<!--START | aa--><b><!--aa | name-->Ada</b><!--END | aa-->"));
/// ```
pub fn render_with_views(
    document: &str,
    template_id: &str,
    model: &mut Value,
    views: &Views,
) -> Result<String, RenderError> {
    let mut doc = MemoryDocument::parse(document)?;
    let mut view = views.view(&doc, template_id)?;
    view.create(&mut doc, model)?;
    Ok(doc.to_html())
}
