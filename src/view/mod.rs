//! View instances
//!
//! A [`ViewInstance`] ties one `<template>` declaration to a model. It
//! compiles the template on first [`create`](ViewInstance::create),
//! inserts the result next to the declaration between wrapping markers,
//! and afterwards only rewrites bound attributes and text on
//! [`update`](ViewInstance::update).
//!
//! # Example
//!
//! ```rust
//! use vew::dom::MemoryDocument;
//! use vew::{Value, Views};
//!
//! let mut doc = MemoryDocument::parse(
//!     r#"<template id="greeting"><p>Hello {{user.name}}</p></template>"#,
//! ).unwrap();
//! let mut model = Value::map().with("user", Value::map().with("name", "Ada"));
//!
//! let mut view = Views::default().view(&doc, "greeting").unwrap();
//! view.create(&mut doc, &mut model).unwrap();
//! assert!(doc.to_html().contains("Ada"));
//!
//! model.insert("user", Value::map().with("name", "Grace"));
//! view.update(&mut doc, &model);
//! assert!(doc.to_html().contains("Grace"));
//! ```

mod error;
mod live;

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ViewConfig;
use crate::dom::{Document, DomError};
use crate::ident::{IdGenerator, RandomIdGenerator, SharedIdGenerator};
use crate::model::{self, Callback, Value};
use crate::template::{
    self, markers, AttributeBinding, CompiledTemplate, EventBinding, TemplateCompiler,
};

pub use error::{MissingBindingTarget, ViewError};
use live::LiveBindings;

/// Lifecycle state of a view instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed; the template has not been compiled yet
    Uncompiled,
    /// Compiled but not present in the document
    Compiled,
    /// Present in the document between its wrapping markers
    Mounted,
}

/// What an [`update`](ViewInstance::update) call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Attributes whose value changed
    pub attributes_written: usize,
    /// Text nodes whose content changed
    pub texts_written: usize,
    /// Bindings whose target was not found; they are retried next time
    pub missing: Vec<MissingBindingTarget>,
}

impl UpdateSummary {
    /// Whether every binding found its target
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn writes(&self) -> usize {
        self.attributes_written + self.texts_written
    }
}

/// Creates view instances sharing one identifier generator and config
pub struct Views {
    ids: SharedIdGenerator,
    config: ViewConfig,
}

impl Default for Views {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl Views {
    /// Views with randomly generated identifiers
    pub fn new(config: ViewConfig) -> Self {
        Self::with_generator(config, RandomIdGenerator::new())
    }

    pub fn with_generator(config: ViewConfig, ids: impl IdGenerator + 'static) -> Self {
        Self {
            ids: Rc::new(RefCell::new(ids)),
            config,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Create a view for the `<template>` element with id `template_id`
    pub fn view<D: Document>(
        &self,
        doc: &D,
        template_id: &str,
    ) -> Result<ViewInstance<D>, ViewError> {
        ViewInstance::new(doc, template_id, self.ids.clone(), self.config.clone())
    }
}

/// One instantiation of a template
pub struct ViewInstance<D: Document> {
    id: String,
    template_id: String,
    source: String,
    phase: Phase,
    compiled: Option<CompiledTemplate>,
    live: LiveBindings<D::Node>,
    mounts: usize,
    ids: SharedIdGenerator,
    config: ViewConfig,
}

impl<D: Document> ViewInstance<D> {
    /// Capture the template's content and generate the instance id
    ///
    /// Fails with [`ViewError::Config`] when `config` does not validate.
    pub fn new(
        doc: &D,
        template_id: &str,
        ids: SharedIdGenerator,
        config: ViewConfig,
    ) -> Result<Self, ViewError> {
        Self::with_prefix(doc, template_id, "", ids, config)
    }

    fn with_prefix(
        doc: &D,
        template_id: &str,
        prefix: &str,
        ids: SharedIdGenerator,
        config: ViewConfig,
    ) -> Result<Self, ViewError> {
        config.validate()?;
        let source = doc
            .element_by_id(template_id)
            .and_then(|node| doc.template_content(node))
            .ok_or_else(|| ViewError::TemplateNotFound {
                id: template_id.to_string(),
            })?;
        let id = ids.borrow_mut().generate(
            config.instance_id_length,
            prefix,
            "",
            config.instance_charset,
        );
        tracing::debug!(instance = %id, template = %template_id, "created view instance");

        Ok(Self {
            id,
            template_id: template_id.to_string(),
            source,
            phase: Phase::Uncompiled,
            compiled: None,
            live: LiveBindings::default(),
            mounts: 0,
            ids,
            config,
        })
    }

    /// The generated instance identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// The template markup as captured at construction
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn compiled(&self) -> Option<&CompiledTemplate> {
        self.compiled.as_ref()
    }

    pub fn attribute_bindings(&self) -> &[AttributeBinding] {
        self.compiled
            .as_ref()
            .map(|c| c.attribute_bindings.as_slice())
            .unwrap_or_default()
    }

    pub fn event_bindings(&self) -> &[EventBinding] {
        self.compiled
            .as_ref()
            .map(|c| c.event_bindings.as_slice())
            .unwrap_or_default()
    }

    /// Whether this instance's wrapping markers are in the document
    pub fn is_mounted(&self, doc: &D) -> bool {
        markers::is_mounted(doc, &self.id)
    }

    /// Compile on first use and mount into the document
    ///
    /// Calling this on an instance that is already mounted only runs
    /// [`update`](Self::update). Event handlers are resolved before the
    /// document is touched; a handler path that is not a function fails
    /// with [`ViewError::UnresolvedEventTarget`].
    pub fn create(&mut self, doc: &mut D, model: &mut Value) -> Result<(), ViewError> {
        if self.compiled.is_none() {
            let compiled = self.compile(model)?;
            self.compiled = Some(compiled);
            self.phase = Phase::Compiled;
        }

        if markers::is_mounted(doc, &self.id) {
            tracing::debug!(instance = %self.id, "already mounted, updating instead");
            self.phase = Phase::Mounted;
            self.update(doc, model);
            return Ok(());
        }

        let Some(compiled) = &self.compiled else {
            return Ok(());
        };

        let callbacks = compiled
            .event_bindings
            .iter()
            .map(|binding| resolve_callback(model, binding))
            .collect::<Result<Vec<_>, _>>()?;

        let declaration =
            doc.element_by_id(&self.template_id)
                .ok_or_else(|| ViewError::TemplateNotFound {
                    id: self.template_id.clone(),
                })?;
        let markup = format!(
            "{}{}",
            markers::wrap(&self.id, &compiled.html),
            doc.outer_html(declaration)
        );
        let inserted = doc.replace_with_markup(declaration, &markup)?;

        let start = match inserted.first() {
            Some(&node) if doc.is_comment(node) => node,
            _ => markers::find_start(doc, &self.id).ok_or_else(|| {
                ViewError::Dom(DomError::markup("wrapping markers were not inserted"))
            })?,
        };
        let attached = attach(doc, start, &self.id, compiled);
        let (live, targets) = match attached {
            Ok(attached) => attached,
            Err(err) => {
                // Take the half-mounted region out again; the declaration
                // after it stays
                for node in markers::region(doc, start, &self.id) {
                    doc.remove(node);
                }
                tracing::debug!(instance = %self.id, error = %err, "mount rolled back");
                return Err(err);
            }
        };
        self.live = live;

        for ((binding, callback), node) in compiled.event_bindings.iter().zip(callbacks).zip(targets)
        {
            doc.add_event_listener(node, &binding.name, callback);
        }

        self.phase = Phase::Mounted;
        self.mounts += 1;
        tracing::debug!(
            instance = %self.id,
            template = %self.template_id,
            mounts = self.mounts,
            "mounted view"
        );

        // The compiled markup carries the values from compile time
        if self.mounts > 1 {
            self.update(doc, model);
        }
        Ok(())
    }

    /// Push current model values into the bound attributes and text nodes
    ///
    /// Attributes are refreshed before text. Targets that are gone are
    /// skipped and reported; an instance that is not in the document is
    /// left alone.
    pub fn update(&mut self, doc: &mut D, model: &Value) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        let Some(compiled) = &self.compiled else {
            return summary;
        };
        let Some(start) = markers::find_start(doc, &self.id) else {
            tracing::trace!(instance = %self.id, "update skipped, not mounted");
            return summary;
        };

        for (index, binding) in compiled.attribute_bindings.iter().enumerate() {
            let marker = markers::attribute_marker(&binding.name, &binding.id);
            let Some(node) = self
                .live
                .attribute_target(doc, start, &self.id, index, &marker)
            else {
                let missing = MissingBindingTarget::Attribute {
                    name: binding.name.clone(),
                    id: binding.id.clone(),
                };
                tracing::debug!(instance = %self.id, %missing, "skipping binding");
                summary.missing.push(missing);
                continue;
            };
            let value = binding.interpolation.render(model);
            if doc.attribute(node, &binding.name).as_deref() != Some(value.as_str()) {
                doc.set_attribute(node, &binding.name, &value);
                summary.attributes_written += 1;
            }
        }

        let targets = self
            .live
            .text_targets(doc, start, &self.id, &compiled.text_bindings);
        for (binding, target) in compiled.text_bindings.iter().zip(targets) {
            let Some(node) = target else {
                let missing = MissingBindingTarget::Text {
                    path: binding.path.to_string(),
                };
                tracing::debug!(instance = %self.id, %missing, "skipping binding");
                summary.missing.push(missing);
                continue;
            };
            let value = template::render_path(model, &binding.path);
            if doc.text_content(node) != value {
                doc.set_text_content(node, &value);
                summary.texts_written += 1;
            }
        }

        tracing::trace!(
            instance = %self.id,
            writes = summary.writes(),
            missing = summary.missing.len(),
            "updated view"
        );
        summary
    }

    /// Remove everything between and including the wrapping markers
    pub fn delete(&mut self, doc: &mut D) {
        self.live.clear();
        let Some(start) = markers::find_start(doc, &self.id) else {
            tracing::trace!(instance = %self.id, "delete skipped, not mounted");
            return;
        };
        let region = markers::region(doc, start, &self.id);
        let removed = region.len();
        for node in region {
            doc.remove(node);
        }
        if self.phase == Phase::Mounted {
            self.phase = Phase::Compiled;
        }
        tracing::debug!(instance = %self.id, removed, "deleted view");
    }

    /// Create the view for a nested `<template>` of this instance
    ///
    /// `declared_id` is the id as written in this template; the child's
    /// instance id starts with this instance's id.
    pub fn child(&self, doc: &D, declared_id: &str) -> Result<ViewInstance<D>, ViewError> {
        let template_id = template::namespace(&self.id, declared_id);
        ViewInstance::with_prefix(
            doc,
            &template_id,
            &self.id,
            self.ids.clone(),
            self.config.clone(),
        )
    }

    fn compile(&self, model: &mut Value) -> Result<CompiledTemplate, ViewError> {
        let mut ids = self.ids.borrow_mut();
        let compiled =
            TemplateCompiler::new(&self.id, &mut *ids, &self.config).compile(&self.source, model)?;
        Ok(compiled)
    }
}

/// Locate every binding target of a freshly inserted region
///
/// Event targets are returned in binding order. Nothing is registered
/// here, so a failure leaves no listener behind.
fn attach<D: Document>(
    doc: &mut D,
    start: D::Node,
    instance_id: &str,
    compiled: &CompiledTemplate,
) -> Result<(LiveBindings<D::Node>, Vec<D::Node>), ViewError> {
    let live = LiveBindings::mount(doc, start, instance_id, compiled)?;
    let targets = compiled
        .event_bindings
        .iter()
        .map(|binding| {
            let marker = markers::event_marker(&binding.name, &binding.id);
            markers::find_marked(doc, start, instance_id, &marker).ok_or_else(|| {
                ViewError::MissingEventTarget {
                    event: binding.name.clone(),
                    id: binding.id.clone(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((live, targets))
}

/// Resolve an event handler path to the function it names right now
fn resolve_callback(model: &mut Value, binding: &EventBinding) -> Result<Callback, ViewError> {
    model::ensure(model, &binding.path)?
        .and_then(Value::as_callback)
        .cloned()
        .ok_or_else(|| ViewError::UnresolvedEventTarget {
            event: binding.name.clone(),
            path: binding.path.to_string(),
        })
}
