use thiserror::Error;

use crate::config::ConfigError;
use crate::dom::DomError;
use crate::model::PathError;
use crate::template::CompileError;

/// Errors that can occur during the view lifecycle
#[derive(Debug, Error)]
pub enum ViewError {
    /// No `<template>` element with this id is attached to the document
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    /// An event binding's marker element is missing right after mounting
    #[error("no element carries the marker for {event} binding {id}")]
    MissingEventTarget { event: String, id: String },

    /// An event handler path does not resolve to a function
    #[error("{event} handler {path} does not resolve to a function")]
    UnresolvedEventTarget { event: String, path: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// A bound node that could not be found during an update
///
/// Not fatal: the binding is skipped and retried on the next update.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MissingBindingTarget {
    #[error("no element carries data-{name}-{id}")]
    Attribute { name: String, id: String },

    #[error("no text marker for {path}")]
    Text { path: String },
}
