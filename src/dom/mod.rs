//! Host document abstraction
//!
//! Views never own the document they render into. Everything they need
//! from it goes through [`Document`], so the engine can drive a browser
//! DOM binding, a server-side tree, or the in-memory [`MemoryDocument`].

use std::fmt;
use std::hash::Hash;

use thiserror::Error;

use crate::model::Callback;

pub mod markup;
mod memory;

pub use memory::{MemoryDocument, NodeId};

/// Errors reported by a host document
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomError {
    /// Markup handed to the document could not be parsed
    #[error("invalid markup: {message}")]
    Markup { message: String },

    /// The node is not attached to the document
    #[error("node is detached from the document")]
    Detached,
}

impl DomError {
    pub fn markup(message: impl Into<String>) -> Self {
        Self::Markup {
            message: message.into(),
        }
    }
}

/// Node type discrimination, enough to tell markers from content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

/// The operations a host tree must provide
pub trait Document {
    /// Cheap handle to a node
    type Node: Copy + Eq + Hash + fmt::Debug;

    fn root(&self) -> Self::Node;

    /// Find an attached element by its `id` attribute
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Serialized copy of a `<template>` element's content
    fn template_content(&self, template: Self::Node) -> Option<String>;

    /// Direct children; `<template>` contents are not children
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn kind(&self, node: Self::Node) -> NodeKind;

    fn outer_html(&self, node: Self::Node) -> String;

    /// Replace `node` with the nodes parsed from `markup`, returning them
    fn replace_with_markup(
        &mut self,
        node: Self::Node,
        markup: &str,
    ) -> Result<Vec<Self::Node>, DomError>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    /// Text of a text node, content of a comment, or the concatenated
    /// descendant text of an element
    fn text_content(&self, node: Self::Node) -> String;

    fn set_text_content(&mut self, node: Self::Node, text: &str);

    fn add_event_listener(&mut self, node: Self::Node, event: &str, listener: Callback);

    /// Detach a node and its subtree; listeners go with it
    fn remove(&mut self, node: Self::Node);

    /// Create a detached text node
    fn create_text(&mut self, text: &str) -> Self::Node;

    /// Insert a detached node right after `reference`
    fn insert_after(&mut self, reference: Self::Node, node: Self::Node) -> Result<(), DomError>;

    fn is_comment(&self, node: Self::Node) -> bool {
        self.kind(node) == NodeKind::Comment
    }

    fn is_element(&self, node: Self::Node) -> bool {
        self.kind(node) == NodeKind::Element
    }

    /// Whether the node is reachable from the root
    fn is_attached(&self, node: Self::Node) -> bool {
        let root = self.root();
        let mut current = Some(node);
        while let Some(n) = current {
            if n == root {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// `node` followed by each of its next siblings
    fn next_siblings(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut out = vec![node];
        let mut current = self.next_sibling(node);
        while let Some(n) = current {
            out.push(n);
            current = self.next_sibling(n);
        }
        out
    }

    /// Preorder descendants of `node`, excluding `node` itself
    fn descendants(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(node).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).into_iter().rev());
        }
        out
    }

    /// First element in document order carrying the attribute `name`
    fn query_attribute(&self, name: &str) -> Option<Self::Node> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.is_element(n) && self.attribute(n, name).is_some())
    }
}
