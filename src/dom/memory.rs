//! In-memory host document
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Ids are never
//! reused, so a handle to a removed node stays safe to hold: it simply
//! reports itself as detached.

use crate::model::Callback;

use super::markup::{self, MarkupNode};
use super::{Document, DomError, NodeKind};

/// Handle to a node of a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeData {
    /// The invisible document root
    Root,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, Callback)>,
}

/// A document tree held entirely in memory
#[derive(Debug)]
pub struct MemoryDocument {
    nodes: Vec<NodeSlot>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeSlot {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
                listeners: Vec::new(),
            }],
        }
    }

    /// Create a document from HTML markup
    pub fn parse(html: &str) -> Result<Self, DomError> {
        let mut doc = Self::new();
        let nodes = markup::parse_fragment(html)?;
        let root = doc.root();
        for node in nodes {
            let id = doc.build(node);
            doc.append_child(root, id);
        }
        Ok(doc)
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in &self.slot(self.root()).children {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Fire `event` on `node`, returning how many listeners ran
    pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
        let listeners: Vec<Callback> = self
            .slot(node)
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, cb)| cb.clone())
            .collect();
        for listener in &listeners {
            listener.call();
        }
        listeners.len()
    }

    /// Number of listeners registered on a node
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.slot(node).listeners.len()
    }

    /// Element name, for elements
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.slot(node).data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// All attached comment nodes, in document order
    pub fn comments(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&n| self.is_comment(n))
            .collect()
    }

    fn slot(&self, node: NodeId) -> &NodeSlot {
        &self.nodes[node.0]
    }

    fn slot_mut(&mut self, node: NodeId) -> &mut NodeSlot {
        &mut self.nodes[node.0]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(NodeSlot {
            data,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn is_template(&self, node: NodeId) -> bool {
        matches!(&self.slot(node).data, NodeData::Element { name, .. } if name.eq_ignore_ascii_case("template"))
    }

    /// Allocate a parsed subtree, iteratively
    fn build(&mut self, node: MarkupNode) -> NodeId {
        let mut pending: Vec<(Option<NodeId>, MarkupNode)> = vec![(None, node)];
        let mut top = None;
        while let Some((parent, node)) = pending.pop() {
            let (data, children) = match node {
                MarkupNode::Element {
                    name,
                    attributes,
                    children,
                } => (NodeData::Element { name, attributes }, children),
                MarkupNode::Text(text) => (NodeData::Text(text), Vec::new()),
                MarkupNode::Comment(text) => (NodeData::Comment(text), Vec::new()),
            };
            let id = self.alloc(data);
            match parent {
                Some(p) => self.append_child(p, id),
                None => top = Some(id),
            }
            // Reversed so children are appended in order
            for child in children.into_iter().rev() {
                pending.push((Some(id), child));
            }
        }
        // The first popped entry is the root of the subtree
        top.unwrap_or(NodeId(0))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.push(child);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.slot_mut(node).parent.take() {
            self.slot_mut(parent).children.retain(|&c| c != node);
        }
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        enum Step {
            Open(NodeId),
            Close(String),
        }
        let mut stack = vec![Step::Open(node)];
        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Close(name) => {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                    continue;
                }
                Step::Open(id) => id,
            };
            let slot = self.slot(id);
            match &slot.data {
                NodeData::Root => {}
                NodeData::Text(text) => out.push_str(&markup::escape_text(text)),
                NodeData::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                NodeData::Element { name, attributes } => {
                    out.push('<');
                    out.push_str(name);
                    for (key, value) in attributes {
                        out.push(' ');
                        out.push_str(key);
                        out.push_str("=\"");
                        out.push_str(&markup::escape_attribute(value));
                        out.push('"');
                    }
                    out.push('>');
                    if markup::is_void(name) {
                        continue;
                    }
                    stack.push(Step::Close(name.clone()));
                    for &child in slot.children.iter().rev() {
                        stack.push(Step::Open(child));
                    }
                }
            }
        }
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.attribute(n, "id").as_deref() == Some(id))
    }

    fn template_content(&self, template: NodeId) -> Option<String> {
        if !self.is_template(template) {
            return None;
        }
        let mut out = String::new();
        for &child in &self.slot(template).children {
            self.write_node(child, &mut out);
        }
        Some(out)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        if self.is_template(node) {
            return Vec::new();
        }
        self.slot(node).children.clone()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.slot(node).parent?;
        let siblings = &self.slot(parent).children;
        let pos = siblings.iter().position(|&c| c == node)?;
        siblings.get(pos + 1).copied()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).parent
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.slot(node).data {
            NodeData::Root | NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }

    fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn replace_with_markup(&mut self, node: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        let parent = self.slot(node).parent.ok_or(DomError::Detached)?;
        let parsed = markup::parse_fragment(html)?;
        let new_nodes: Vec<NodeId> = parsed.into_iter().map(|n| self.build(n)).collect();

        let siblings = &mut self.slot_mut(parent).children;
        let pos = siblings
            .iter()
            .position(|&c| c == node)
            .ok_or(DomError::Detached)?;
        siblings.splice(pos..=pos, new_nodes.iter().copied());
        for &id in &new_nodes {
            self.slot_mut(id).parent = Some(parent);
        }
        self.slot_mut(node).parent = None;
        self.slot_mut(node).listeners.clear();
        Ok(new_nodes)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.slot(node).data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.slot_mut(node).data {
            match attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        match &self.slot(node).data {
            NodeData::Text(text) | NodeData::Comment(text) => text.clone(),
            NodeData::Root | NodeData::Element { .. } => {
                let mut out = String::new();
                for n in self.descendants(node) {
                    if let NodeData::Text(text) = &self.slot(n).data {
                        out.push_str(text);
                    }
                }
                out
            }
        }
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        if let NodeData::Text(content) | NodeData::Comment(content) = &mut self.slot_mut(node).data {
            *content = text.to_string();
            return;
        }
        for child in self.slot(node).children.clone() {
            self.detach(child);
        }
        let id = self.alloc(NodeData::Text(text.to_string()));
        self.append_child(node, id);
    }

    fn add_event_listener(&mut self, node: NodeId, event: &str, listener: Callback) {
        self.slot_mut(node)
            .listeners
            .push((event.to_string(), listener));
    }

    fn remove(&mut self, node: NodeId) {
        self.detach(node);
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let slot = self.slot_mut(n);
            slot.listeners.clear();
            stack.extend(slot.children.iter().copied());
        }
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let parent = self.slot(reference).parent.ok_or(DomError::Detached)?;
        self.detach(node);
        let siblings = &mut self.slot_mut(parent).children;
        let pos = siblings
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomError::Detached)?;
        siblings.insert(pos + 1, node);
        self.slot_mut(node).parent = Some(parent);
        Ok(())
    }
}
