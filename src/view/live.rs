//! Live-binding table
//!
//! Maps each binding of a mounted instance to the node it writes to, so
//! updates do not have to walk the tree. Entries are checked on every use
//! and re-located through the markers when the tree has moved under them.

use crate::dom::{Document, DomError, NodeKind};
use crate::template::{markers, CompiledTemplate, TextBinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TextSlot<N> {
    marker: N,
    value: N,
}

#[derive(Debug)]
pub(super) struct LiveBindings<N> {
    /// Indexed like `CompiledTemplate::attribute_bindings`
    attributes: Vec<Option<N>>,
    /// Indexed like `CompiledTemplate::text_bindings`
    texts: Vec<Option<TextSlot<N>>>,
}

impl<N> Default for LiveBindings<N> {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            texts: Vec::new(),
        }
    }
}

impl<N: Copy + Eq> LiveBindings<N> {
    /// Locate every binding target of a freshly inserted instance
    ///
    /// Each text marker is left followed by exactly one text node holding
    /// its initial value. Literal text the markup parser merged into that
    /// node is split off behind it.
    pub(super) fn mount<D: Document<Node = N>>(
        doc: &mut D,
        start: N,
        instance_id: &str,
        compiled: &CompiledTemplate,
    ) -> Result<Self, DomError> {
        let attributes = compiled
            .attribute_bindings
            .iter()
            .map(|b| {
                let marker = markers::attribute_marker(&b.name, &b.id);
                markers::find_marked(doc, start, instance_id, &marker)
            })
            .collect();

        let found = markers::text_markers(doc, start, instance_id);
        let assigned = assign(&compiled.text_bindings, &found);
        let mut texts = Vec::with_capacity(assigned.len());
        for (binding, marker) in compiled.text_bindings.iter().zip(assigned) {
            let slot = match marker {
                Some(marker) => Some(TextSlot {
                    marker,
                    value: settle(doc, marker, &binding.initial)?,
                }),
                None => None,
            };
            texts.push(slot);
        }

        Ok(Self { attributes, texts })
    }

    pub(super) fn clear(&mut self) {
        self.attributes.clear();
        self.texts.clear();
    }

    /// Element of attribute binding `index`, re-located if stale
    pub(super) fn attribute_target<D: Document<Node = N>>(
        &mut self,
        doc: &D,
        start: N,
        instance_id: &str,
        index: usize,
        marker: &str,
    ) -> Option<N> {
        if let Some(Some(node)) = self.attributes.get(index).copied() {
            if doc.is_attached(node) && doc.attribute(node, marker).is_some() {
                return Some(node);
            }
        }
        let found = markers::find_marked(doc, start, instance_id, marker);
        if self.attributes.len() <= index {
            self.attributes.resize(index + 1, None);
        }
        self.attributes[index] = found;
        found
    }

    /// Value nodes of every text binding, rescanning the markers if any
    /// entry is stale
    pub(super) fn text_targets<D: Document<Node = N>>(
        &mut self,
        doc: &D,
        start: N,
        instance_id: &str,
        bindings: &[TextBinding],
    ) -> Vec<Option<N>> {
        let valid = self.texts.len() == bindings.len()
            && self.texts.iter().all(|slot| {
                slot.as_ref().is_some_and(|s| {
                    doc.is_attached(s.marker) && doc.next_sibling(s.marker) == Some(s.value)
                })
            });
        if !valid {
            tracing::trace!(instance = %instance_id, "rescanning text markers");
            let found = markers::text_markers(doc, start, instance_id);
            self.texts = assign(bindings, &found)
                .into_iter()
                .map(|marker| {
                    let marker = marker?;
                    let value = doc.next_sibling(marker)?;
                    Some(TextSlot { marker, value })
                })
                .collect();
        }
        self.texts
            .iter()
            .map(|slot| slot.as_ref().map(|s| s.value))
            .collect()
    }
}

/// Pair bindings with markers in document order, matching on path
fn assign<N: Copy>(bindings: &[TextBinding], found: &[(N, String)]) -> Vec<Option<N>> {
    let mut used = vec![false; found.len()];
    bindings
        .iter()
        .map(|binding| {
            let path = binding.path.to_string();
            let pos = found
                .iter()
                .enumerate()
                .position(|(i, (_, p))| !used[i] && *p == path)?;
            used[pos] = true;
            Some(found[pos].0)
        })
        .collect()
}

/// Make the node after `marker` a text node starting the value
fn settle<D: Document>(doc: &mut D, marker: D::Node, initial: &str) -> Result<D::Node, DomError> {
    if let Some(next) = doc.next_sibling(marker) {
        if doc.kind(next) == NodeKind::Text {
            let content = doc.text_content(next);
            if content == initial {
                return Ok(next);
            }
            if let Some(rest) = content.strip_prefix(initial) {
                let rest = rest.to_string();
                doc.set_text_content(next, initial);
                let tail = doc.create_text(&rest);
                doc.insert_after(next, tail)?;
            }
            return Ok(next);
        }
    }
    let value = doc.create_text(initial);
    doc.insert_after(marker, value)?;
    Ok(value)
}
