//! Marker protocol
//!
//! Markers make a mounted view addressable without any side structure:
//!
//! - `<!--START | id-->` ... `<!--END | id-->` wrap an instance's output
//! - `data-<attr>-<binding>` marks an element with a bound attribute
//! - `data-event-<event>-<binding>` marks an element with an event binding
//! - `<!--id | path-->` precedes exactly one node holding a text value

use crate::dom::Document;
use crate::model::Path;

const START: &str = "START";
const END: &str = "END";
const SEPARATOR: &str = " | ";

/// A parsed marker comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Start(String),
    End(String),
    Text { instance: String, path: String },
}

impl Marker {
    /// Parse a comment's content; None for ordinary comments
    pub fn parse(content: &str) -> Option<Self> {
        let (head, tail) = content.split_once(SEPARATOR)?;
        if head.is_empty() || tail.is_empty() || tail.contains('|') || head.contains('|') {
            return None;
        }
        Some(match head {
            START => Marker::Start(tail.to_string()),
            END => Marker::End(tail.to_string()),
            _ => Marker::Text {
                instance: head.to_string(),
                path: tail.to_string(),
            },
        })
    }

    /// The comment content for this marker
    pub fn content(&self) -> String {
        match self {
            Marker::Start(id) => format!("{}{}{}", START, SEPARATOR, id),
            Marker::End(id) => format!("{}{}{}", END, SEPARATOR, id),
            Marker::Text { instance, path } => format!("{}{}{}", instance, SEPARATOR, path),
        }
    }

    /// The marker as a comment in markup
    pub fn to_comment(&self) -> String {
        format!("<!--{}-->", self.content())
    }
}

/// Comment markup introducing a text binding
pub fn text_comment(instance_id: &str, path: &Path) -> String {
    Marker::Text {
        instance: instance_id.to_string(),
        path: path.to_string(),
    }
    .to_comment()
}

/// Surround compiled markup with the instance's wrapping markers
pub fn wrap(instance_id: &str, html: &str) -> String {
    format!(
        "{}{}{}",
        Marker::Start(instance_id.to_string()).to_comment(),
        html,
        Marker::End(instance_id.to_string()).to_comment()
    )
}

/// Marker attribute names are lowercase; HTML hosts fold attribute case
pub fn attribute_marker(attribute: &str, binding_id: &str) -> String {
    format!("data-{}-{}", attribute.to_ascii_lowercase(), binding_id)
}

pub fn event_marker(event: &str, binding_id: &str) -> String {
    format!("data-event-{}-{}", event.to_ascii_lowercase(), binding_id)
}

fn marker_of<D: Document>(doc: &D, node: D::Node) -> Option<Marker> {
    if !doc.is_comment(node) {
        return None;
    }
    Marker::parse(&doc.text_content(node))
}

/// Find the start marker of an instance anywhere in the document
pub fn find_start<D: Document>(doc: &D, instance_id: &str) -> Option<D::Node> {
    doc.descendants(doc.root())
        .into_iter()
        .find(|&n| matches!(marker_of(doc, n), Some(Marker::Start(id)) if id == instance_id))
}

/// Whether both wrapping markers of an instance are present
pub fn is_mounted<D: Document>(doc: &D, instance_id: &str) -> bool {
    match find_start(doc, instance_id) {
        Some(start) => region(doc, start, instance_id)
            .last()
            .is_some_and(|&n| matches!(marker_of(doc, n), Some(Marker::End(id)) if id == instance_id)),
        None => false,
    }
}

/// The start marker, its following siblings, and the matching end marker
///
/// Only an end marker carrying exactly `instance_id` closes the region;
/// markers of nested or sibling instances are part of it. If the end
/// marker is missing the region runs to the last sibling.
pub fn region<D: Document>(doc: &D, start: D::Node, instance_id: &str) -> Vec<D::Node> {
    let mut out = Vec::new();
    for node in doc.next_siblings(start) {
        out.push(node);
        if matches!(marker_of(doc, node), Some(Marker::End(id)) if id == instance_id) {
            break;
        }
    }
    out
}

/// Every node inside an instance's region, in document order
fn region_nodes<D: Document>(doc: &D, start: D::Node, instance_id: &str) -> Vec<D::Node> {
    let mut out = Vec::new();
    for top in region(doc, start, instance_id) {
        out.push(top);
        out.extend(doc.descendants(top));
    }
    out
}

/// Text markers of one instance inside its region, in document order
pub fn text_markers<D: Document>(
    doc: &D,
    start: D::Node,
    instance_id: &str,
) -> Vec<(D::Node, String)> {
    region_nodes(doc, start, instance_id)
        .into_iter()
        .filter_map(|node| match marker_of(doc, node) {
            Some(Marker::Text { instance, path }) if instance == instance_id => Some((node, path)),
            _ => None,
        })
        .collect()
}

/// First element inside an instance's region carrying the marker attribute
pub fn find_marked<D: Document>(
    doc: &D,
    start: D::Node,
    instance_id: &str,
    attribute: &str,
) -> Option<D::Node> {
    region_nodes(doc, start, instance_id)
        .into_iter()
        .find(|&node| doc.is_element(node) && doc.attribute(node, attribute).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    #[test]
    fn test_parse_markers() {
        assert_eq!(Marker::parse("START | abc"), Some(Marker::Start("abc".to_string())));
        assert_eq!(Marker::parse("END | abc"), Some(Marker::End("abc".to_string())));
        assert_eq!(
            Marker::parse("abc | user.name"),
            Some(Marker::Text {
                instance: "abc".to_string(),
                path: "user.name".to_string()
            })
        );
        assert_eq!(Marker::parse(" just a comment "), None);
        assert_eq!(Marker::parse("a | b | c"), None);
    }

    #[test]
    fn test_marker_content_round_trip() {
        let marker = Marker::Text {
            instance: "abc".to_string(),
            path: "user.name".to_string(),
        };
        assert_eq!(marker.to_comment(), "<!--abc | user.name-->");
        assert_eq!(Marker::parse(&marker.content()), Some(marker));
    }

    #[test]
    fn test_wrap_and_attribute_markers() {
        assert_eq!(wrap("id1", "<b></b>"), "<!--START | id1--><b></b><!--END | id1-->");
        assert_eq!(attribute_marker("class", "xyz"), "data-class-xyz");
        assert_eq!(event_marker("click", "xyz"), "data-event-click-xyz");
    }

    #[test]
    fn test_marker_attributes_are_lowercase() {
        assert_eq!(attribute_marker("aria-Label", "xyz"), "data-aria-label-xyz");
        assert_eq!(event_marker("dblClick", "xyz"), "data-event-dblclick-xyz");
    }

    #[test]
    fn test_region_matches_exact_id() {
        let doc = MemoryDocument::parse(
            "<!--START | a--><i></i><!--START | ab--><b></b><!--END | ab--><!--END | a--><p></p>",
        )
        .unwrap();
        let start = find_start(&doc, "a").unwrap();
        let region = region(&doc, start, "a");
        assert_eq!(region.len(), 6);
        assert!(is_mounted(&doc, "a"));
        assert!(is_mounted(&doc, "ab"));
        assert!(!is_mounted(&doc, "b"));
    }

    #[test]
    fn test_text_markers_scoped_to_instance() {
        let doc = MemoryDocument::parse(
            "<!--START | a--><p><!--a | x-->1<!--ab | y-->2</p><!--END | a--><!--a | z-->3",
        )
        .unwrap();
        let start = find_start(&doc, "a").unwrap();
        let paths: Vec<String> = text_markers(&doc, start, "a")
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(paths, vec!["x".to_string()]);
    }

    #[test]
    fn test_find_marked_stays_in_region() {
        let doc = MemoryDocument::parse(
            r#"<i data-class-q></i><!--START | a--><p><b data-class-q></b></p><!--END | a-->"#,
        )
        .unwrap();
        let start = find_start(&doc, "a").unwrap();
        let found = find_marked(&doc, start, "a", "data-class-q").unwrap();
        assert_eq!(doc.tag_name(found), Some("b"));
        assert_eq!(find_marked(&doc, start, "a", "data-class-z"), None);
    }
}
