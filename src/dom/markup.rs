//! Lenient HTML fragment reading and writing
//!
//! Built on quick-xml with the XML strictness turned down: valueless
//! attributes, void elements and unmatched end tags are accepted. This is
//! not a full HTML5 parser; it covers the markup templates produce.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::DomError;

/// Elements that never have content or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// A parsed markup node
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    Text(String),
    Comment(String),
}

/// Parse an HTML fragment into a list of top-level nodes
pub fn parse_fragment(markup: &str) -> Result<Vec<MarkupNode>, DomError> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    // Open elements: (name, attributes, children)
    let mut stack: Vec<(String, Vec<(String, String)>, Vec<MarkupNode>)> = Vec::new();
    let mut top: Vec<MarkupNode> = Vec::new();

    fn push(
        stack: &mut [(String, Vec<(String, String)>, Vec<MarkupNode>)],
        top: &mut Vec<MarkupNode>,
        node: MarkupNode,
    ) {
        match stack.last_mut() {
            Some((_, _, children)) => children.push(node),
            None => top.push(node),
        }
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                let attributes = read_attributes(&e)?;
                if is_void(&name) {
                    push(
                        &mut stack,
                        &mut top,
                        MarkupNode::Element {
                            name,
                            attributes,
                            children: Vec::new(),
                        },
                    );
                } else {
                    stack.push((name, attributes, Vec::new()));
                }
            }
            Ok(Event::Empty(e)) => {
                let node = MarkupNode::Element {
                    name: element_name(&e),
                    attributes: read_attributes(&e)?,
                    children: Vec::new(),
                };
                push(&mut stack, &mut top, node);
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                // Close up to the matching open element; ignore stray end tags
                if let Some(pos) = stack.iter().rposition(|(open, _, _)| *open == name) {
                    while stack.len() > pos {
                        let Some((name, attributes, children)) = stack.pop() else {
                            break;
                        };
                        let node = MarkupNode::Element {
                            name,
                            attributes,
                            children,
                        };
                        push(&mut stack, &mut top, node);
                    }
                } else {
                    tracing::trace!(tag = %name, "ignoring unmatched end tag");
                }
            }
            Ok(Event::Text(t)) => {
                let raw = String::from_utf8_lossy(&t).into_owned();
                push(&mut stack, &mut top, MarkupNode::Text(decode(&raw)));
            }
            Ok(Event::CData(t)) => {
                let raw = String::from_utf8_lossy(&t).into_owned();
                push(&mut stack, &mut top, MarkupNode::Text(raw));
            }
            Ok(Event::Comment(t)) => {
                let content = String::from_utf8_lossy(&t).into_owned();
                push(&mut stack, &mut top, MarkupNode::Comment(content));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DomError::markup(e.to_string())),
        }
    }

    // Unclosed elements end at the end of the fragment
    while let Some((name, attributes, children)) = stack.pop() {
        let node = MarkupNode::Element {
            name,
            attributes,
            children,
        };
        push(&mut stack, &mut top, node);
    }

    Ok(top)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn read_attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, DomError> {
    let mut out = Vec::new();
    for attr in e.html_attributes() {
        let attr = attr.map_err(|err| DomError::markup(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        out.push((key, decode(&raw)));
    }
    Ok(out)
}

/// Decode character references; an `&` that starts no known reference
/// is kept literally
pub fn decode(raw: &str) -> String {
    if let Ok(decoded) = quick_xml::escape::unescape(raw) {
        return decoded.into_owned();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let reference = tail[1..]
            .find(|c: char| c == ';' || c == '&' || c.is_whitespace())
            .filter(|&i| tail[1 + i..].starts_with(';'))
            .map(|i| &tail[..i + 2]);
        match reference.map(|r| (r, quick_xml::escape::unescape(r))) {
            Some((reference, Ok(decoded))) => {
                out.push_str(&decoded);
                rest = &tail[reference.len()..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape text content (`<`, `>`, `&`)
pub fn escape_text(text: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(text)
}

/// Escape an attribute value, including quotes
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}
