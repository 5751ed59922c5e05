//! Dotted-path access into the model
//!
//! Reading and materializing are separate operations: [`resolve`] never
//! touches the model, while [`ensure`] creates empty maps for missing
//! intermediate segments so later writes under that path succeed. Only
//! binding setup calls [`ensure`].

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use super::value::Value;

/// Errors that can occur when building or walking a path
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path has no segments, or one of its segments is empty
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl PathError {
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Characters that would break the text marker a path is written into
const RESERVED: &[char] = &['|', '<', '>'];

/// An ordered sequence of model keys, e.g. `user.role`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Vec<String>);

impl Path {
    /// Parse a dotted identifier; surrounding whitespace is ignored
    pub fn parse(dotted: &str) -> Result<Self, PathError> {
        let trimmed = dotted.trim();
        if trimmed.is_empty() {
            return Err(PathError::invalid(dotted, "path has no segments"));
        }
        let segments: Vec<String> = trimmed.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PathError::invalid(dotted, "path contains an empty segment"));
        }
        // Paths are written into marker comments
        if let Some(c) = trimmed.chars().find(|c| RESERVED.contains(c)) {
            return Err(PathError::invalid(
                dotted,
                format!("path contains reserved character '{}'", c),
            ));
        }
        Ok(Self(segments))
    }

    /// Build a path from raw segments without validation
    ///
    /// An empty segment list is accepted here and rejected by [`resolve`].
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

fn split_leaf(path: &Path) -> Result<(&String, &[String]), PathError> {
    path.segments()
        .split_last()
        .ok_or_else(|| PathError::invalid("", "path has no segments"))
}

/// Resolve a path without modifying the model
///
/// Returns `Ok(None)` when any segment is absent.
pub fn resolve<'m>(model: &'m Value, path: &Path) -> Result<Option<&'m Value>, PathError> {
    let (leaf, parents) = split_leaf(path)?;
    let mut current = model;
    for segment in parents {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(current.get(leaf))
}

/// Resolve a path, creating empty maps for absent or null intermediates
///
/// The leaf itself is never created. A scalar intermediate stops the walk
/// with `Ok(None)`.
pub fn ensure<'m>(model: &'m mut Value, path: &Path) -> Result<Option<&'m Value>, PathError> {
    let (leaf, parents) = split_leaf(path)?;
    let mut current = model;
    for segment in parents {
        let slot = match current {
            Value::Map(map) => map.entry(segment.clone()).or_insert(Value::Null),
            Value::List(items) => {
                match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                    Some(item) => item,
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        if slot.is_null() {
            tracing::trace!(segment = %segment, path = %path, "materializing intermediate map");
            *slot = Value::Map(IndexMap::new());
        }
        current = slot;
    }
    let current: &'m Value = current;
    Ok(current.get(leaf))
}

/// Enumerate every leaf path of a value, depth-first in insertion order
pub fn leaf_paths(value: &Value) -> LeafPaths<'_> {
    let mut stack = Vec::new();
    push_children(&mut stack, None, value);
    LeafPaths { stack }
}

/// Iterator returned by [`leaf_paths`]
#[derive(Debug)]
pub struct LeafPaths<'a> {
    stack: Vec<(String, &'a Value)>,
}

impl<'a> Iterator for LeafPaths<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some((path, value)) = self.stack.pop() {
            if value.is_container() {
                push_children(&mut self.stack, Some(&path), value);
            } else {
                return Some(path);
            }
        }
        None
    }
}

fn push_children<'a>(stack: &mut Vec<(String, &'a Value)>, prefix: Option<&str>, value: &'a Value) {
    let join = |key: &str| match prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    };
    let children: Vec<(String, &'a Value)> = match value {
        Value::Map(map) => map.iter().map(|(k, v)| (join(k), v)).collect(),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (join(&i.to_string()), v))
            .collect(),
        _ => Vec::new(),
    };
    // Reversed so the first child is popped first
    stack.extend(children.into_iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user_model() -> Value {
        Value::map().with(
            "user",
            Value::map().with("name", "Ada").with("role", "admin"),
        )
    }

    #[test]
    fn test_parse_path() {
        let path = Path::parse(" user.name ").unwrap();
        assert_eq!(path.segments(), &["user".to_string(), "name".to_string()]);
        assert_eq!(path.to_string(), "user.name");
    }

    #[test]
    fn test_parse_rejects_reserved_characters() {
        for dotted in ["a|b", "a.b>c", "x-->", "<y"] {
            assert!(
                matches!(Path::parse(dotted), Err(PathError::InvalidPath { .. })),
                "{} should be rejected",
                dotted
            );
        }
        assert!(Path::parse("a-b.c_d").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(Path::parse(""), Err(PathError::InvalidPath { .. })));
        assert!(matches!(Path::parse("   "), Err(PathError::InvalidPath { .. })));
        assert!(matches!(Path::parse("a..b"), Err(PathError::InvalidPath { .. })));
    }

    #[test]
    fn test_resolve_single_segment() {
        let model = Value::map().with("title", "Hello");
        let path = Path::parse("title").unwrap();
        assert_eq!(resolve(&model, &path).unwrap(), Some(&Value::from("Hello")));
    }

    #[test]
    fn test_resolve_nested() {
        let model = user_model();
        let path = Path::parse("user.role").unwrap();
        assert_eq!(resolve(&model, &path).unwrap(), Some(&Value::from("admin")));
    }

    #[test]
    fn test_resolve_empty_path_fails() {
        let model = user_model();
        let result = resolve(&model, &Path::from_segments(Vec::<String>::new()));
        assert!(matches!(result, Err(PathError::InvalidPath { .. })));

        let mut model = Value::Null;
        let result = ensure(&mut model, &Path::from_segments(Vec::<String>::new()));
        assert!(matches!(result, Err(PathError::InvalidPath { .. })));
    }

    #[test]
    fn test_resolve_absent_does_not_mutate() {
        let model = Value::map();
        let path = Path::parse("a.b.c").unwrap();
        assert_eq!(resolve(&model, &path).unwrap(), None);
        assert_eq!(model, Value::map());
    }

    #[test]
    fn test_ensure_materializes_intermediates() {
        let mut model = Value::map();
        let path = Path::parse("a.b.c").unwrap();
        assert_eq!(ensure(&mut model, &path).unwrap(), None);
        assert_eq!(ensure(&mut model, &path).unwrap(), None);
        assert_eq!(model, Value::map().with("a", Value::map().with("b", Value::map())));
    }

    #[test]
    fn test_ensure_replaces_null_intermediate() {
        let mut model = Value::map().with("user", Value::Null);
        let path = Path::parse("user.name").unwrap();
        assert_eq!(ensure(&mut model, &path).unwrap(), None);
        assert_eq!(model.get("user"), Some(&Value::map()));
    }

    #[test]
    fn test_ensure_stops_at_scalar() {
        let mut model = Value::map().with("user", "Ada");
        let path = Path::parse("user.name").unwrap();
        assert_eq!(ensure(&mut model, &path).unwrap(), None);
        assert_eq!(model.get("user"), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_ensure_through_list() {
        let mut model = Value::map().with(
            "rows",
            Value::List(vec![Value::map().with("label", "first")]),
        );
        let path = Path::parse("rows.0.label").unwrap();
        assert_eq!(ensure(&mut model, &path).unwrap(), Some(&Value::from("first")));
        let missing = Path::parse("rows.3.label").unwrap();
        assert_eq!(ensure(&mut model, &missing).unwrap(), None);
    }

    #[test]
    fn test_leaf_paths_depth_first() {
        let model = Value::map()
            .with("title", "Hello")
            .with(
                "user",
                Value::map()
                    .with("name", "Ada")
                    .with("tags", Value::List(vec![Value::from("x"), Value::from("y")])),
            )
            .with("empty", Value::map())
            .with("count", 3i64);
        let paths: Vec<String> = leaf_paths(&model).collect();
        assert_eq!(
            paths,
            vec!["title", "user.name", "user.tags.0", "user.tags.1", "count"]
        );
    }

    #[test]
    fn test_leaf_paths_of_scalar() {
        assert_eq!(leaf_paths(&Value::from("x")).count(), 0);
    }
}
