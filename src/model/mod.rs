//! The data model views bind against

pub mod path;
pub mod value;

pub use path::{ensure, leaf_paths, resolve, LeafPaths, Path, PathError};
pub use value::{Callback, Value};
