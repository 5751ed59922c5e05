//! Template compilation and the marker protocol
//!
//! A template is HTML with three kinds of bindings:
//!
//! ```text
//! <div class="card {{state.kind}}">      attribute binding
//!   <b>{{user.name}}</b>                 text binding
//!   <button @click="actions.save">       event binding
//!   <template id="row">...</template>    nested template, compiled on its own
//! </div>
//! ```

mod binding;
mod compiler;
pub mod markers;

use thiserror::Error;

use crate::error::ParseError;
use crate::model::PathError;

pub use binding::{
    render_path, AttributeBinding, CompiledTemplate, EventBinding, Interpolation, Piece,
    SubTemplate, TextBinding,
};
pub use compiler::{namespace, TemplateCompiler};

/// Errors that can occur while compiling a template
#[derive(Debug, Error)]
pub enum CompileError {
    /// Template markup is malformed
    #[error("template parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// A placeholder or event handler names an invalid path
    #[error(transparent)]
    Path(#[from] PathError),
}

impl From<Vec<ParseError>> for CompileError {
    fn from(errors: Vec<ParseError>) -> Self {
        CompileError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
