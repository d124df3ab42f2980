//! Python code generation backend.

pub mod ast;
pub mod emit;
pub mod transform;

pub use emit::{needs_parens, precedence, PyEmitter, Side};
pub use transform::transform;
