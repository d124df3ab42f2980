//! BASIC code generation backend (FreeBASIC, VB.NET, VB6, VBA, VBScript,
//! Gambas, Xojo).

pub mod ast;
pub mod emit;
pub mod transform;

pub use emit::{needs_parens, precedence, BasicEmitter, Side};
pub use transform::transform;
