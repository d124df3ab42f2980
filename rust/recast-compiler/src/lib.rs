//! Recast Compiler
//!
//! Normalizes a Source AST into the IL tree: unwraps module wrappers,
//! recognizes idioms, maps platform builtins onto the closed IL vocabulary,
//! and tags every expression with an inferred type.

pub mod normalize;

pub use normalize::normalize;
