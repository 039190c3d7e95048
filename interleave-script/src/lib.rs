//! Sandboxed interpreter for small JavaScript-like snippets.
//!
//! Snippets are compiled to a [`Program`](ast::Program) and run by a
//! tree-walking interpreter against a fresh scope, so runs cannot observe each
//! other. Results serialize to a canonical JSON-like string with
//! [`Value::to_json`].

pub mod ast;
pub mod engine;
pub mod error;
pub mod json;
pub mod lex;
pub mod number;
pub mod parse;
pub mod token;
pub mod vm;

pub use engine::{Engine, Limits, Sandbox};
pub use error::{Error, SyntaxError};
pub use vm::Value;

/// Deepest nesting of syntax or serialized values a run accepts.
pub const MAX_NESTING: usize = 256;

#[cfg(test)]
mod tests;
