//! Syntax tree contract for the sht scripting language.
//!
//! The evaluator in `sht-eval` walks these nodes. Trees are built by an
//! external parser, by hand through the [`build`] helpers, or decoded from
//! JSON with [`Node::from_json`].

pub mod ast;
pub mod build;
pub mod dump;

pub use ast::{
    BinaryOperator, DataDef, FunctionDef, Initializer, MatchCase, Node, Parameter,
    PostfixOperator, Property, UnaryOperator,
};
pub use dump::dump;

use thiserror::Error;

/// Errors raised while decoding or encoding a tree.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Malformed syntax tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tree decoding.
pub type Result<T> = std::result::Result<T, TreeError>;
