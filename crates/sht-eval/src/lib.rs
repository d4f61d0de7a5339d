//! Evaluator core for the sht scripting language.
//!
//! This crate walks `sht_ast::Node` trees. Every evaluation step returns an
//! [`Eval`]: `Ok` carries a value, `Err` carries a non-local [`Flow`]
//! (return, raise, break, continue, yield) that propagates with `?` until a
//! construct consumes it. Generators run their bodies on dedicated threads
//! and hand values back over rendezvous channels.

mod builtins;
mod call;
mod error;
mod eval;
mod flow;
mod generator;
mod interpreter;
mod options;
mod runtime;
mod scope;
mod types;
mod value;

pub use call::call_value;
pub use error::{ErrorKind, RuntimeError};
pub use eval::eval;
pub use flow::{Eval, Flow};
pub use interpreter::{run, Interpreter, RunOutput};
pub use options::Options;
pub use runtime::{PrintSink, Runtime};
pub use scope::{Reference, Scope};
pub use types::{DataType, Meta};
pub use value::{Builtin, Instance, TypeRef};
