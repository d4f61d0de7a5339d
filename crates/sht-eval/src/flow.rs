//! Control-flow signals.
//!
//! Evaluation returns `Ok(value)` for normal completion. Everything that
//! leaves a construct early travels on the `Err` side so `?` carries it
//! outward until the construct that consumes it: loops take `Break` and
//! `Continue`, calls take `Return`, wraps take `Raise`, and generators take
//! `Yield` by suspending instead of ever producing it.

use std::fmt;

use crate::error::RuntimeError;
use crate::value::Instance;

/// A non-local exit from an evaluation step.
#[derive(Clone)]
pub enum Flow {
    /// `return` with its value.
    Return(Instance),
    /// A raised Error instance.
    Raise(Instance),
    Break,
    Continue,
    /// A `yield` evaluated with no generator to suspend.
    Yield(Instance),
}

/// Result of an evaluation step.
pub type Eval<T = Instance> = std::result::Result<T, Flow>;

impl Flow {
    /// Raise a language error.
    pub fn raise(error: RuntimeError) -> Self {
        Flow::Raise(Instance::error(error))
    }

    fn name(&self) -> &'static str {
        match self {
            Flow::Return(_) => "return",
            Flow::Raise(_) => "raise",
            Flow::Break => "break",
            Flow::Continue => "continue",
            Flow::Yield(_) => "yield",
        }
    }

    /// Turn a signal that escaped every construct able to consume it into
    /// a raised error. `Return` and `Raise` pass through unchanged.
    pub(crate) fn escaped(self) -> Flow {
        match self {
            Flow::Break | Flow::Continue => Flow::raise(RuntimeError::internal(format!(
                "{} outside of a loop",
                self.name()
            ))),
            Flow::Yield(_) => Flow::raise(RuntimeError::internal("yield outside of a generator")),
            other => other,
        }
    }
}

impl From<RuntimeError> for Flow {
    fn from(error: RuntimeError) -> Self {
        Flow::raise(error)
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Return(v) => f.debug_tuple("Return").field(v).finish(),
            Flow::Raise(v) => f.debug_tuple("Raise").field(v).finish(),
            Flow::Break => f.write_str("Break"),
            Flow::Continue => f.write_str("Continue"),
            Flow::Yield(v) => f.debug_tuple("Yield").field(v).finish(),
        }
    }
}
