//! Error: a raised or raisable failure.

use std::sync::Arc;

use sht_ast::Initializer;

use crate::error::{ErrorKind, RuntimeError};
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::DataType;
use crate::value::Instance;

pub struct ErrorValue {
    kind: ErrorKind,
    message: String,
    /// The raised value, when a script raised something other than an Error or String.
    payload: Option<Instance>,
}

impl ErrorValue {
    /// An error raised by a script with an arbitrary value.
    pub fn raised(message: String, payload: Option<Instance>) -> Instance {
        Instance::Error(Arc::new(ErrorValue {
            kind: ErrorKind::User,
            message,
            payload,
        }))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> Option<&Instance> {
        self.payload.as_ref()
    }
}

impl From<RuntimeError> for ErrorValue {
    fn from(error: RuntimeError) -> Self {
        ErrorValue {
            kind: error.kind(),
            message: error.to_string(),
            payload: None,
        }
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Binding => "binding",
        ErrorKind::Operation => "operation",
        ErrorKind::Arity => "arity",
        ErrorKind::User => "user",
        ErrorKind::Internal => "internal",
    }
}

pub struct ErrorType;

impl DataType for ErrorType {
    fn name(&self) -> &str {
        "Error"
    }

    /// `Error(message)`
    fn construct(
        &self,
        rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        let message = match args.first() {
            Some(v) => v.to_text(rt)?,
            None => String::new(),
        };
        Ok(ErrorValue::raised(message, None))
    }

    fn get(&self, _rt: &Runtime, this: &Instance, name: &str) -> Eval {
        let Instance::Error(e) = this else {
            return Err(RuntimeError::no_property("Error", name).into());
        };
        match name {
            "message" => Ok(Instance::string(e.message.as_str())),
            "kind" => Ok(Instance::string(kind_name(e.kind))),
            "value" => Ok(e.payload.clone().unwrap_or(Instance::Boolean(false))),
            other => Err(RuntimeError::no_property("Error", other).into()),
        }
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        match this {
            Instance::Error(e) => Ok(format!("ERR! {}", e.message)),
            _ => Ok("ERR!".to_string()),
        }
    }
}
