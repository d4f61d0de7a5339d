//! Maybe: the result of wrapping an expression with `?`.

use std::sync::Arc;

use sht_ast::Initializer;

use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::DataType;
use crate::value::Instance;

pub enum MaybeValue {
    Value(Instance),
    Error(Instance),
}

impl MaybeValue {
    pub fn value(value: Instance) -> Instance {
        Instance::Maybe(Arc::new(MaybeValue::Value(value)))
    }

    pub fn error(error: Instance) -> Instance {
        Instance::Maybe(Arc::new(MaybeValue::Error(error)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, MaybeValue::Error(_))
    }
}

pub struct MaybeType;

impl DataType for MaybeType {
    fn name(&self) -> &str {
        "Maybe"
    }

    /// `Maybe(v)`: an error value becomes an error Maybe.
    fn construct(
        &self,
        _rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        match args.into_iter().next() {
            Some(e @ Instance::Error(_)) => Ok(MaybeValue::error(e)),
            Some(v) => Ok(MaybeValue::value(v)),
            None => Ok(MaybeValue::value(Instance::Boolean(false))),
        }
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        match this {
            Instance::Maybe(m) if m.is_error() => Ok("<Maybe:error>".to_string()),
            _ => Ok("<Maybe:value>".to_string()),
        }
    }
}
