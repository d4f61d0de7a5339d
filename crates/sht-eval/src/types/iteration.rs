//! Iteration: the record returned by each step of an Iterator.

use std::sync::Arc;

use sht_ast::Initializer;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::DataType;
use crate::value::Instance;

/// One step of iteration: payload values, completion, and an optional error.
pub struct IterationValue {
    values: Arc<[Instance]>,
    done: bool,
    error: Option<Instance>,
}

impl IterationValue {
    /// A step carrying `values`.
    pub fn values(values: Vec<Instance>) -> Instance {
        Instance::Iteration(Arc::new(IterationValue {
            values: values.into(),
            done: false,
            error: None,
        }))
    }

    /// A step carrying a single value.
    pub fn item(value: Instance) -> Instance {
        Self::values(vec![value])
    }

    /// A terminal step carrying a raised error.
    pub fn error(error: Instance) -> Instance {
        Instance::Iteration(Arc::new(IterationValue {
            values: vec![error.clone()].into(),
            done: true,
            error: Some(error),
        }))
    }

    /// The terminal step without payload. Runtimes create this once and share it.
    pub(crate) fn done() -> Instance {
        Instance::Iteration(Arc::new(IterationValue {
            values: vec![Instance::Boolean(false)].into(),
            done: true,
            error: None,
        }))
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn error_value(&self) -> Option<&Instance> {
        self.error.as_ref()
    }

    pub fn payload(&self) -> &[Instance] {
        &self.values
    }

    /// The payload as one value: the sole element, or a Tuple of all of them.
    pub fn value(&self) -> Instance {
        match self.values.as_ref() {
            [single] => single.clone(),
            _ => Instance::Tuple(Arc::clone(&self.values)),
        }
    }
}

pub struct IterationType;

fn iteration(this: &Instance) -> Option<&IterationValue> {
    match this {
        Instance::Iteration(it) => Some(it),
        _ => None,
    }
}

impl DataType for IterationType {
    fn name(&self) -> &str {
        "Iteration"
    }

    fn construct(
        &self,
        _rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        Ok(IterationValue::values(args))
    }

    fn get(&self, _rt: &Runtime, this: &Instance, name: &str) -> Eval {
        let it = iteration(this).ok_or_else(|| RuntimeError::no_property("Iteration", name))?;
        match name {
            "value" => Ok(it.value()),
            "values" => Ok(Instance::Tuple(Arc::clone(&it.values))),
            "done" => Ok(Instance::Boolean(it.done)),
            "error" => Ok(it.error.clone().unwrap_or(Instance::Boolean(false))),
            other => Err(RuntimeError::no_property("Iteration", other).into()),
        }
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        let label = match iteration(this) {
            Some(it) if it.error.is_some() => "<Iteration:error>",
            Some(it) if it.done => "<Iteration:done>",
            _ => "<Iteration>",
        };
        Ok(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn test_done_payload_is_false() {
        let rt = Runtime::new(Options::default());
        let done = rt.done();
        let value = IterationType.get(&rt, &done, "value").unwrap();
        assert_eq!(value.repr(&rt).unwrap(), "false");
        let values = IterationType.get(&rt, &done, "values").unwrap();
        assert_eq!(values.repr(&rt).unwrap(), "(false,)");
        assert_eq!(done.repr(&rt).unwrap(), "<Iteration:done>");
    }

    #[test]
    fn test_error_iteration_is_done() {
        let rt = Runtime::new(Options::default());
        let err = IterationValue::error(Instance::error(RuntimeError::Raised("boom".into())));
        assert!(matches!(IterationType.get(&rt, &err, "done"), Ok(Instance::Boolean(true))));
        assert!(IterationType.get(&rt, &err, "error").unwrap().is_error());
        assert_eq!(err.repr(&rt).unwrap(), "<Iteration:error>");
    }

    #[test]
    fn test_value_unwraps_single_payload() {
        let Instance::Iteration(it) = IterationValue::values(vec![Instance::Number(1.0), Instance::Number(2.0)]) else {
            panic!("expected iteration");
        };
        assert!(matches!(it.value(), Instance::Tuple(t) if t.len() == 2));
        let Instance::Iteration(single) = IterationValue::item(Instance::Number(3.0)) else {
            panic!("expected iteration");
        };
        assert!(matches!(single.value(), Instance::Number(n) if n == 3.0));
    }
}
