//! Iterator: a stateful producer of Iterations.
//!
//! An Iterator wraps a `next` callable. Once a step reports completion or
//! an error the iterator latches as done and every later step is `DONE`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sht_ast::Initializer;

use crate::call::call_value;
use crate::error::RuntimeError;
use crate::flow::{Eval, Flow};
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::function::FunctionValue;
use crate::types::iteration::IterationValue;
use crate::types::DataType;
use crate::value::Instance;

pub struct IteratorValue {
    next: Instance,
    done: AtomicBool,
}

impl IteratorValue {
    /// Wrap a callable producer.
    pub fn new(next: Instance) -> Instance {
        Instance::Iterator(Arc::new(IteratorValue {
            next,
            done: AtomicBool::new(false),
        }))
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Advance one step. Never raises: failures come back as error Iterations.
    pub fn advance(&self, rt: &Runtime) -> Instance {
        if self.is_done() {
            return rt.done();
        }
        let step = match call_value(rt, &self.next, Vec::new()) {
            Ok(step) => step,
            Err(Flow::Raise(error)) => {
                self.done.store(true, Ordering::SeqCst);
                return IterationValue::error(error);
            }
            Err(other) => {
                self.done.store(true, Ordering::SeqCst);
                return IterationValue::error(Instance::error(RuntimeError::internal(format!(
                    "iterator producer exited with {:?}",
                    other
                ))));
            }
        };
        match &step {
            Instance::Iteration(it) => {
                if it.is_done() {
                    self.done.store(true, Ordering::SeqCst);
                }
                step
            }
            other => {
                self.done.store(true, Ordering::SeqCst);
                IterationValue::error(Instance::error(RuntimeError::internal(format!(
                    "Expected iteration, {} given",
                    other.type_name()
                ))))
            }
        }
    }
}

/// Build an Iterator around a native step function.
pub(crate) fn native_iterator<F>(step: F) -> Instance
where
    F: Fn(&Runtime) -> Eval + Send + Sync + 'static,
{
    IteratorValue::new(FunctionValue::native("next", move |rt, _args| step(rt)))
}

/// Consumer side of the protocol: pulls steps and surfaces error steps as raises.
pub(crate) struct Pull {
    iterator: Arc<IteratorValue>,
}

impl Pull {
    /// Obtain an Iterator over `iterable` through its `iter` operation.
    pub(crate) fn new(rt: &Runtime, iterable: &Instance) -> Eval<Self> {
        match iterable.iterate(rt)? {
            Instance::Iterator(iterator) => Ok(Self { iterator }),
            other => Err(RuntimeError::MetaResult {
                meta: "iter".to_string(),
                expected: "Iterator".to_string(),
                got: other.type_name().to_string(),
            }
            .into()),
        }
    }

    /// Next payload, or None once done.
    pub(crate) fn next(&self, rt: &Runtime) -> Eval<Option<Arc<IterationValue>>> {
        match self.iterator.advance(rt) {
            Instance::Iteration(it) => {
                if let Some(error) = it.error_value() {
                    return Err(Flow::Raise(error.clone()));
                }
                if it.is_done() {
                    return Ok(None);
                }
                Ok(Some(it))
            }
            _ => Ok(None),
        }
    }

    /// Next payload as a single value.
    pub(crate) fn next_item(&self, rt: &Runtime) -> Eval<Option<Instance>> {
        Ok(self.next(rt)?.map(|it| it.value()))
    }

    /// Drain the iterator into single values.
    pub(crate) fn collect(&self, rt: &Runtime) -> Eval<Vec<Instance>> {
        let mut out = Vec::new();
        while let Some(item) = self.next_item(rt)? {
            out.push(item);
        }
        Ok(out)
    }
}

pub struct IteratorType;

fn iterator(this: &Instance) -> Option<&Arc<IteratorValue>> {
    match this {
        Instance::Iterator(it) => Some(it),
        _ => None,
    }
}

impl DataType for IteratorType {
    fn name(&self) -> &str {
        "Iterator"
    }

    /// `Iterator(fn)`: wrap a producer returning Iterations.
    fn construct(
        &self,
        _rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        match args.into_iter().next() {
            Some(f @ Instance::Function(_)) => Ok(IteratorValue::new(f)),
            Some(other) => Err(RuntimeError::InvalidArgument(format!(
                "Iterator expects a function, got {}",
                other.type_name()
            ))
            .into()),
            None => Err(RuntimeError::MissingArgument("next".to_string()).into()),
        }
    }

    fn get(&self, _rt: &Runtime, this: &Instance, name: &str) -> Eval {
        let it = iterator(this).ok_or_else(|| RuntimeError::no_property("Iterator", name))?;
        match name {
            "next" => {
                let it = Arc::clone(it);
                Ok(FunctionValue::native("next", move |rt, _args| Ok(it.advance(rt))))
            }
            "done" => Ok(Instance::Boolean(it.is_done())),
            other => Err(RuntimeError::no_property("Iterator", other).into()),
        }
    }

    fn iter(&self, _rt: &Runtime, this: &Instance) -> Eval {
        Ok(this.clone())
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        match iterator(this) {
            Some(it) if it.is_done() => Ok("<Iterator:done>".to_string()),
            _ => Ok("<Iterator>".to_string()),
        }
    }
}
