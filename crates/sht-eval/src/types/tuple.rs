//! Tuple: immutable ordered sequence with structural equality.

use std::sync::{Arc, Mutex};

use sht_ast::Initializer;

use crate::error::RuntimeError;
use crate::eval::eval_items;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::iteration::IterationValue;
use crate::types::iterator::{native_iterator, Pull};
use crate::types::{join_repr, resolve_index, resolve_slice, DataType};
use crate::value::{lock, Instance};

pub struct TupleType;

fn items(this: &Instance) -> &[Instance] {
    match this {
        Instance::Tuple(values) => values,
        _ => &[],
    }
}

/// Iterator over a shared slice of values, one per step.
pub(crate) fn slice_iterator(values: Arc<[Instance]>) -> Instance {
    let position = Mutex::new(0usize);
    native_iterator(move |rt| {
        let mut i = lock(&position);
        match values.get(*i) {
            Some(v) => {
                *i += 1;
                Ok(IterationValue::item(v.clone()))
            }
            None => Ok(rt.done()),
        }
    })
}

impl DataType for TupleType {
    fn name(&self) -> &str {
        "Tuple"
    }

    /// `Tuple(a, b)` or `Tuple { a, b }`.
    fn construct(&self, rt: &Runtime, init: Option<(&Initializer, &Scope)>, args: Vec<Instance>) -> Eval {
        let mut values = args;
        match init {
            Some((Initializer::List(nodes), scope)) => values.extend(eval_items(rt, scope, nodes)?),
            Some((Initializer::Map(_), _)) => {
                return Err(RuntimeError::InvalidArgument(
                    "Tuple expects a list initializer".to_string(),
                )
                .into())
            }
            None => {}
        }
        Ok(Instance::tuple(values))
    }

    fn repr(&self, rt: &Runtime, this: &Instance) -> Eval<String> {
        let values = items(this);
        let inner = join_repr(rt, values, ", ")?;
        if values.len() == 1 {
            Ok(format!("({},)", inner))
        } else {
            Ok(format!("({})", inner))
        }
    }

    fn len(&self, _rt: &Runtime, this: &Instance) -> Eval {
        Ok(Instance::Number(items(this).len() as f64))
    }

    fn get_item(&self, _rt: &Runtime, this: &Instance, index: &[Instance]) -> Eval {
        let values = items(this);
        match index {
            [] => Ok(this.clone()),
            [i] => {
                let i = resolve_index("Tuple", i, values.len(), false)?;
                Ok(values[i].clone())
            }
            [start, end] => {
                let (s, e) = resolve_slice("Tuple", start, end, values.len())?;
                Ok(Instance::tuple(values[s..e].to_vec()))
            }
            _ => Err(RuntimeError::InvalidIndex(format!(
                "Tuple takes at most 2 indices, got {}",
                index.len()
            ))
            .into()),
        }
    }

    fn iter(&self, _rt: &Runtime, this: &Instance) -> Eval {
        match this {
            Instance::Tuple(values) => Ok(slice_iterator(Arc::clone(values))),
            _ => Ok(slice_iterator(Vec::<Instance>::new().into())),
        }
    }

    /// `iterable as Tuple`
    fn to(&self, rt: &Runtime, source: &Instance) -> Eval {
        if let Instance::Tuple(_) = source {
            return Ok(source.clone());
        }
        Ok(Instance::tuple(Pull::new(rt, source)?.collect(rt)?))
    }

    fn contains(&self, rt: &Runtime, this: &Instance, item: &Instance) -> Eval<bool> {
        for v in items(this) {
            if v.equals(rt, item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn equals(&self, rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        let Instance::Tuple(other) = other else {
            return Ok(false);
        };
        let values = items(this);
        if values.len() != other.len() {
            return Ok(false);
        }
        for (a, b) in values.iter().zip(other.iter()) {
            if !a.equals(rt, b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
