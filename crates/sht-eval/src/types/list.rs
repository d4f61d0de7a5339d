//! List: mutable ordered sequence.
//!
//! A list may carry a default function. Reading an index outside the list
//! calls it with the index instead of raising.

use std::sync::{Arc, Mutex};

use sht_ast::Initializer;

use crate::call::call_value;
use crate::error::RuntimeError;
use crate::eval::eval_items;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::iteration::IterationValue;
use crate::types::iterator::{native_iterator, Pull};
use crate::types::{join_repr, resolve_index, DataType};
use crate::value::{lock, Instance};

pub struct ListValue {
    items: Mutex<Vec<Instance>>,
    default: Option<Instance>,
}

impl ListValue {
    pub fn new(items: Vec<Instance>) -> Instance {
        Self::with_default(items, None)
    }

    pub fn with_default(items: Vec<Instance>, default: Option<Instance>) -> Instance {
        Instance::List(Arc::new(ListValue {
            items: Mutex::new(items),
            default,
        }))
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<Instance> {
        lock(&self.items).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    fn get(&self, index: usize) -> Option<Instance> {
        lock(&self.items).get(index).cloned()
    }
}

pub struct ListType;

fn list(this: &Instance) -> Eval<&Arc<ListValue>> {
    match this {
        Instance::List(l) => Ok(l),
        other => Err(RuntimeError::internal(format!("expected List, got {}", other.type_name())).into()),
    }
}

fn default_fn(args: Vec<Instance>) -> Eval<Option<Instance>> {
    match args.into_iter().next() {
        None => Ok(None),
        Some(f @ Instance::Function(_)) => Ok(Some(f)),
        Some(other) => Err(RuntimeError::InvalidArgument(format!(
            "default must be a function, got {}",
            other.type_name()
        ))
        .into()),
    }
}

impl DataType for ListType {
    fn name(&self) -> &str {
        "List"
    }

    /// `List { a, b }`, optionally `List(default) { ... }`.
    fn construct(&self, rt: &Runtime, init: Option<(&Initializer, &Scope)>, args: Vec<Instance>) -> Eval {
        let default = default_fn(args)?;
        let items = match init {
            Some((Initializer::List(nodes), scope)) => eval_items(rt, scope, nodes)?,
            Some((Initializer::Map(_), _)) => {
                return Err(RuntimeError::InvalidArgument(
                    "List expects a list initializer".to_string(),
                )
                .into())
            }
            None => Vec::new(),
        };
        Ok(ListValue::with_default(items, default))
    }

    /// A list that contains itself renders the inner occurrence as `[...]`.
    fn repr(&self, rt: &Runtime, this: &Instance) -> Eval<String> {
        let l = list(this)?;
        let Some(_guard) = rt.enter_render(Arc::as_ptr(l) as usize) else {
            return Ok("[...]".to_string());
        };
        Ok(format!("[{}]", join_repr(rt, &l.snapshot(), ", ")?))
    }

    fn len(&self, _rt: &Runtime, this: &Instance) -> Eval {
        Ok(Instance::Number(list(this)?.len() as f64))
    }

    fn get_item(&self, rt: &Runtime, this: &Instance, index: &[Instance]) -> Eval {
        let l = list(this)?;
        match index {
            [] => Ok(ListValue::with_default(l.snapshot(), l.default.clone())),
            [i] => {
                let len = l.len();
                match resolve_index("List", i, len, false) {
                    Ok(position) => l.get(position).ok_or_else(|| {
                        RuntimeError::out_of_bounds("List", position, len).into()
                    }),
                    Err(err) => match &l.default {
                        Some(default) => call_value(rt, default, vec![i.clone()]),
                        None => Err(err),
                    },
                }
            }
            [start, end] => {
                let items = l.snapshot();
                let s = resolve_index("List", start, items.len(), true)?;
                let e = resolve_index("List", end, items.len(), true)?;
                let sliced: Vec<Instance> = if s <= e {
                    items[s..e].to_vec()
                } else {
                    // Descending slice: from `start` down to just above `end`.
                    let s = resolve_index("List", start, items.len(), false)?;
                    items[e + 1..=s].iter().rev().cloned().collect()
                };
                Ok(ListValue::new(sliced))
            }
            _ => Err(RuntimeError::InvalidIndex(format!(
                "List takes at most 2 indices, got {}",
                index.len()
            ))
            .into()),
        }
    }

    fn set_item(&self, _rt: &Runtime, this: &Instance, index: &[Instance], value: Instance) -> Eval {
        let l = list(this)?;
        let [i] = index else {
            return Err(RuntimeError::InvalidIndex(format!(
                "List assignment takes 1 index, got {}",
                index.len()
            ))
            .into());
        };
        let mut items = lock(&l.items);
        let position = resolve_index("List", i, items.len(), false)?;
        items[position] = value.clone();
        Ok(value)
    }

    /// Iterates by position over the live list.
    fn iter(&self, _rt: &Runtime, this: &Instance) -> Eval {
        let l = Arc::clone(list(this)?);
        let position = Mutex::new(0usize);
        Ok(native_iterator(move |rt| {
            let mut i = lock(&position);
            match l.get(*i) {
                Some(v) => {
                    *i += 1;
                    Ok(IterationValue::item(v))
                }
                None => Ok(rt.done()),
            }
        }))
    }

    /// `iterable as List`
    fn to(&self, rt: &Runtime, source: &Instance) -> Eval {
        Ok(ListValue::new(Pull::new(rt, source)?.collect(rt)?))
    }

    fn contains(&self, rt: &Runtime, this: &Instance, item: &Instance) -> Eval<bool> {
        for v in list(this)?.snapshot() {
            if v.equals(rt, item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
