//! Dict: mutable map from string keys to values.
//!
//! Keys are the string conversion of whatever indexes the dict. A dict may
//! carry a default function; reading a missing key calls it with the key,
//! stores the result, and returns it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use sht_ast::Initializer;

use crate::call::call_value;
use crate::error::RuntimeError;
use crate::eval::eval_entries;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::iterator::Pull;
use crate::types::tuple::slice_iterator;
use crate::types::DataType;
use crate::value::{lock, Instance};

pub struct DictValue {
    entries: Mutex<BTreeMap<String, Instance>>,
    default: Option<Instance>,
}

impl DictValue {
    pub fn new(entries: BTreeMap<String, Instance>, default: Option<Instance>) -> Instance {
        Instance::Dict(Arc::new(DictValue {
            entries: Mutex::new(entries),
            default,
        }))
    }

    pub fn snapshot(&self) -> Vec<(String, Instance)> {
        lock(&self.entries)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn lookup(&self, key: &str) -> Option<Instance> {
        lock(&self.entries).get(key).cloned()
    }

    pub fn insert(&self, key: String, value: Instance) {
        lock(&self.entries).insert(key, value);
    }
}

pub struct DictType;

fn dict(this: &Instance) -> Eval<&Arc<DictValue>> {
    match this {
        Instance::Dict(d) => Ok(d),
        other => Err(RuntimeError::internal(format!("expected Dict, got {}", other.type_name())).into()),
    }
}

fn single_key(rt: &Runtime, index: &[Instance]) -> Eval<String> {
    match index {
        [key] => key.to_text(rt),
        _ => Err(RuntimeError::InvalidIndex(format!(
            "Dict takes exactly 1 key, got {}",
            index.len()
        ))
        .into()),
    }
}

impl DataType for DictType {
    fn name(&self) -> &str {
        "Dict"
    }

    /// `Dict { k: v }`, optionally `Dict(default) { ... }`.
    fn construct(&self, rt: &Runtime, init: Option<(&Initializer, &Scope)>, args: Vec<Instance>) -> Eval {
        let default = match args.into_iter().next() {
            None => None,
            Some(f @ Instance::Function(_)) => Some(f),
            Some(other) => {
                return Err(RuntimeError::InvalidArgument(format!(
                    "default must be a function, got {}",
                    other.type_name()
                ))
                .into())
            }
        };
        let entries = match init {
            Some((Initializer::Map(pairs), scope)) => eval_entries(rt, scope, pairs)?,
            Some((Initializer::List(_), _)) => {
                return Err(RuntimeError::InvalidArgument(
                    "Dict expects a map initializer".to_string(),
                )
                .into())
            }
            None => Vec::new(),
        };
        Ok(DictValue::new(entries.into_iter().collect(), default))
    }

    /// A dict that contains itself renders the inner occurrence as `{...}`.
    fn repr(&self, rt: &Runtime, this: &Instance) -> Eval<String> {
        let d = dict(this)?;
        let Some(_guard) = rt.enter_render(Arc::as_ptr(d) as usize) else {
            return Ok("{...}".to_string());
        };
        let parts = d
            .snapshot()
            .into_iter()
            .map(|(k, v)| Ok(format!("{}: {}", k, v.repr(rt)?)))
            .collect::<Eval<Vec<String>>>()?;
        Ok(format!("{{{}}}", parts.join(", ")))
    }

    fn len(&self, _rt: &Runtime, this: &Instance) -> Eval {
        Ok(Instance::Number(lock(&dict(this)?.entries).len() as f64))
    }

    fn get_item(&self, rt: &Runtime, this: &Instance, index: &[Instance]) -> Eval {
        let d = dict(this)?;
        let key = single_key(rt, index)?;
        if let Some(value) = d.lookup(&key) {
            return Ok(value);
        }
        match &d.default {
            Some(default) => {
                // The default may itself touch this dict; no lock is held here.
                let value = call_value(rt, default, vec![Instance::string(key.as_str())])?;
                d.insert(key, value.clone());
                Ok(value)
            }
            None => Err(RuntimeError::InvalidIndex(format!("key '{}' not found", key)).into()),
        }
    }

    fn set_item(&self, rt: &Runtime, this: &Instance, index: &[Instance], value: Instance) -> Eval {
        let key = single_key(rt, index)?;
        dict(this)?.insert(key, value.clone());
        Ok(value)
    }

    /// Iterates `(key, value)` pairs of a snapshot taken now.
    fn iter(&self, _rt: &Runtime, this: &Instance) -> Eval {
        let pairs: Vec<Instance> = dict(this)?
            .snapshot()
            .into_iter()
            .map(|(k, v)| Instance::tuple(vec![Instance::string(k), v]))
            .collect();
        Ok(slice_iterator(pairs.into()))
    }

    /// `pairs as Dict`: each item must be a `(key, value)` tuple.
    fn to(&self, rt: &Runtime, source: &Instance) -> Eval {
        let mut entries = BTreeMap::new();
        for item in Pull::new(rt, source)?.collect(rt)? {
            match &item {
                Instance::Tuple(pair) if pair.len() == 2 => {
                    entries.insert(pair[0].to_text(rt)?, pair[1].clone());
                }
                other => {
                    return Err(RuntimeError::InvalidArgument(format!(
                        "Dict expects (key, value) pairs, got {}",
                        other.repr(rt)?
                    ))
                    .into())
                }
            }
        }
        Ok(DictValue::new(entries, None))
    }

    fn contains(&self, rt: &Runtime, this: &Instance, item: &Instance) -> Eval<bool> {
        let key = item.to_text(rt)?;
        Ok(dict(this)?.lookup(&key).is_some())
    }
}
