//! Module: a named, read-only namespace of values.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::types::DataType;
use crate::value::Instance;

pub struct ModuleValue {
    name: String,
    members: BTreeMap<String, Instance>,
}

impl ModuleValue {
    pub fn new(name: &str, members: BTreeMap<String, Instance>) -> Instance {
        Instance::Module(Arc::new(ModuleValue {
            name: name.to_string(),
            members,
        }))
    }
}

pub struct ModuleType;

impl DataType for ModuleType {
    fn name(&self) -> &str {
        "Module"
    }

    fn get(&self, _rt: &Runtime, this: &Instance, name: &str) -> Eval {
        match this {
            Instance::Module(m) => m.members.get(name).cloned().ok_or_else(|| {
                RuntimeError::no_property(format!("Module:{}", m.name), name).into()
            }),
            _ => Err(RuntimeError::no_property("Module", name).into()),
        }
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        match this {
            Instance::Module(m) => Ok(format!("<Module:{}>", m.name)),
            _ => Ok("<Module>".to_string()),
        }
    }
}
