//! Type: types as first-class values.
//!
//! Calling a type constructs an instance; property access reads static
//! members.

use sht_ast::Initializer;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::value::{Builtin, Instance, TypeRef};
use crate::types::DataType;

pub struct TypeType;

fn type_ref(this: &Instance) -> Eval<&TypeRef> {
    match this {
        Instance::Type(t) => Ok(t),
        other => Err(RuntimeError::internal(format!("expected Type, got {}", other.type_name())).into()),
    }
}

/// Static members of the built-in types.
fn builtin_static(rt: &Runtime, builtin: Builtin, name: &str) -> Option<Instance> {
    let value = match (builtin, name) {
        (Builtin::Number, "ZERO") => Instance::Number(0.0),
        (Builtin::Number, "ONE") => Instance::Number(1.0),
        (Builtin::Boolean, "TRUE") => Instance::Boolean(true),
        (Builtin::Boolean, "FALSE") => Instance::Boolean(false),
        (Builtin::String, "EMPTY") => rt.empty_string(),
        (Builtin::Iteration, "DONE") => rt.done(),
        _ => return None,
    };
    Some(value)
}

impl DataType for TypeType {
    fn name(&self) -> &str {
        "Type"
    }

    /// `Type(value)`: the type of a value.
    fn construct(
        &self,
        _rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        match args.first() {
            Some(v) => Ok(Instance::Type(v.type_ref())),
            None => Err(RuntimeError::MissingArgument("value".to_string()).into()),
        }
    }

    fn get(&self, rt: &Runtime, this: &Instance, name: &str) -> Eval {
        match type_ref(this)? {
            TypeRef::Builtin(b) => builtin_static(rt, *b, name)
                .ok_or_else(|| RuntimeError::no_property(b.name(), name).into()),
            TypeRef::Custom(c) => c
                .static_member(name)
                .ok_or_else(|| RuntimeError::no_property(c.name(), name).into()),
        }
    }

    /// Calling a type value constructs an instance without an initializer.
    fn call(&self, rt: &Runtime, this: &Instance, args: Vec<Instance>) -> Eval {
        type_ref(this)?.data_type().construct(rt, None, args)
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        Ok(type_ref(this)?.name().to_string())
    }

    fn equals(&self, _rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        match other {
            Instance::Type(o) => Ok(type_ref(this)? == o),
            _ => Ok(false),
        }
    }
}
