//! Custom types declared with `data`.
//!
//! A custom type owns property defaults, instance functions, static
//! functions and meta functions. Every operation first looks for the meta
//! function named after it and falls back to a default when there is none.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};

use sht_ast::{DataDef, FunctionDef, Initializer, Node};
use tracing::trace;

use crate::call::{call_value, make_function};
use crate::error::RuntimeError;
use crate::eval::{eval, eval_entries};
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::function::FunctionValue;
use crate::types::{unsupported, DataType, Meta};
use crate::value::{lock, Instance, TypeRef};

pub struct CustomType {
    this: Weak<CustomType>,
    def: Arc<DataDef>,
    scope: Scope,
    functions: HashMap<String, Arc<FunctionValue>>,
    statics: HashMap<String, Instance>,
    meta: HashMap<Meta, Instance>,
}

pub struct CustomInstance {
    ty: Arc<CustomType>,
    properties: Mutex<BTreeMap<String, Instance>>,
}

impl CustomInstance {
    pub fn custom_type(&self) -> &Arc<CustomType> {
        &self.ty
    }

    fn property(&self, name: &str) -> Option<Instance> {
        lock(&self.properties).get(name).cloned()
    }
}

fn function_def(node: &Node, type_name: &str) -> Eval<Arc<FunctionDef>> {
    match node {
        Node::FunctionDef(def) if def.name.is_some() => Ok(Arc::clone(def)),
        other => Err(RuntimeError::InvalidDefinition(format!(
            "data {} expects named functions, got {}",
            type_name,
            other.label()
        ))
        .into()),
    }
}

impl CustomType {
    /// Evaluate a `data` declaration in `scope`.
    pub(crate) fn define(rt: &Runtime, def: &Arc<DataDef>, scope: &Scope) -> Eval<Arc<CustomType>> {
        let mut functions = HashMap::new();
        for node in &def.functions {
            let f = function_def(node, &def.name)?;
            let name = f.name.clone().unwrap_or_default();
            if let Instance::Function(value) = make_function(rt, &f, scope)? {
                functions.insert(name, value);
            }
        }

        let mut statics = HashMap::new();
        for node in &def.static_functions {
            let f = function_def(node, &def.name)?;
            let name = f.name.clone().unwrap_or_default();
            statics.insert(name, make_function(rt, &f, scope)?);
        }

        let mut meta = HashMap::new();
        for node in &def.meta_functions {
            let f = function_def(node, &def.name)?;
            let name = f.name.clone().unwrap_or_default();
            let key = Meta::parse(&name).ok_or_else(|| {
                RuntimeError::InvalidDefinition(format!("unknown meta function '{}'", name))
            })?;
            meta.insert(key, make_function(rt, &f, scope)?);
        }

        Ok(Arc::new_cyclic(|this| CustomType {
            this: this.clone(),
            def: Arc::clone(def),
            scope: scope.clone(),
            functions,
            statics,
            meta,
        }))
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub(crate) fn static_member(&self, name: &str) -> Option<Instance> {
        self.statics.get(name).cloned()
    }

    fn has_property(&self, name: &str) -> bool {
        self.def.properties.iter().any(|p| p.name == name)
    }

    /// Call meta function `meta` with `this` followed by `args`, if defined.
    fn call_meta(
        &self,
        rt: &Runtime,
        meta: Meta,
        this: &Instance,
        args: Vec<Instance>,
    ) -> Option<Eval> {
        let f = self.meta.get(&meta)?;
        trace!(data = %self.name(), meta = meta.name(), "meta function");
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(this.clone());
        full.extend(args);
        Some(call_value(rt, f, full))
    }

    fn instance<'a>(&self, this: &'a Instance) -> Eval<&'a Arc<CustomInstance>> {
        match this {
            Instance::Custom(c) => Ok(c),
            other => Err(RuntimeError::internal(format!(
                "expected {}, got {}",
                self.name(),
                other.type_name()
            ))
            .into()),
        }
    }
}

impl DataType for CustomType {
    fn name(&self) -> &str {
        &self.def.name
    }

    /// Instantiate: the map initializer, then defaults for the properties it
    /// left out, then the `new` meta function with the call arguments.
    fn construct(&self, rt: &Runtime, init: Option<(&Initializer, &Scope)>, args: Vec<Instance>) -> Eval {
        let mut properties = BTreeMap::new();
        match init {
            Some((Initializer::Map(pairs), scope)) => {
                for (name, value) in eval_entries(rt, scope, pairs)? {
                    if !self.has_property(&name) {
                        return Err(RuntimeError::no_property(self.name(), name).into());
                    }
                    properties.insert(name, value);
                }
            }
            Some((Initializer::List(_), _)) => {
                return Err(RuntimeError::InvalidArgument(format!(
                    "{} expects a map initializer",
                    self.name()
                ))
                .into())
            }
            None => {}
        }
        let defaults_scope = self.scope.child();
        for property in &self.def.properties {
            if !properties.contains_key(&property.name) {
                properties.insert(property.name.clone(), eval(rt, &property.value, &defaults_scope)?);
            }
        }

        let ty = self.this.upgrade().ok_or_else(|| {
            RuntimeError::internal(format!("type {} was dropped", self.name()))
        })?;
        let instance = Instance::Custom(Arc::new(CustomInstance {
            ty,
            properties: Mutex::new(properties),
        }));

        match self.call_meta(rt, Meta::New, &instance, args.clone()) {
            Some(result) => {
                result?;
            }
            None if !args.is_empty() => {
                return Err(RuntimeError::InvalidArgument(format!(
                    "{} takes no arguments without a 'new' meta function",
                    self.name()
                ))
                .into())
            }
            None => {}
        }
        Ok(instance)
    }

    fn get(&self, rt: &Runtime, this: &Instance, name: &str) -> Eval {
        let inst = self.instance(this)?;
        if self.meta.contains_key(&Meta::Get) {
            let current = inst
                .property(name)
                .unwrap_or_else(|| Instance::error(RuntimeError::no_property(self.name(), name)));
            if let Some(result) =
                self.call_meta(rt, Meta::Get, this, vec![Instance::string(name), current])
            {
                return result;
            }
        }
        if let Some(value) = inst.property(name) {
            return Ok(value);
        }
        if let Some(f) = self.functions.get(name) {
            return Ok(f.bind(this.clone()));
        }
        Err(RuntimeError::no_property(self.name(), name).into())
    }

    fn set(&self, rt: &Runtime, this: &Instance, name: &str, value: Instance) -> Eval {
        let inst = self.instance(this)?;
        let stored = if self.meta.contains_key(&Meta::Set) {
            let old = inst
                .property(name)
                .unwrap_or_else(|| Instance::error(RuntimeError::no_property(self.name(), name)));
            match self.call_meta(rt, Meta::Set, this, vec![Instance::string(name), old, value]) {
                Some(result) => result?,
                None => return Err(unsupported(self.name(), Meta::Set).into()),
            }
        } else if inst.property(name).is_some() {
            value
        } else {
            return Err(RuntimeError::no_property(self.name(), name).into());
        };
        lock(&inst.properties).insert(name.to_string(), stored.clone());
        Ok(stored)
    }

    fn get_item(&self, rt: &Runtime, this: &Instance, index: &[Instance]) -> Eval {
        self.call_meta(rt, Meta::GetItem, this, index.to_vec())
            .unwrap_or_else(|| Err(unsupported(self.name(), Meta::GetItem).into()))
    }

    fn set_item(&self, rt: &Runtime, this: &Instance, index: &[Instance], value: Instance) -> Eval {
        let mut args = index.to_vec();
        args.push(value);
        self.call_meta(rt, Meta::SetItem, this, args)
            .unwrap_or_else(|| Err(unsupported(self.name(), Meta::SetItem).into()))
    }

    fn call(&self, rt: &Runtime, this: &Instance, args: Vec<Instance>) -> Eval {
        self.call_meta(rt, Meta::Call, this, args)
            .unwrap_or_else(|| Err(RuntimeError::NotCallable(self.name().to_string()).into()))
    }

    fn len(&self, rt: &Runtime, this: &Instance) -> Eval {
        let result = self
            .call_meta(rt, Meta::Len, this, Vec::new())
            .unwrap_or_else(|| Err(unsupported(self.name(), Meta::Len).into()))?;
        match result {
            Instance::Number(_) => Ok(result),
            other => Err(RuntimeError::MetaResult {
                meta: "len".to_string(),
                expected: "number".to_string(),
                got: other.type_name().to_string(),
            }
            .into()),
        }
    }

    fn boolean(&self, rt: &Runtime, this: &Instance) -> Eval<bool> {
        match self.call_meta(rt, Meta::Boolean, this, Vec::new()) {
            Some(result) => result?.truthy(rt),
            None => Ok(true),
        }
    }

    fn string(&self, rt: &Runtime, this: &Instance) -> Eval<String> {
        match self.call_meta(rt, Meta::String, this, Vec::new()) {
            Some(result) => result?.to_text(rt),
            None => self.repr(rt, this),
        }
    }

    fn repr(&self, rt: &Runtime, this: &Instance) -> Eval<String> {
        match self.call_meta(rt, Meta::Repr, this, Vec::new()) {
            Some(result) => result?.to_text(rt),
            None => Ok(format!("<{}>", self.name())),
        }
    }

    /// `value as T` calls the `to` meta function with the source value.
    fn to(&self, rt: &Runtime, source: &Instance) -> Eval {
        match self.meta.get(&Meta::To) {
            Some(f) => call_value(rt, f, vec![source.clone()]),
            None => Err(unsupported(self.name(), Meta::To).into()),
        }
    }

    fn contains(&self, rt: &Runtime, this: &Instance, item: &Instance) -> Eval<bool> {
        match self.call_meta(rt, Meta::In, this, vec![item.clone()]) {
            Some(result) => result?.truthy(rt),
            None => Err(unsupported(self.name(), Meta::In).into()),
        }
    }

    fn is(&self, rt: &Runtime, this: &Instance, ty: &Instance) -> Eval<bool> {
        match self.call_meta(rt, Meta::Is, this, vec![ty.clone()]) {
            Some(result) => result?.truthy(rt),
            None => match ty {
                Instance::Type(TypeRef::Custom(t)) => Ok(Arc::ptr_eq(t, &self.instance(this)?.ty)),
                _ => Ok(false),
            },
        }
    }

    fn iter(&self, rt: &Runtime, this: &Instance) -> Eval {
        let result = self
            .call_meta(rt, Meta::Iter, this, Vec::new())
            .unwrap_or_else(|| Err(unsupported(self.name(), Meta::Iter).into()))?;
        match result {
            Instance::Iterator(_) => Ok(result),
            other => Err(RuntimeError::MetaResult {
                meta: "iter".to_string(),
                expected: "iterator".to_string(),
                got: other.type_name().to_string(),
            }
            .into()),
        }
    }

    fn binary(&self, rt: &Runtime, meta: Meta, this: &Instance, other: &Instance) -> Eval {
        self.call_meta(rt, meta, this, vec![other.clone()])
            .unwrap_or_else(|| Err(unsupported(self.name(), meta).into()))
    }

    fn unary(&self, rt: &Runtime, meta: Meta, this: &Instance) -> Eval {
        match self.call_meta(rt, meta, this, Vec::new()) {
            Some(result) => result,
            None if meta == Meta::Not => Ok(Instance::Boolean(!self.boolean(rt, this)?)),
            None => Err(unsupported(self.name(), meta).into()),
        }
    }

    fn equals(&self, rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        match self.call_meta(rt, Meta::Eq, this, vec![other.clone()]) {
            Some(result) => result?.truthy(rt),
            None => Ok(this.same(other)),
        }
    }

    fn not_equals(&self, rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        match self.call_meta(rt, Meta::Neq, this, vec![other.clone()]) {
            Some(result) => result?.truthy(rt),
            None => Ok(!self.equals(rt, this, other)?),
        }
    }
}
