//! Function: closures over script bodies, and native functions.

use std::sync::Arc;

use sht_ast::FunctionDef;

use crate::call::call_function;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::DataType;
use crate::value::Instance;

/// Signature of functions implemented in Rust. Receives the evaluated
/// arguments, with any bound receiver first.
pub type NativeFn = Arc<dyn Fn(&Runtime, Vec<Instance>) -> Eval + Send + Sync>;

pub enum Body {
    /// A script function closing over its defining scope. Parameter
    /// defaults are evaluated once, at definition.
    Script {
        def: Arc<FunctionDef>,
        scope: Scope,
        defaults: Vec<Option<Instance>>,
        /// Whether the body yields, resolved once from `def`.
        generator: bool,
    },
    Native(NativeFn),
}

pub struct FunctionValue {
    name: Option<String>,
    body: Arc<Body>,
    receiver: Option<Instance>,
}

impl FunctionValue {
    pub fn script(def: Arc<FunctionDef>, scope: Scope, defaults: Vec<Option<Instance>>) -> Instance {
        Instance::Function(Arc::new(FunctionValue {
            name: def.name.clone(),
            body: Arc::new(Body::Script {
                generator: def.is_generator(),
                def,
                scope,
                defaults,
            }),
            receiver: None,
        }))
    }

    pub fn native<F>(name: &str, f: F) -> Instance
    where
        F: Fn(&Runtime, Vec<Instance>) -> Eval + Send + Sync + 'static,
    {
        Instance::Function(Arc::new(FunctionValue {
            name: Some(name.to_string()),
            body: Arc::new(Body::Native(Arc::new(f))),
            receiver: None,
        }))
    }

    /// A copy of this function that passes `receiver` as its first argument.
    pub fn bind(&self, receiver: Instance) -> Instance {
        Instance::Function(Arc::new(FunctionValue {
            name: self.name.clone(),
            body: Arc::clone(&self.body),
            receiver: Some(receiver),
        }))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn receiver(&self) -> Option<&Instance> {
        self.receiver.as_ref()
    }
}

pub struct FunctionType;

impl DataType for FunctionType {
    fn name(&self) -> &str {
        "Function"
    }

    fn call(&self, rt: &Runtime, this: &Instance, args: Vec<Instance>) -> Eval {
        match this {
            Instance::Function(f) => call_function(rt, f, args),
            other => Err(crate::error::RuntimeError::NotCallable(other.type_name().to_string()).into()),
        }
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        match this {
            Instance::Function(f) => match f.name() {
                Some(name) => Ok(format!("<function:{}>", name)),
                None => Ok("<function>".to_string()),
            },
            _ => Ok("<function>".to_string()),
        }
    }
}
