//! Runtime values.
//!
//! An [`Instance`] pairs a type with its payload. Scalars are stored inline;
//! everything else sits behind an `Arc` so copies share one payload and
//! identity comparisons are pointer comparisons.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::types::custom::{CustomInstance, CustomType};
use crate::types::dict::DictValue;
use crate::types::error::ErrorValue;
use crate::types::function::FunctionValue;
use crate::types::iteration::IterationValue;
use crate::types::iterator::IteratorValue;
use crate::types::list::ListValue;
use crate::types::maybe::MaybeValue;
use crate::types::module::ModuleValue;
use crate::types::{self, DataType};

/// Lock a mutex, recovering the data if another thread panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A runtime value.
#[derive(Clone)]
pub enum Instance {
    Number(f64),
    Boolean(bool),
    String(Arc<str>),
    /// Immutable ordered sequence.
    Tuple(Arc<[Instance]>),
    List(Arc<ListValue>),
    Dict(Arc<DictValue>),
    Function(Arc<FunctionValue>),
    Iterator(Arc<IteratorValue>),
    Iteration(Arc<IterationValue>),
    Maybe(Arc<MaybeValue>),
    Error(Arc<ErrorValue>),
    /// A type used as a value: `Number`, `Point`.
    Type(TypeRef),
    Module(Arc<ModuleValue>),
    Custom(Arc<CustomInstance>),
}

/// The built-in types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Number,
    Boolean,
    String,
    Tuple,
    List,
    Dict,
    Function,
    Iterator,
    Iteration,
    Maybe,
    Error,
    Type,
    Module,
}

impl Builtin {
    pub const ALL: [Builtin; 13] = [
        Builtin::Number,
        Builtin::Boolean,
        Builtin::String,
        Builtin::Tuple,
        Builtin::List,
        Builtin::Dict,
        Builtin::Function,
        Builtin::Iterator,
        Builtin::Iteration,
        Builtin::Maybe,
        Builtin::Error,
        Builtin::Type,
        Builtin::Module,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Number => "Number",
            Builtin::Boolean => "Boolean",
            Builtin::String => "String",
            Builtin::Tuple => "Tuple",
            Builtin::List => "List",
            Builtin::Dict => "Dict",
            Builtin::Function => "Function",
            Builtin::Iterator => "Iterator",
            Builtin::Iteration => "Iteration",
            Builtin::Maybe => "Maybe",
            Builtin::Error => "Error",
            Builtin::Type => "Type",
            Builtin::Module => "Module",
        }
    }

    pub fn data_type(&self) -> &'static dyn DataType {
        match self {
            Builtin::Number => &types::number::NumberType,
            Builtin::Boolean => &types::boolean::BooleanType,
            Builtin::String => &types::string::StringType,
            Builtin::Tuple => &types::tuple::TupleType,
            Builtin::List => &types::list::ListType,
            Builtin::Dict => &types::dict::DictType,
            Builtin::Function => &types::function::FunctionType,
            Builtin::Iterator => &types::iterator::IteratorType,
            Builtin::Iteration => &types::iteration::IterationType,
            Builtin::Maybe => &types::maybe::MaybeType,
            Builtin::Error => &types::error::ErrorType,
            Builtin::Type => &types::type_::TypeType,
            Builtin::Module => &types::module::ModuleType,
        }
    }
}

/// A type as a first-class value.
#[derive(Clone)]
pub enum TypeRef {
    Builtin(Builtin),
    Custom(Arc<CustomType>),
}

impl TypeRef {
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Builtin(b) => b.name(),
            TypeRef::Custom(c) => c.name(),
        }
    }

    pub fn data_type(&self) -> &dyn DataType {
        match self {
            TypeRef::Builtin(b) => b.data_type(),
            TypeRef::Custom(c) => c.as_ref(),
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Builtin(a), TypeRef::Builtin(b)) => a == b,
            (TypeRef::Custom(a), TypeRef::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Instance {
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Instance::String(value.into())
    }

    pub fn tuple(values: Vec<Instance>) -> Self {
        Instance::Tuple(values.into())
    }

    /// Build an Error instance from a language error.
    pub fn error(error: RuntimeError) -> Self {
        Instance::Error(Arc::new(ErrorValue::from(error)))
    }

    pub fn builtin_type(builtin: Builtin) -> Self {
        Instance::Type(TypeRef::Builtin(builtin))
    }

    pub fn type_ref(&self) -> TypeRef {
        match self {
            Instance::Custom(c) => TypeRef::Custom(Arc::clone(c.custom_type())),
            other => TypeRef::Builtin(other.builtin()),
        }
    }

    fn builtin(&self) -> Builtin {
        match self {
            Instance::Number(_) => Builtin::Number,
            Instance::Boolean(_) => Builtin::Boolean,
            Instance::String(_) => Builtin::String,
            Instance::Tuple(_) => Builtin::Tuple,
            Instance::List(_) => Builtin::List,
            Instance::Dict(_) => Builtin::Dict,
            Instance::Function(_) => Builtin::Function,
            Instance::Iterator(_) => Builtin::Iterator,
            Instance::Iteration(_) => Builtin::Iteration,
            Instance::Maybe(_) => Builtin::Maybe,
            Instance::Error(_) => Builtin::Error,
            Instance::Type(_) => Builtin::Type,
            Instance::Module(_) => Builtin::Module,
            // Only reachable through `type_ref`, which handles custom
            // instances first.
            Instance::Custom(_) => Builtin::Type,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Instance::Custom(c) => c.custom_type().name(),
            other => other.builtin().name(),
        }
    }

    /// Operation table for this value's type.
    pub fn data_type(&self) -> &dyn DataType {
        match self {
            Instance::Custom(c) => c.custom_type().as_ref(),
            other => other.builtin().data_type(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Instance::Error(_))
    }

    /// Identity: same scalar value, or same shared payload.
    pub fn same(&self, other: &Instance) -> bool {
        match (self, other) {
            (Instance::Number(a), Instance::Number(b)) => a == b,
            (Instance::Boolean(a), Instance::Boolean(b)) => a == b,
            (Instance::String(a), Instance::String(b)) => Arc::ptr_eq(a, b) || a == b,
            (Instance::Tuple(a), Instance::Tuple(b)) => Arc::ptr_eq(a, b),
            (Instance::List(a), Instance::List(b)) => Arc::ptr_eq(a, b),
            (Instance::Dict(a), Instance::Dict(b)) => Arc::ptr_eq(a, b),
            (Instance::Function(a), Instance::Function(b)) => Arc::ptr_eq(a, b),
            (Instance::Iterator(a), Instance::Iterator(b)) => Arc::ptr_eq(a, b),
            (Instance::Iteration(a), Instance::Iteration(b)) => Arc::ptr_eq(a, b),
            (Instance::Maybe(a), Instance::Maybe(b)) => Arc::ptr_eq(a, b),
            (Instance::Error(a), Instance::Error(b)) => Arc::ptr_eq(a, b),
            (Instance::Type(a), Instance::Type(b)) => a == b,
            (Instance::Module(a), Instance::Module(b)) => Arc::ptr_eq(a, b),
            (Instance::Custom(a), Instance::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn repr(&self, rt: &Runtime) -> Eval<String> {
        self.data_type().repr(rt, self)
    }

    /// String conversion, as used by `..`, `print` and `as String`.
    pub fn to_text(&self, rt: &Runtime) -> Eval<String> {
        self.data_type().string(rt, self)
    }

    pub fn truthy(&self, rt: &Runtime) -> Eval<bool> {
        self.data_type().boolean(rt, self)
    }

    pub fn equals(&self, rt: &Runtime, other: &Instance) -> Eval<bool> {
        self.data_type().equals(rt, self, other)
    }

    pub fn get(&self, rt: &Runtime, name: &str) -> Eval {
        self.data_type().get(rt, self, name)
    }

    /// An Iterator over this value.
    pub fn iterate(&self, rt: &Runtime) -> Eval {
        self.data_type().iter(rt, self)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Instance::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Number(n) => write!(f, "Number({})", n),
            Instance::Boolean(b) => write!(f, "Boolean({})", b),
            Instance::String(s) => write!(f, "String({:?})", s),
            Instance::Tuple(values) => f.debug_tuple("Tuple").field(&values.as_ref()).finish(),
            Instance::Error(e) => write!(f, "Error({:?})", e.message()),
            Instance::Type(t) => write!(f, "Type({})", t.name()),
            other => write!(f, "<{}>", other.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Instance::Number(1.0).type_name(), "Number");
        assert_eq!(Instance::string("x").type_name(), "String");
        assert_eq!(Instance::tuple(vec![]).type_name(), "Tuple");
        assert_eq!(Instance::builtin_type(Builtin::List).type_name(), "Type");
    }

    #[test]
    fn test_identity() {
        let t = Instance::tuple(vec![Instance::Number(1.0)]);
        assert!(t.same(&t.clone()));
        assert!(!t.same(&Instance::tuple(vec![Instance::Number(1.0)])));
        assert!(Instance::Number(2.0).same(&Instance::Number(2.0)));
        assert!(Instance::builtin_type(Builtin::Number).same(&Instance::builtin_type(Builtin::Number)));
    }
}
