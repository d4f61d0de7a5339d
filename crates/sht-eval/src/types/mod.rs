//! Per-type operation tables.
//!
//! Every value dispatches its operations through a [`DataType`]: one unit
//! struct per built-in type, plus [`custom::CustomType`] for types declared
//! with `data`. Operations a type leaves out fall back to the defaults
//! below, which raise `InvalidAction` or `InvalidOperation`.

use sht_ast::Initializer;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::value::Instance;

pub mod boolean;
pub mod custom;
pub mod dict;
pub mod error;
pub mod function;
pub mod iteration;
pub mod iterator;
pub mod list;
pub mod maybe;
pub mod module;
pub mod number;
pub mod string;
pub mod tuple;
pub mod type_;

/// Names of the dispatchable operations.
///
/// Custom types key their meta functions by these names; the operator
/// spelling (`+`, `==`, ...) is accepted as an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meta {
    Set,
    Get,
    SetItem,
    GetItem,
    New,
    Call,
    Len,
    Boolean,
    String,
    Repr,
    To,
    In,
    Is,
    Iter,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Pos,
    Neg,
    Not,
}

impl Meta {
    pub fn name(&self) -> &'static str {
        match self {
            Meta::Set => "set",
            Meta::Get => "get",
            Meta::SetItem => "setItem",
            Meta::GetItem => "getItem",
            Meta::New => "new",
            Meta::Call => "call",
            Meta::Len => "len",
            Meta::Boolean => "boolean",
            Meta::String => "string",
            Meta::Repr => "repr",
            Meta::To => "to",
            Meta::In => "in",
            Meta::Is => "is",
            Meta::Iter => "iter",
            Meta::Add => "add",
            Meta::Sub => "sub",
            Meta::Mul => "mul",
            Meta::Div => "div",
            Meta::IntDiv => "intDiv",
            Meta::Mod => "mod",
            Meta::Pow => "pow",
            Meta::Eq => "eq",
            Meta::Neq => "neq",
            Meta::Gt => "gt",
            Meta::Lt => "lt",
            Meta::Gte => "gte",
            Meta::Lte => "lte",
            Meta::Pos => "pos",
            Meta::Neg => "neg",
            Meta::Not => "not",
        }
    }

    /// Spelling used in error messages: the operator symbol when there is one.
    pub fn symbol(&self) -> &'static str {
        match self {
            Meta::Add => "+",
            Meta::Sub => "-",
            Meta::Mul => "*",
            Meta::Div => "/",
            Meta::IntDiv => "//",
            Meta::Mod => "%",
            Meta::Pow => "**",
            Meta::Eq => "==",
            Meta::Neq => "!=",
            Meta::Gt => ">",
            Meta::Lt => "<",
            Meta::Gte => ">=",
            Meta::Lte => "<=",
            Meta::Pos => "unary +",
            Meta::Neg => "unary -",
            Meta::Not => "!",
            other => other.name(),
        }
    }

    /// Resolve a meta function name or operator alias.
    pub fn parse(name: &str) -> Option<Meta> {
        let meta = match name {
            "set" => Meta::Set,
            "get" => Meta::Get,
            "setItem" => Meta::SetItem,
            "getItem" => Meta::GetItem,
            "new" => Meta::New,
            "call" => Meta::Call,
            "len" => Meta::Len,
            "boolean" | "bool" => Meta::Boolean,
            "string" => Meta::String,
            "repr" => Meta::Repr,
            "to" => Meta::To,
            "in" => Meta::In,
            "is" => Meta::Is,
            "iter" => Meta::Iter,
            "add" | "+" => Meta::Add,
            "sub" | "-" => Meta::Sub,
            "mul" | "*" => Meta::Mul,
            "div" | "/" => Meta::Div,
            "intDiv" | "//" => Meta::IntDiv,
            "mod" | "%" => Meta::Mod,
            "pow" | "**" => Meta::Pow,
            "eq" | "==" => Meta::Eq,
            "neq" | "!=" => Meta::Neq,
            "gt" | ">" => Meta::Gt,
            "lt" | "<" => Meta::Lt,
            "gte" | ">=" => Meta::Gte,
            "lte" | "<=" => Meta::Lte,
            "pos" => Meta::Pos,
            "neg" => Meta::Neg,
            "not" | "!" | "bang" => Meta::Not,
            _ => return None,
        };
        Some(meta)
    }

    /// Whether this is an operator (as opposed to an action) for error reporting.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Meta::Add
                | Meta::Sub
                | Meta::Mul
                | Meta::Div
                | Meta::IntDiv
                | Meta::Mod
                | Meta::Pow
                | Meta::Eq
                | Meta::Neq
                | Meta::Gt
                | Meta::Lt
                | Meta::Gte
                | Meta::Lte
                | Meta::Pos
                | Meta::Neg
                | Meta::Not
        )
    }
}

pub(crate) fn unsupported(type_name: &str, meta: Meta) -> RuntimeError {
    if meta.is_operator() {
        RuntimeError::invalid_operation(type_name, meta.symbol())
    } else {
        RuntimeError::invalid_action(type_name, meta.name())
    }
}

/// Operation table of a type.
///
/// `this` is always an instance of the implementing type, except for
/// [`DataType::construct`] and [`DataType::to`], which produce one.
pub trait DataType: Send + Sync {
    fn name(&self) -> &str;

    /// Build a new instance from call arguments and an optional initializer
    /// (evaluated in the given scope).
    fn construct(
        &self,
        _rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        _args: Vec<Instance>,
    ) -> Eval {
        Err(unsupported(self.name(), Meta::New).into())
    }

    fn get(&self, _rt: &Runtime, _this: &Instance, name: &str) -> Eval {
        Err(RuntimeError::no_property(self.name(), name).into())
    }

    fn set(&self, _rt: &Runtime, _this: &Instance, _name: &str, _value: Instance) -> Eval {
        Err(unsupported(self.name(), Meta::Set).into())
    }

    fn get_item(&self, _rt: &Runtime, _this: &Instance, _index: &[Instance]) -> Eval {
        Err(unsupported(self.name(), Meta::GetItem).into())
    }

    fn set_item(
        &self,
        _rt: &Runtime,
        _this: &Instance,
        _index: &[Instance],
        _value: Instance,
    ) -> Eval {
        Err(unsupported(self.name(), Meta::SetItem).into())
    }

    fn call(&self, _rt: &Runtime, _this: &Instance, _args: Vec<Instance>) -> Eval {
        Err(unsupported(self.name(), Meta::Call).into())
    }

    fn len(&self, _rt: &Runtime, _this: &Instance) -> Eval {
        Err(unsupported(self.name(), Meta::Len).into())
    }

    /// Truthiness. Defaults to true.
    fn boolean(&self, _rt: &Runtime, _this: &Instance) -> Eval<bool> {
        Ok(true)
    }

    /// String conversion. Defaults to the representation.
    fn string(&self, rt: &Runtime, this: &Instance) -> Eval<String> {
        self.repr(rt, this)
    }

    fn repr(&self, _rt: &Runtime, _this: &Instance) -> Eval<String> {
        Ok(format!("<{}>", self.name()))
    }

    /// Convert `value` into an instance of this type (`value as T`).
    fn to(&self, _rt: &Runtime, _value: &Instance) -> Eval {
        Err(unsupported(self.name(), Meta::To).into())
    }

    /// Containment test for `item in this`.
    fn contains(&self, _rt: &Runtime, _this: &Instance, _item: &Instance) -> Eval<bool> {
        Err(unsupported(self.name(), Meta::In).into())
    }

    /// Type test for `this is ty`.
    fn is(&self, _rt: &Runtime, this: &Instance, ty: &Instance) -> Eval<bool> {
        match ty {
            Instance::Type(t) => Ok(this.type_ref() == *t),
            other => Err(RuntimeError::incompatible("is", this.type_name(), other.type_name()).into()),
        }
    }

    /// An Iterator over `this`.
    fn iter(&self, _rt: &Runtime, _this: &Instance) -> Eval {
        Err(unsupported(self.name(), Meta::Iter).into())
    }

    /// Arithmetic and ordering: `meta` is one of Add, Sub, Mul, Div, IntDiv,
    /// Mod, Pow, Gt, Lt, Gte, Lte.
    fn binary(&self, _rt: &Runtime, meta: Meta, _this: &Instance, _other: &Instance) -> Eval {
        Err(unsupported(self.name(), meta).into())
    }

    /// Prefix operators: `meta` is Pos, Neg or Not.
    fn unary(&self, rt: &Runtime, meta: Meta, this: &Instance) -> Eval {
        match meta {
            Meta::Not => Ok(Instance::Boolean(!self.boolean(rt, this)?)),
            other => Err(unsupported(self.name(), other).into()),
        }
    }

    /// Equality. Defaults to identity.
    fn equals(&self, _rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        Ok(this.same(other))
    }

    fn not_equals(&self, rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        Ok(!self.equals(rt, this, other)?)
    }
}

/// Fetch argument `index` or raise `MissingArgument`.
pub(crate) fn arg<'a>(args: &'a [Instance], index: usize, name: &str) -> Eval<&'a Instance> {
    args.get(index)
        .ok_or_else(|| RuntimeError::MissingArgument(name.to_string()).into())
}

/// Fetch a numeric argument.
pub(crate) fn number_arg(args: &[Instance], index: usize, name: &str) -> Eval<f64> {
    let value = arg(args, index, name)?;
    value.as_number().ok_or_else(|| {
        RuntimeError::InvalidArgument(format!(
            "'{}' must be a Number, got {}",
            name,
            value.type_name()
        ))
        .into()
    })
}

/// Join representations with `sep`.
pub(crate) fn join_repr(rt: &Runtime, values: &[Instance], sep: &str) -> Eval<String> {
    let parts = values
        .iter()
        .map(|v| v.repr(rt))
        .collect::<Eval<Vec<String>>>()?;
    Ok(parts.join(sep))
}

/// Resolve a sequence index against `len`, accepting only integral,
/// in-range numbers. `end` allows `len` itself (slice end).
pub(crate) fn resolve_index(
    type_name: &str,
    value: &Instance,
    len: usize,
    end: bool,
) -> Eval<usize> {
    let n = value.as_number().ok_or_else(|| {
        RuntimeError::InvalidIndex(format!("{} index must be a Number, got {}", type_name, value.type_name()))
    })?;
    let limit = if end { len } else { len.saturating_sub(1) };
    if n.fract() != 0.0 || n < 0.0 || n > limit as f64 || (!end && len == 0) {
        return Err(RuntimeError::out_of_bounds(type_name, format_index(n), len).into());
    }
    Ok(n as usize)
}

/// Slice bounds `[start, end)` of a sequence of length `len`.
pub(crate) fn resolve_slice(
    type_name: &str,
    start: &Instance,
    end: &Instance,
    len: usize,
) -> Eval<(usize, usize)> {
    let s = resolve_index(type_name, start, len, true)?;
    let e = resolve_index(type_name, end, len, true)?;
    if e < s {
        return Err(RuntimeError::InvalidIndex(format!(
            "slice end {} is before start {}",
            e, s
        ))
        .into());
    }
    Ok((s, e))
}

fn format_index(n: f64) -> String {
    number::format_number(n)
}
