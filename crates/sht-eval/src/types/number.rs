//! Number: 64-bit floats.

use sht_ast::Initializer;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::iterator::Pull;
use crate::types::{unsupported, DataType, Meta};
use crate::value::Instance;

pub struct NumberType;

/// Integers print without decimals, everything else with six.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Inf" } else { "-Inf" }.to_string()
    } else if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{:.6}", n)
    }
}

fn value(this: &Instance) -> f64 {
    this.as_number().unwrap_or(f64::NAN)
}

impl DataType for NumberType {
    fn name(&self) -> &str {
        "Number"
    }

    fn construct(
        &self,
        rt: &Runtime,
        _init: Option<(&Initializer, &Scope)>,
        args: Vec<Instance>,
    ) -> Eval {
        match args.first() {
            Some(v) => self.to(rt, v),
            None => Ok(Instance::Number(0.0)),
        }
    }

    fn boolean(&self, _rt: &Runtime, this: &Instance) -> Eval<bool> {
        Ok(value(this) != 0.0)
    }

    fn repr(&self, _rt: &Runtime, this: &Instance) -> Eval<String> {
        Ok(format_number(value(this)))
    }

    fn to(&self, rt: &Runtime, source: &Instance) -> Eval {
        match source {
            Instance::Number(_) => Ok(source.clone()),
            Instance::Boolean(b) => Ok(Instance::Number(if *b { 1.0 } else { 0.0 })),
            Instance::String(s) => s.trim().parse::<f64>().map(Instance::Number).map_err(|_| {
                RuntimeError::InvalidArgument(format!("cannot convert '{}' to Number", s)).into()
            }),
            Instance::Iterator(_) => match Pull::new(rt, source)?.next_item(rt)? {
                Some(first) => self.to(rt, &first),
                None => Ok(Instance::Number(0.0)),
            },
            other => Err(RuntimeError::InvalidArgument(format!(
                "cannot convert {} to Number",
                other.type_name()
            ))
            .into()),
        }
    }

    fn binary(&self, _rt: &Runtime, meta: Meta, this: &Instance, other: &Instance) -> Eval {
        let a = value(this);
        let b = match other {
            Instance::Number(b) => *b,
            _ => {
                return Err(
                    RuntimeError::incompatible(meta.symbol(), "Number", other.type_name()).into(),
                )
            }
        };
        let result = match meta {
            Meta::Add => Instance::Number(a + b),
            Meta::Sub => Instance::Number(a - b),
            Meta::Mul => Instance::Number(a * b),
            Meta::Div => Instance::Number(a / b),
            Meta::IntDiv => Instance::Number((a / b).floor()),
            Meta::Mod => Instance::Number(a % b),
            Meta::Pow => Instance::Number(a.powf(b)),
            Meta::Gt => Instance::Boolean(a > b),
            Meta::Lt => Instance::Boolean(a < b),
            Meta::Gte => Instance::Boolean(a >= b),
            Meta::Lte => Instance::Boolean(a <= b),
            other => return Err(unsupported("Number", other).into()),
        };
        Ok(result)
    }

    fn unary(&self, _rt: &Runtime, meta: Meta, this: &Instance) -> Eval {
        let n = value(this);
        match meta {
            Meta::Pos => Ok(Instance::Number(n)),
            Meta::Neg => Ok(Instance::Number(-n)),
            Meta::Not => Ok(Instance::Boolean(n == 0.0)),
            other => Err(unsupported("Number", other).into()),
        }
    }

    fn equals(&self, _rt: &Runtime, this: &Instance, other: &Instance) -> Eval<bool> {
        Ok(matches!(other, Instance::Number(b) if value(this) == *b))
    }
}
