//! The `math` module.

use std::collections::BTreeMap;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::types::function::FunctionValue;
use crate::types::module::ModuleValue;
use crate::types::number_arg;
use crate::value::Instance;

fn unary(name: &'static str, f: fn(f64) -> f64) -> (&'static str, Instance) {
    let function = FunctionValue::native(name, move |_rt, args| {
        Ok(Instance::Number(f(number_arg(&args, 0, "x")?)))
    });
    (name, function)
}

fn binary(name: &'static str, f: fn(f64, f64) -> f64) -> (&'static str, Instance) {
    let function = FunctionValue::native(name, move |_rt, args| {
        Ok(Instance::Number(f(number_arg(&args, 0, "x")?, number_arg(&args, 1, "y")?)))
    });
    (name, function)
}

/// Fold all (at least one) numeric arguments with `f`.
fn variadic(name: &'static str, f: fn(f64, f64) -> f64) -> (&'static str, Instance) {
    let function = FunctionValue::native(name, move |_rt, args| {
        let mut acc = number_arg(&args, 0, "x")?;
        for i in 1..args.len() {
            acc = f(acc, number_arg(&args, i, "x")?);
        }
        Ok(Instance::Number(acc))
    });
    (name, function)
}

fn integer(value: f64, name: &str) -> Eval<u64> {
    if value.fract() != 0.0 || !value.is_finite() {
        return Err(RuntimeError::InvalidArgument(format!("'{}' must be an integer", name)).into());
    }
    Ok(value.abs() as u64)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn factorial(n: f64) -> Eval<f64> {
    if n < 0.0 {
        return Err(RuntimeError::InvalidArgument(
            "factorial is undefined for negative numbers".to_string(),
        )
        .into());
    }
    let n = integer(n, "n")?;
    Ok((1..=n).fold(1.0, |acc, k| acc * k as f64))
}

pub(super) fn module() -> Instance {
    let mut members: BTreeMap<String, Instance> = [
        unary("abs", f64::abs),
        unary("ceil", f64::ceil),
        unary("floor", f64::floor),
        unary("round", f64::round),
        unary("sqrt", f64::sqrt),
        unary("cbrt", f64::cbrt),
        unary("exp", f64::exp),
        unary("sin", f64::sin),
        unary("cos", f64::cos),
        unary("tan", f64::tan),
        unary("asin", f64::asin),
        unary("acos", f64::acos),
        unary("atan", f64::atan),
        unary("deg2rad", f64::to_radians),
        unary("rad2deg", f64::to_degrees),
        binary("pow", f64::powf),
        binary("atan2", f64::atan2),
        binary("hypot", f64::hypot),
        variadic("min", f64::min),
        variadic("max", f64::max),
    ]
    .into_iter()
    .map(|(name, f)| (name.to_string(), f))
    .collect();

    // log(x) is the natural logarithm; log(x, base) any other.
    members.insert(
        "log".to_string(),
        FunctionValue::native("log", |_rt, args| {
            let x = number_arg(&args, 0, "x")?;
            match args.len() {
                1 => Ok(Instance::Number(x.ln())),
                _ => Ok(Instance::Number(x.log(number_arg(&args, 1, "base")?))),
            }
        }),
    );
    members.insert(
        "gcd".to_string(),
        FunctionValue::native("gcd", |_rt, args| {
            let a = integer(number_arg(&args, 0, "a")?, "a")?;
            let b = integer(number_arg(&args, 1, "b")?, "b")?;
            Ok(Instance::Number(gcd(a, b) as f64))
        }),
    );
    members.insert(
        "factorial".to_string(),
        FunctionValue::native("factorial", |_rt, args| {
            Ok(Instance::Number(factorial(number_arg(&args, 0, "n")?)?))
        }),
    );
    members.insert("pi".to_string(), Instance::Number(std::f64::consts::PI));
    members.insert("e".to_string(), Instance::Number(std::f64::consts::E));

    ModuleValue::new("math", members)
}
