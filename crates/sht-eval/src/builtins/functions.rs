//! `print`, `len` and the numeric sequence producers.

use std::sync::Mutex;

use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::types::function::FunctionValue;
use crate::types::iteration::IterationValue;
use crate::types::iterator::native_iterator;
use crate::types::{arg, number_arg};
use crate::value::{lock, Instance};

pub(super) fn all() -> Vec<(&'static str, Instance)> {
    vec![
        ("print", FunctionValue::native("print", print)),
        ("len", FunctionValue::native("len", len)),
        ("range", FunctionValue::native("range", range)),
        ("fibonacci", FunctionValue::native("fibonacci", |_rt, _args| Ok(fibonacci()))),
        ("primes", FunctionValue::native("primes", |_rt, _args| Ok(primes()))),
    ]
}

/// Print the string conversions of all arguments, separated by spaces.
fn print(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let parts = args
        .iter()
        .map(|a| a.to_text(rt))
        .collect::<Eval<Vec<String>>>()?;
    rt.print(parts.join(" ")).map_err(RuntimeError::Internal)?;
    Ok(Instance::Boolean(false))
}

fn len(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let value = arg(&args, 0, "value")?;
    value.data_type().len(rt, value)
}

/// Bounds of a numeric range, stop exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    start: f64,
    stop: f64,
    step: f64,
}

impl Range {
    /// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`.
    /// Without a step the range counts towards `stop` by 1.
    fn from_args(args: &[Instance]) -> Eval<Range> {
        let range = match args.len() {
            0 => return Err(RuntimeError::MissingArgument("stop".to_string()).into()),
            1 => Range {
                start: 0.0,
                stop: number_arg(args, 0, "stop")?,
                step: 1.0,
            },
            2 => {
                let start = number_arg(args, 0, "start")?;
                let stop = number_arg(args, 1, "stop")?;
                let step = if start <= stop { 1.0 } else { -1.0 };
                Range { start, stop, step }
            }
            _ => Range {
                start: number_arg(args, 0, "start")?,
                stop: number_arg(args, 1, "stop")?,
                step: number_arg(args, 2, "step")?,
            },
        };
        if range.step == 0.0 || range.step.is_nan() {
            return Err(RuntimeError::InvalidArgument("range step cannot be 0".to_string()).into());
        }
        Ok(range)
    }

    fn contains(&self, n: f64) -> bool {
        if self.step > 0.0 {
            n < self.stop
        } else {
            n > self.stop
        }
    }
}

fn range(_rt: &Runtime, args: Vec<Instance>) -> Eval {
    let range = Range::from_args(&args)?;
    let current = Mutex::new(range.start);
    Ok(native_iterator(move |rt| {
        let mut n = lock(&current);
        if !range.contains(*n) {
            return Ok(rt.done());
        }
        let value = *n;
        *n += range.step;
        Ok(IterationValue::item(Instance::Number(value)))
    }))
}

/// Unbounded Fibonacci sequence starting at 0.
fn fibonacci() -> Instance {
    let state = Mutex::new((0.0_f64, 1.0_f64));
    native_iterator(move |_rt| {
        let mut pair = lock(&state);
        let (a, b) = *pair;
        *pair = (b, a + b);
        Ok(IterationValue::item(Instance::Number(a)))
    })
}

/// Unbounded sequence of primes, by trial division against the primes
/// found so far.
fn primes() -> Instance {
    let found: Mutex<Vec<u64>> = Mutex::new(Vec::new());
    native_iterator(move |_rt| {
        let mut found = lock(&found);
        let mut candidate = found.last().map_or(2, |p| p + 1);
        loop {
            let is_prime = found
                .iter()
                .take_while(|p| *p * *p <= candidate)
                .all(|p| candidate % p != 0);
            if is_prime {
                found.push(candidate);
                return Ok(IterationValue::item(Instance::Number(candidate as f64)));
            }
            candidate += 1;
        }
    })
}
