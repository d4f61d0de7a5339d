//! Sequence combinators.
//!
//! Each takes an iterable first (the left side of a pipe) and returns a new
//! Iterator pulling from it lazily. Reductions (`reduce`, `sum`, `multiply`,
//! `min`, `max`, `first`, `last`) return an Iterator with a single step
//! holding the result, or none for an empty input where there is no
//! neutral value.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::call::call_value;
use crate::error::RuntimeError;
use crate::flow::Eval;
use crate::runtime::Runtime;
use crate::types::function::FunctionValue;
use crate::types::iteration::IterationValue;
use crate::types::iterator::{native_iterator, Pull};
use crate::types::{arg, number_arg, Meta};
use crate::value::{lock, Instance};

pub(super) fn all() -> Vec<(&'static str, Instance)> {
    vec![
        ("map", FunctionValue::native("map", map)),
        ("filter", FunctionValue::native("filter", filter)),
        ("reduce", FunctionValue::native("reduce", reduce)),
        ("take", FunctionValue::native("take", take)),
        ("takeWhile", FunctionValue::native("takeWhile", take_while)),
        ("window", FunctionValue::native("window", window)),
        ("each", FunctionValue::native("each", each)),
        ("sum", FunctionValue::native("sum", |rt, args| fold(rt, args, Meta::Add, 0.0))),
        ("multiply", FunctionValue::native("multiply", |rt, args| fold(rt, args, Meta::Mul, 1.0))),
        ("min", FunctionValue::native("min", |rt, args| extreme(rt, args, Meta::Lt))),
        ("max", FunctionValue::native("max", |rt, args| extreme(rt, args, Meta::Gt))),
        ("first", FunctionValue::native("first", first)),
        ("last", FunctionValue::native("last", last)),
    ]
}

fn upstream(rt: &Runtime, args: &[Instance]) -> Eval<Arc<Pull>> {
    Ok(Arc::new(Pull::new(rt, arg(args, 0, "iterable")?)?))
}

fn callable(args: &[Instance], index: usize, name: &str) -> Eval<Instance> {
    match arg(args, index, name)? {
        f @ (Instance::Function(_) | Instance::Type(_) | Instance::Custom(_)) => Ok(f.clone()),
        other => Err(RuntimeError::InvalidArgument(format!(
            "'{}' must be callable, got {}",
            name,
            other.type_name()
        ))
        .into()),
    }
}

fn count_arg(args: &[Instance], index: usize, name: &str) -> Eval<usize> {
    let n = number_arg(args, index, name)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(RuntimeError::InvalidArgument(format!(
            "'{}' must be a non-negative integer",
            name
        ))
        .into());
    }
    Ok(n as usize)
}

/// An Iterator with one step computed on first pull.
fn single<F>(compute: F) -> Instance
where
    F: Fn(&Runtime) -> Eval<Option<Instance>> + Send + Sync + 'static,
{
    let spent = AtomicBool::new(false);
    native_iterator(move |rt| {
        if spent.swap(true, Ordering::SeqCst) {
            return Ok(rt.done());
        }
        Ok(match compute(rt)? {
            Some(value) => IterationValue::item(value),
            None => rt.done(),
        })
    })
}

/// `iterable | map f`: `f` receives each step's values as arguments.
fn map(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    let f = callable(&args, 1, "function")?;
    Ok(native_iterator(move |rt| match source.next(rt)? {
        Some(step) => Ok(IterationValue::item(call_value(rt, &f, step.payload().to_vec())?)),
        None => Ok(rt.done()),
    }))
}

fn filter(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    let f = callable(&args, 1, "predicate")?;
    Ok(native_iterator(move |rt| {
        while let Some(step) = source.next(rt)? {
            if call_value(rt, &f, step.payload().to_vec())?.truthy(rt)? {
                return Ok(IterationValue::values(step.payload().to_vec()));
            }
        }
        Ok(rt.done())
    }))
}

/// `iterable | each f`: calls `f` for its effect and passes the step through.
fn each(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    let f = callable(&args, 1, "function")?;
    Ok(native_iterator(move |rt| match source.next(rt)? {
        Some(step) => {
            call_value(rt, &f, step.payload().to_vec())?;
            Ok(IterationValue::values(step.payload().to_vec()))
        }
        None => Ok(rt.done()),
    }))
}

fn take(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    let limit = count_arg(&args, 1, "count")?;
    let taken = AtomicUsize::new(0);
    Ok(native_iterator(move |rt| {
        if taken.load(Ordering::SeqCst) >= limit {
            return Ok(rt.done());
        }
        match source.next(rt)? {
            Some(step) => {
                taken.fetch_add(1, Ordering::SeqCst);
                Ok(IterationValue::values(step.payload().to_vec()))
            }
            None => Ok(rt.done()),
        }
    }))
}

fn take_while(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    let f = callable(&args, 1, "predicate")?;
    let stopped = AtomicBool::new(false);
    Ok(native_iterator(move |rt| {
        if stopped.load(Ordering::SeqCst) {
            return Ok(rt.done());
        }
        match source.next(rt)? {
            Some(step) if call_value(rt, &f, step.payload().to_vec())?.truthy(rt)? => {
                Ok(IterationValue::values(step.payload().to_vec()))
            }
            _ => {
                stopped.store(true, Ordering::SeqCst);
                Ok(rt.done())
            }
        }
    }))
}

/// `iterable | window n`: overlapping Tuples of `n` consecutive items.
fn window(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    let size = count_arg(&args, 1, "size")?;
    if size == 0 {
        return Err(RuntimeError::InvalidArgument("window size must be positive".to_string()).into());
    }
    let buffer: Mutex<VecDeque<Instance>> = Mutex::new(VecDeque::with_capacity(size));
    Ok(native_iterator(move |rt| {
        let mut buffer = lock(&buffer);
        if buffer.len() == size {
            buffer.pop_front();
        }
        while buffer.len() < size {
            match source.next_item(rt)? {
                Some(item) => buffer.push_back(item),
                None => return Ok(rt.done()),
            }
        }
        Ok(IterationValue::item(Instance::tuple(buffer.iter().cloned().collect())))
    }))
}

/// `iterable | reduce f`, or `reduce(iterable, f, initial)`.
fn reduce(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    let f = callable(&args, 1, "function")?;
    let initial = args.get(2).cloned();
    Ok(single(move |rt| {
        let mut acc = match &initial {
            Some(value) => value.clone(),
            None => match source.next_item(rt)? {
                Some(first) => first,
                None => return Ok(None),
            },
        };
        while let Some(item) = source.next_item(rt)? {
            acc = call_value(rt, &f, vec![acc, item])?;
        }
        Ok(Some(acc))
    }))
}

/// Combine all items with `meta`, starting from `neutral`.
fn fold(rt: &Runtime, args: Vec<Instance>, meta: Meta, neutral: f64) -> Eval {
    let source = upstream(rt, &args)?;
    Ok(single(move |rt| {
        let mut acc = match source.next_item(rt)? {
            Some(first) => first,
            None => return Ok(Some(Instance::Number(neutral))),
        };
        while let Some(item) = source.next_item(rt)? {
            acc = acc.data_type().binary(rt, meta, &acc, &item)?;
        }
        Ok(Some(acc))
    }))
}

/// The item that wins every `meta` comparison (`Lt` for min, `Gt` for max).
fn extreme(rt: &Runtime, args: Vec<Instance>, meta: Meta) -> Eval {
    let source = upstream(rt, &args)?;
    Ok(single(move |rt| {
        let Some(mut best) = source.next_item(rt)? else {
            return Ok(None);
        };
        while let Some(item) = source.next_item(rt)? {
            if item.data_type().binary(rt, meta, &item, &best)?.truthy(rt)? {
                best = item;
            }
        }
        Ok(Some(best))
    }))
}

fn first(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    Ok(single(move |rt| source.next_item(rt)))
}

fn last(rt: &Runtime, args: Vec<Instance>) -> Eval {
    let source = upstream(rt, &args)?;
    Ok(single(move |rt| {
        let mut last = None;
        while let Some(item) = source.next_item(rt)? {
            last = Some(item);
        }
        Ok(last)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::types::list::ListValue;

    fn nums(values: &[f64]) -> Instance {
        ListValue::new(values.iter().map(|n| Instance::Number(*n)).collect())
    }

    fn collect(rt: &Runtime, iterator: &Instance) -> String {
        let items = Pull::new(rt, iterator).unwrap().collect(rt).unwrap();
        Instance::tuple(items).repr(rt).unwrap()
    }

    fn double() -> Instance {
        FunctionValue::native("double", |_rt, args| match args.first() {
            Some(Instance::Number(n)) => Ok(Instance::Number(n * 2.0)),
            _ => Err(RuntimeError::MissingArgument("n".to_string()).into()),
        })
    }

    fn is_even() -> Instance {
        FunctionValue::native("even", |_rt, args| match args.first() {
            Some(Instance::Number(n)) => Ok(Instance::Boolean(n % 2.0 == 0.0)),
            _ => Ok(Instance::Boolean(false)),
        })
    }

    #[test]
    fn test_map_and_filter() {
        let rt = Runtime::new(Options::default());
        let mapped = map(&rt, vec![nums(&[1.0, 2.0, 3.0]), double()]).unwrap();
        assert_eq!(collect(&rt, &mapped), "(2, 4, 6)");
        let filtered = filter(&rt, vec![nums(&[1.0, 2.0, 3.0, 4.0]), is_even()]).unwrap();
        assert_eq!(collect(&rt, &filtered), "(2, 4)");
    }

    #[test]
    fn test_take_and_take_while() {
        let rt = Runtime::new(Options::default());
        let taken = take(&rt, vec![nums(&[1.0, 2.0, 3.0]), Instance::Number(2.0)]).unwrap();
        assert_eq!(collect(&rt, &taken), "(1, 2)");
        let prefix = take_while(&rt, vec![nums(&[2.0, 4.0, 5.0, 6.0]), is_even()]).unwrap();
        assert_eq!(collect(&rt, &prefix), "(2, 4)");
    }

    #[test]
    fn test_window_slides_by_one() {
        let rt = Runtime::new(Options::default());
        let windows = window(&rt, vec![nums(&[1.0, 2.0, 3.0, 4.0]), Instance::Number(3.0)]).unwrap();
        assert_eq!(collect(&rt, &windows), "((1, 2, 3), (2, 3, 4))");
    }

    #[test]
    fn test_reductions() {
        let rt = Runtime::new(Options::default());
        let total = fold(&rt, vec![nums(&[1.0, 2.0, 3.0])], Meta::Add, 0.0).unwrap();
        assert_eq!(collect(&rt, &total), "(6,)");
        let product = fold(&rt, vec![nums(&[])], Meta::Mul, 1.0).unwrap();
        assert_eq!(collect(&rt, &product), "(1,)");
        let smallest = extreme(&rt, vec![nums(&[3.0, 1.0, 2.0])], Meta::Lt).unwrap();
        assert_eq!(collect(&rt, &smallest), "(1,)");
        let largest = extreme(&rt, vec![nums(&[3.0, 1.0, 2.0])], Meta::Gt).unwrap();
        assert_eq!(collect(&rt, &largest), "(3,)");
        let none = last(&rt, vec![nums(&[])]).unwrap();
        assert_eq!(collect(&rt, &none), "()");
    }

    #[test]
    fn test_reduce_with_initial() {
        let rt = Runtime::new(Options::default());
        let add = FunctionValue::native("add", |_rt, args| match (&args[0], &args[1]) {
            (Instance::Number(a), Instance::Number(b)) => Ok(Instance::Number(a + b)),
            _ => Err(RuntimeError::MissingArgument("b".to_string()).into()),
        });
        let result = reduce(&rt, vec![nums(&[1.0, 2.0]), add, Instance::Number(10.0)]).unwrap();
        assert_eq!(collect(&rt, &result), "(13,)");
    }

    #[test]
    fn test_non_callable_rejected() {
        let rt = Runtime::new(Options::default());
        assert!(map(&rt, vec![nums(&[1.0]), Instance::Number(1.0)]).is_err());
    }
}
