//! Expression and statement evaluation.
//!
//! Every step returns `Eval`: `Ok(value)` on normal completion, or a
//! [`Flow`] signal on the error side that `?` carries outward until the
//! construct that consumes it.

use std::sync::Arc;

use sht_ast::{
    BinaryOperator, DataDef, FunctionDef, Initializer, MatchCase, Node, PostfixOperator,
    UnaryOperator,
};

use crate::call::{call_value, make_function};
use crate::error::RuntimeError;
use crate::flow::{Eval, Flow};
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::custom::CustomType;
use crate::types::error::ErrorValue;
use crate::types::iteration::IterationValue;
use crate::types::iterator::Pull;
use crate::types::maybe::MaybeValue;
use crate::types::Meta;
use crate::value::{Instance, TypeRef};

/// Evaluate a node in `scope`.
pub fn eval(rt: &Runtime, node: &Node, scope: &Scope) -> Eval {
    match node {
        Node::Number(n) => Ok(Instance::Number(*n)),
        Node::Boolean(b) => Ok(Instance::Boolean(*b)),
        Node::String(s) if s.is_empty() => Ok(rt.empty_string()),
        Node::String(s) => Ok(Instance::string(s.as_str())),
        Node::Identifier(name) => Ok(scope.get(name)?),
        Node::Tuple(items) => Ok(Instance::tuple(eval_items(rt, scope, items)?)),

        Node::Unary { operator, right } => {
            let value = eval(rt, right, scope)?;
            let meta = match operator {
                UnaryOperator::Pos => Meta::Pos,
                UnaryOperator::Neg => Meta::Neg,
                UnaryOperator::Not => Meta::Not,
            };
            value.data_type().unary(rt, meta, &value)
        }
        Node::Binary {
            operator,
            left,
            right,
        } => eval_binary(rt, *operator, left, right, scope),
        Node::Postfix { operator, left } => eval_postfix(rt, *operator, left, scope),

        Node::Assignment {
            targets,
            expression,
            definition,
            constant,
        } => {
            let value = match expression.as_ref() {
                Node::FunctionDef(def) => eval_function_def(rt, def, scope, false)?,
                other => eval(rt, other, scope)?,
            };
            let mode = Mode {
                definition: *definition,
                constant: *constant,
            };
            match targets.as_slice() {
                [target] if !matches!(target, Node::Spread(_)) => {
                    assign_target(rt, target, value.clone(), mode, scope)?
                }
                _ => destructure(rt, targets, &value, mode, scope)?,
            }
            Ok(value)
        }

        Node::FunctionDef(def) => eval_function_def(rt, def, scope, true),
        Node::Call {
            target,
            arguments,
            initializer,
        } => eval_call(rt, target, arguments, initializer.as_ref(), scope),
        Node::Access { target, name } => {
            let value = eval(rt, target, scope)?;
            value.get(rt, name)
        }
        Node::Indexing { target, values } => {
            let value = eval(rt, target, scope)?;
            let index = eval_items(rt, scope, values)?;
            value.data_type().get_item(rt, &value, &index)
        }

        Node::Return(value) => {
            let value = match value {
                Some(node) => eval(rt, node, scope)?,
                None => Instance::Boolean(false),
            };
            Err(Flow::Return(value))
        }
        Node::Raise(value) => {
            let value = eval(rt, value, scope)?;
            Err(Flow::Raise(to_error(rt, value)?))
        }
        Node::Yield(value) => {
            let value = match value {
                Some(node) => eval(rt, node, scope)?,
                None => Instance::Boolean(false),
            };
            match scope.yielder() {
                Some(yielder) => yielder.suspend(value),
                None => Err(Flow::Yield(value)),
            }
        }
        Node::Break => Err(Flow::Break),
        Node::Continue => Err(Flow::Continue),

        Node::Wrap(inner) => match eval(rt, inner, scope) {
            Ok(value) => Ok(MaybeValue::value(value)),
            Err(Flow::Raise(error)) => Ok(MaybeValue::error(error)),
            Err(other) => Err(other),
        },
        Node::Unwrap(inner) => {
            let value = eval(rt, inner, scope)?;
            unwrap_value(value)
        }

        Node::If {
            condition,
            then_body,
            else_body,
        } => {
            if eval(rt, condition, scope)?.truthy(rt)? {
                eval(rt, then_body, scope)
            } else if let Some(else_body) = else_body {
                eval(rt, else_body, scope)
            } else {
                Ok(Instance::Boolean(false))
            }
        }
        Node::Spread(_) => Err(RuntimeError::internal(
            "spread is only valid in tuples, arguments and assignment targets",
        )
        .into()),
        Node::Block(statements) => eval_statements(rt, statements, &scope.child()),
        Node::For { condition, body } => eval_for(rt, condition.as_deref(), body, scope),
        Node::PipeLoop {
            iterator,
            targets,
            body,
        } => eval_pipe_loop(rt, iterator, targets, body, scope),
        Node::Pipe {
            left,
            function,
            argument,
        } => {
            let iterator = eval(rt, left, scope)?.iterate(rt)?;
            let function = eval_argument(rt, function, scope)?;
            let mut args = vec![iterator];
            if let Some(argument) = argument {
                args.push(eval_argument(rt, argument, scope)?);
            }
            call_value(rt, &function, args)
        }
        Node::Match { subject, cases } => eval_match(rt, subject, cases, scope),
        Node::DataDef(def) => eval_data_def(rt, def, scope),
    }
}

/// Evaluate a function body: a block runs directly in `scope` instead of
/// a nested one, so parameters and body locals share a scope.
pub(crate) fn eval_body(rt: &Runtime, body: &Node, scope: &Scope) -> Eval {
    match body {
        Node::Block(statements) => eval_statements(rt, statements, scope),
        other => eval(rt, other, scope),
    }
}

/// Run statements in order; the last value is the result, `false` when empty.
fn eval_statements(rt: &Runtime, statements: &[Node], scope: &Scope) -> Eval {
    let mut result = Instance::Boolean(false);
    for statement in statements {
        result = eval(rt, statement, scope)?;
    }
    Ok(result)
}

/// Evaluate a list of expressions, expanding spreads through the iterator
/// protocol.
pub(crate) fn eval_items(rt: &Runtime, scope: &Scope, nodes: &[Node]) -> Eval<Vec<Instance>> {
    let mut values = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Spread(inner) => {
                let iterable = eval(rt, inner, scope)?;
                values.extend(Pull::new(rt, &iterable)?.collect(rt)?);
            }
            other => values.push(eval(rt, other, scope)?),
        }
    }
    Ok(values)
}

/// Evaluate the entries of a map initializer.
pub(crate) fn eval_entries(
    rt: &Runtime,
    scope: &Scope,
    pairs: &[(String, Node)],
) -> Eval<Vec<(String, Instance)>> {
    pairs
        .iter()
        .map(|(name, node)| Ok((name.clone(), eval(rt, node, scope)?)))
        .collect()
}

/// Function definitions used as values are not bound under their name.
fn eval_argument(rt: &Runtime, node: &Node, scope: &Scope) -> Eval {
    match node {
        Node::FunctionDef(def) => eval_function_def(rt, def, scope, false),
        other => eval(rt, other, scope),
    }
}

fn eval_arguments(rt: &Runtime, scope: &Scope, nodes: &[Node]) -> Eval<Vec<Instance>> {
    let mut values = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Spread(inner) => {
                let iterable = eval(rt, inner, scope)?;
                values.extend(Pull::new(rt, &iterable)?.collect(rt)?);
            }
            other => values.push(eval_argument(rt, other, scope)?),
        }
    }
    Ok(values)
}

fn eval_function_def(rt: &Runtime, def: &Arc<FunctionDef>, scope: &Scope, bind: bool) -> Eval {
    let function = make_function(rt, def, scope)?;
    if bind {
        if let Some(name) = &def.name {
            scope.define(name, function.clone(), false)?;
        }
    }
    Ok(function)
}

fn eval_data_def(rt: &Runtime, def: &Arc<DataDef>, scope: &Scope) -> Eval {
    let ty = CustomType::define(rt, def, scope)?;
    let value = Instance::Type(TypeRef::Custom(ty));
    scope.define(&def.name, value.clone(), true)?;
    Ok(value)
}

fn eval_call(
    rt: &Runtime,
    target: &Node,
    arguments: &[Node],
    initializer: Option<&Initializer>,
    scope: &Scope,
) -> Eval {
    let callee = eval(rt, target, scope)?;
    let args = eval_arguments(rt, scope, arguments)?;
    match &callee {
        Instance::Type(ty) => ty
            .data_type()
            .construct(rt, initializer.map(|init| (init, scope)), args),
        _ if initializer.is_some() => {
            Err(RuntimeError::invalid_action(callee.type_name(), "initializer").into())
        }
        _ => call_value(rt, &callee, args),
    }
}

fn eval_binary(
    rt: &Runtime,
    operator: BinaryOperator,
    left: &Node,
    right: &Node,
    scope: &Scope,
) -> Eval {
    let l = eval(rt, left, scope)?;
    // Coalesce only evaluates its right side when the left is an error.
    let r = || eval(rt, right, scope);

    let meta = match operator {
        BinaryOperator::Coalesce => return coalesce(l, r),
        BinaryOperator::And => return logic(rt, &l, &r()?, |a, b| a && b),
        BinaryOperator::Nand => return logic(rt, &l, &r()?, |a, b| !(a && b)),
        BinaryOperator::Or => return logic(rt, &l, &r()?, |a, b| a || b),
        BinaryOperator::Nor => return logic(rt, &l, &r()?, |a, b| !(a || b)),
        BinaryOperator::Xor => return logic(rt, &l, &r()?, |a, b| a != b),
        BinaryOperator::Nxor => return logic(rt, &l, &r()?, |a, b| a == b),
        BinaryOperator::Concat => {
            let r = r()?;
            return Ok(Instance::string(format!("{}{}", l.to_text(rt)?, r.to_text(rt)?)));
        }
        BinaryOperator::Eq => return Ok(Instance::Boolean(l.equals(rt, &r()?)?)),
        BinaryOperator::Neq => {
            return Ok(Instance::Boolean(l.data_type().not_equals(rt, &l, &r()?)?))
        }
        BinaryOperator::Is => return Ok(Instance::Boolean(l.data_type().is(rt, &l, &r()?)?)),
        BinaryOperator::In => {
            let r = r()?;
            return Ok(Instance::Boolean(r.data_type().contains(rt, &r, &l)?));
        }
        BinaryOperator::As => {
            return match r()? {
                Instance::Type(ty) => ty.data_type().to(rt, &l),
                other => {
                    Err(RuntimeError::incompatible("as", l.type_name(), other.type_name()).into())
                }
            }
        }
        BinaryOperator::Add => Meta::Add,
        BinaryOperator::Sub => Meta::Sub,
        BinaryOperator::Mul => Meta::Mul,
        BinaryOperator::Div => Meta::Div,
        BinaryOperator::IntDiv => Meta::IntDiv,
        BinaryOperator::Mod => Meta::Mod,
        BinaryOperator::Pow => Meta::Pow,
        BinaryOperator::Gt => Meta::Gt,
        BinaryOperator::Lt => Meta::Lt,
        BinaryOperator::Gte => Meta::Gte,
        BinaryOperator::Lte => Meta::Lte,
    };
    l.data_type().binary(rt, meta, &l, &r()?)
}

fn coalesce(value: Instance, fallback: impl FnOnce() -> Eval) -> Eval {
    match &value {
        Instance::Error(_) => fallback(),
        Instance::Maybe(maybe) => match maybe.as_ref() {
            MaybeValue::Error(_) => fallback(),
            MaybeValue::Value(inner) => Ok(inner.clone()),
        },
        _ => Ok(value),
    }
}

fn logic(rt: &Runtime, l: &Instance, r: &Instance, f: fn(bool, bool) -> bool) -> Eval {
    Ok(Instance::Boolean(f(l.truthy(rt)?, r.truthy(rt)?)))
}

/// `name++` / `name--`: store `name ± 1`, yield the old value.
fn eval_postfix(rt: &Runtime, operator: PostfixOperator, left: &Node, scope: &Scope) -> Eval {
    let Node::Identifier(name) = left else {
        return Err(RuntimeError::InvalidDefinition(format!(
            "{} needs a variable, got {}",
            operator,
            left.label()
        ))
        .into());
    };
    let reference = scope
        .lookup(name)
        .ok_or_else(|| RuntimeError::Undefined(name.clone()))?;
    let old = reference.get();
    let meta = match operator {
        PostfixOperator::Increment => Meta::Add,
        PostfixOperator::Decrement => Meta::Sub,
    };
    let new = old.data_type().binary(rt, meta, &old, &Instance::Number(1.0))?;
    reference.set(name, new)?;
    Ok(old)
}

#[derive(Clone, Copy)]
struct Mode {
    definition: bool,
    constant: bool,
}

fn assign_target(rt: &Runtime, target: &Node, value: Instance, mode: Mode, scope: &Scope) -> Eval<()> {
    match target {
        Node::Identifier(name) if mode.definition => {
            scope.define(name, value, mode.constant)?;
        }
        Node::Identifier(name) => scope.assign(name, value)?,
        Node::Access { target, name } if !mode.definition => {
            let object = eval(rt, target, scope)?;
            object.data_type().set(rt, &object, name, value)?;
        }
        Node::Indexing { target, values } if !mode.definition => {
            let object = eval(rt, target, scope)?;
            let index = eval_items(rt, scope, values)?;
            object.data_type().set_item(rt, &object, &index, value)?;
        }
        other => {
            return Err(RuntimeError::InvalidDefinition(format!(
                "cannot assign to {}",
                other.label()
            ))
            .into())
        }
    }
    Ok(())
}

/// Bind a Tuple's elements to `targets`. One spread target takes the
/// elements the other targets leave over, as a Tuple.
fn destructure(rt: &Runtime, targets: &[Node], value: &Instance, mode: Mode, scope: &Scope) -> Eval<()> {
    let Instance::Tuple(values) = value else {
        return Err(RuntimeError::ArityMismatch {
            expected: targets.len().to_string(),
            got: 1,
        }
        .into());
    };
    bind_targets(rt, targets, values, mode, scope)
}

fn bind_targets(rt: &Runtime, targets: &[Node], values: &[Instance], mode: Mode, scope: &Scope) -> Eval<()> {
    let spreads = targets.iter().filter(|t| matches!(t, Node::Spread(_))).count();
    if spreads > 1 {
        return Err(RuntimeError::InvalidDefinition(
            "at most one spread target is allowed".to_string(),
        )
        .into());
    }
    let fixed = targets.len() - spreads;
    let arity_ok = if spreads == 0 {
        values.len() == fixed
    } else {
        values.len() >= fixed
    };
    if !arity_ok {
        let expected = if spreads == 0 {
            fixed.to_string()
        } else {
            format!("at least {}", fixed)
        };
        return Err(RuntimeError::ArityMismatch {
            expected,
            got: values.len(),
        }
        .into());
    }

    let rest = values.len() - fixed;
    let mut position = 0;
    for target in targets {
        match target {
            Node::Spread(inner) => {
                let taken = Instance::tuple(values[position..position + rest].to_vec());
                position += rest;
                assign_target(rt, inner, taken, mode, scope)?;
            }
            other => {
                assign_target(rt, other, values[position].clone(), mode, scope)?;
                position += 1;
            }
        }
    }
    Ok(())
}

fn unwrap_value(value: Instance) -> Eval {
    match &value {
        Instance::Maybe(maybe) => match maybe.as_ref() {
            MaybeValue::Value(inner) => Ok(inner.clone()),
            MaybeValue::Error(error) => Err(Flow::Raise(error.clone())),
        },
        Instance::Error(_) => Err(Flow::Raise(value)),
        other => Err(RuntimeError::invalid_action(other.type_name(), "unwrap").into()),
    }
}

/// The Error instance raised by `raise value`.
fn to_error(rt: &Runtime, value: Instance) -> Eval {
    match value {
        Instance::Error(_) => Ok(value),
        Instance::String(s) => Ok(ErrorValue::raised(s.to_string(), None)),
        other => Ok(ErrorValue::raised(other.to_text(rt)?, Some(other))),
    }
}

fn loop_step(result: Eval, last: &mut Instance) -> Eval<bool> {
    match result {
        Ok(value) => {
            *last = value;
            Ok(true)
        }
        Err(Flow::Break) => Ok(false),
        Err(Flow::Continue) => Ok(true),
        Err(other) => Err(other),
    }
}

/// `for cond { body }`; without a condition it runs until `break`.
fn eval_for(rt: &Runtime, condition: Option<&Node>, body: &Node, scope: &Scope) -> Eval {
    let mut last = Instance::Boolean(false);
    loop {
        if let Some(condition) = condition {
            if !eval(rt, condition, scope)?.truthy(rt)? {
                break;
            }
        }
        if !loop_step(eval(rt, body, scope), &mut last)? {
            break;
        }
    }
    Ok(last)
}

/// `for targets in iterable { body }`, with a fresh scope per step.
fn eval_pipe_loop(rt: &Runtime, iterator: &Node, targets: &[Node], body: &Node, scope: &Scope) -> Eval {
    let iterable = eval(rt, iterator, scope)?;
    let pull = Pull::new(rt, &iterable)?;
    let mode = Mode {
        definition: true,
        constant: false,
    };
    let mut last = Instance::Boolean(false);
    while let Some(step) = pull.next(rt)? {
        let step_scope = scope.child();
        bind_step(rt, targets, &step, mode, &step_scope)?;
        if !loop_step(eval(rt, body, &step_scope), &mut last)? {
            break;
        }
    }
    Ok(last)
}

fn bind_step(rt: &Runtime, targets: &[Node], step: &IterationValue, mode: Mode, scope: &Scope) -> Eval<()> {
    match targets {
        [] => Ok(()),
        [single] if !matches!(single, Node::Spread(_)) => {
            assign_target(rt, single, step.value(), mode, scope)
        }
        _ => match step.payload() {
            // A single Tuple item, e.g. a Dict's (key, value) pair.
            [Instance::Tuple(values)] => bind_targets(rt, targets, values, mode, scope),
            values => bind_targets(rt, targets, values, mode, scope),
        },
    }
}

fn eval_match(rt: &Runtime, subject: &Node, cases: &[MatchCase], scope: &Scope) -> Eval {
    let subject = eval(rt, subject, scope)?;
    for case in cases {
        let matched = match &case.condition {
            Node::Identifier(name) if name == "_" => true,
            condition => {
                let value = eval(rt, condition, scope)?;
                subject.equals(rt, &value)?
                    || (matches!(value, Instance::Type(_))
                        && subject.data_type().is(rt, &subject, &value)?)
            }
        };
        if matched {
            return eval(rt, &case.body, scope);
        }
    }
    Ok(Instance::Boolean(false))
}
