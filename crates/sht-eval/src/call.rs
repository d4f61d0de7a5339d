//! Function definition and call semantics.

use std::collections::HashSet;
use std::sync::Arc;

use sht_ast::FunctionDef;
use tracing::trace;

use crate::error::RuntimeError;
use crate::eval::{eval, eval_body};
use crate::flow::{Eval, Flow};
use crate::generator::Generator;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::function::{Body, FunctionValue};
use crate::types::list::ListValue;
use crate::value::Instance;

/// Call any callable instance: functions, types, or custom instances with
/// a `call` meta function.
pub fn call_value(rt: &Runtime, target: &Instance, args: Vec<Instance>) -> Eval {
    target.data_type().call(rt, target, args)
}

/// Check parameter ordering: at most one spread, last and without default;
/// defaults only after required parameters; no duplicate names.
fn validate_params(def: &FunctionDef) -> Result<(), RuntimeError> {
    let mut seen_default = false;
    let mut names = HashSet::new();
    let last = def.params.len().saturating_sub(1);
    for (i, p) in def.params.iter().enumerate() {
        if !names.insert(p.name.as_str()) {
            return Err(RuntimeError::InvalidDefinition(format!(
                "duplicate parameter '{}'",
                p.name
            )));
        }
        if p.spread {
            if i != last {
                return Err(RuntimeError::InvalidDefinition(format!(
                    "spread parameter '{}' must be last",
                    p.name
                )));
            }
            if p.default.is_some() {
                return Err(RuntimeError::InvalidDefinition(format!(
                    "spread parameter '{}' cannot have a default",
                    p.name
                )));
            }
        } else if p.default.is_some() {
            seen_default = true;
        } else if seen_default {
            return Err(RuntimeError::InvalidDefinition(format!(
                "parameter '{}' without default follows a parameter with default",
                p.name
            )));
        }
    }
    Ok(())
}

/// Build a closure over `scope`. Defaults are evaluated now, in `scope`.
pub(crate) fn make_function(rt: &Runtime, def: &Arc<FunctionDef>, scope: &Scope) -> Eval {
    validate_params(def)?;
    let mut defaults = Vec::with_capacity(def.params.len());
    for p in &def.params {
        let value = match &p.default {
            Some(node) => Some(eval(rt, node, scope)?),
            None => None,
        };
        defaults.push(value);
    }
    Ok(FunctionValue::script(Arc::clone(def), scope.clone(), defaults))
}

/// Bind positional `args` to the parameters of `def` in `scope`.
///
/// A spread parameter takes what is left after the fixed parameters that
/// follow it, as a List (empty when nothing is left). Extra arguments are
/// ignored.
fn bind_params(
    def: &FunctionDef,
    defaults: &[Option<Instance>],
    scope: &Scope,
    args: Vec<Instance>,
) -> Eval<()> {
    let total = args.len();
    let mut position = 0;
    for (i, p) in def.params.iter().enumerate() {
        let value = if p.spread {
            let fixed_after = def.params[i + 1..].iter().filter(|q| !q.spread).count();
            let take = total.saturating_sub(position).saturating_sub(fixed_after);
            let items = args[position..position + take].to_vec();
            position += take;
            ListValue::new(items)
        } else if position < total {
            position += 1;
            args[position - 1].clone()
        } else if let Some(Some(default)) = defaults.get(i) {
            default.clone()
        } else {
            return Err(RuntimeError::MissingArgument(p.name.clone()).into());
        };
        scope.define(&p.name, value, false)?;
    }
    Ok(())
}

pub(crate) fn call_function(rt: &Runtime, f: &Arc<FunctionValue>, args: Vec<Instance>) -> Eval {
    let args = match f.receiver() {
        Some(receiver) => {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(receiver.clone());
            full.extend(args);
            full
        }
        None => args,
    };
    let _guard = rt.enter_call()?;

    match f.body() {
        Body::Native(native) => native(rt, args),
        Body::Script {
            def,
            scope,
            defaults,
            generator,
        } => {
            trace!(function = f.name().unwrap_or("<lambda>"), args = args.len(), "call");
            let call_scope = scope.child();
            bind_params(def, defaults, &call_scope, args)?;
            if *generator {
                return Ok(Generator::iterator(Arc::clone(def), call_scope));
            }
            match eval_body(rt, &def.body, &call_scope) {
                Ok(value) | Err(Flow::Return(value)) => Ok(value),
                Err(other) => Err(other.escaped()),
            }
        }
    }
}
