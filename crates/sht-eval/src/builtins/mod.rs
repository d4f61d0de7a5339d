//! Bindings present in every top-level scope.

use tracing::warn;

use crate::scope::Scope;
use crate::value::{Builtin, Instance};

mod combinators;
mod functions;
mod math;

/// Define the built-in types, functions and the `math` module in `scope`.
/// All of them are constants.
pub(crate) fn register(scope: &Scope) {
    let mut bindings: Vec<(&str, Instance)> = Builtin::ALL
        .iter()
        .map(|b| (b.name(), Instance::builtin_type(*b)))
        .collect();
    bindings.extend(functions::all());
    bindings.extend(combinators::all());
    bindings.push(("math", math::module()));

    for (name, value) in bindings {
        if let Err(e) = scope.define(name, value, true) {
            warn!(name, error = %e, "skipping built-in binding");
        }
    }
}
