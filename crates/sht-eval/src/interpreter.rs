//! The sht interpreter.
//!
//! `run` evaluates a whole tree in a fresh top-level scope on a worker
//! thread with a large stack, then renders the final value. `eval` works
//! against the interpreter's persistent global scope for interactive use.

use std::thread;

use sht_ast::Node;
use tracing::debug;

use crate::error::RuntimeError;
use crate::eval;
use crate::flow::Flow;
use crate::options::Options;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::value::Instance;

/// Result of running a tree.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Representation of the final value, or of the unhandled error
    /// (`ERR! message`).
    pub display: String,
    /// The unhandled error, if the run raised one.
    pub error: Option<Instance>,
}

impl RunOutput {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn failed(rt: &Runtime, error: Instance) -> Self {
        let display = error
            .repr(rt)
            .unwrap_or_else(|_| format!("ERR! {}", error.type_name()));
        Self {
            display,
            error: Some(error),
        }
    }
}

/// The sht interpreter.
pub struct Interpreter {
    runtime: Runtime,
    global: Scope,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let runtime = Runtime::new(options);
        let global = runtime.global_scope();
        Self { runtime, global }
    }

    /// Get a reference to the runtime.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// The persistent scope used by [`Interpreter::eval`].
    pub fn global_scope(&self) -> &Scope {
        &self.global
    }

    /// Evaluate `root` to completion in a fresh top-level scope.
    pub fn run(&self, root: &Node) -> RunOutput {
        let stack_size = self.runtime.options().stack_size;
        thread::scope(|s| {
            let worker = thread::Builder::new()
                .name("sht-eval".to_string())
                .stack_size(stack_size)
                .spawn_scoped(s, || self.run_here(root));
            match worker {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    RunOutput::failed(
                        &self.runtime,
                        Instance::error(RuntimeError::internal("evaluation thread panicked")),
                    )
                }),
                Err(e) => RunOutput::failed(
                    &self.runtime,
                    Instance::error(RuntimeError::internal(format!(
                        "failed to start evaluation thread: {}",
                        e
                    ))),
                ),
            }
        })
    }

    fn run_here(&self, root: &Node) -> RunOutput {
        debug!("run started");
        let rt = &self.runtime;
        let builtins = rt.global_scope();
        // The root block binds straight into this child, so scripts may
        // shadow built-ins.
        let scope = builtins.child();
        let output = match eval::eval_body(rt, root, &scope) {
            Ok(value) | Err(Flow::Return(value)) => match value.repr(rt) {
                Ok(display) => RunOutput {
                    display,
                    error: None,
                },
                Err(flow) => RunOutput::failed(rt, flow_error(flow)),
            },
            Err(flow) => RunOutput::failed(rt, flow_error(flow)),
        };
        // Closures and generators stored in the scopes they capture keep
        // those scopes, and parked generator threads, alive until cleared.
        drop(scope);
        builtins.clear_all();
        debug!(failed = !output.is_ok(), "run finished");
        output
    }

    /// Evaluate `node` in `scope`, or in the global scope when None.
    ///
    /// An unhandled raise comes back as its Error instance.
    pub fn eval(&self, node: &Node, scope: Option<&Scope>) -> Instance {
        let scope = scope.unwrap_or(&self.global);
        match eval::eval(&self.runtime, node, scope) {
            Ok(value) | Err(Flow::Return(value)) => value,
            Err(flow) => flow_error(flow),
        }
    }
}

/// The Error instance for a signal that reached the top level.
fn flow_error(flow: Flow) -> Instance {
    match flow.escaped() {
        Flow::Raise(error) => error,
        Flow::Return(value) => value,
        other => Instance::error(RuntimeError::internal(format!("unhandled {:?}", other))),
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.global.clear_all();
    }
}

/// Run `root` with default options.
pub fn run(root: &Node) -> RunOutput {
    Interpreter::new().run(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sht_ast::build::*;
    use sht_ast::BinaryOperator;

    #[test]
    fn test_new_interpreter() {
        let _interp = Interpreter::new();
        // Interpreter is ready to evaluate
    }

    #[test]
    fn test_run_empty_block() {
        let result = run(&block(vec![]));
        assert!(result.is_ok(), "Run failed: {}", result.display);
        assert_eq!(result.display, "false");
    }

    #[test]
    fn test_run_block_with_let() {
        let tree = block(vec![let_("x", number(42.0)), ident("x")]);
        let result = run(&tree);
        assert!(result.is_ok(), "Run failed: {}", result.display);
        assert_eq!(result.display, "42");
    }

    #[test]
    fn test_run_reports_unhandled_error() {
        let result = run(&binary(BinaryOperator::Add, number(1.0), boolean(true)));
        assert!(!result.is_ok());
        assert_eq!(
            result.display,
            "ERR! incompatible types for operation +: Number and Boolean"
        );
    }

    #[test]
    fn test_top_level_return() {
        let result = run(&block(vec![return_(number(5.0)), number(6.0)]));
        assert!(result.is_ok(), "Run failed: {}", result.display);
        assert_eq!(result.display, "5");
    }

    #[test]
    fn test_runs_do_not_share_scope() {
        let interp = Interpreter::new();
        assert!(interp.run(&let_("x", number(1.0))).is_ok());
        let second = interp.run(&ident("x"));
        assert_eq!(second.display, "ERR! undefined variable 'x'");
    }

    #[test]
    fn test_eval_uses_global_scope() {
        let interp = Interpreter::new();
        interp.eval(&let_("x", number(2.0)), None);
        let value = interp.eval(&binary(BinaryOperator::Mul, ident("x"), number(3.0)), None);
        assert!(matches!(value, Instance::Number(n) if n == 6.0));
    }

    #[test]
    fn test_yield_outside_generator() {
        let result = run(&yield_(number(1.0)));
        assert_eq!(result.display, "ERR! yield outside of a generator");
    }

    #[test]
    fn test_call_depth_limit() {
        // fn down(n) { down(n + 1) }; down(0)
        let tree = block(vec![
            function(
                "down",
                vec![param("n")],
                block(vec![call(
                    ident("down"),
                    vec![binary(BinaryOperator::Add, ident("n"), number(1.0))],
                )]),
            ),
            call(ident("down"), vec![number(0.0)]),
        ]);
        let interp = Interpreter::with_options(Options::default().max_call_depth(50));
        let result = interp.run(&tree);
        assert_eq!(result.display, "ERR! maximum call depth of 50 exceeded");
    }
}
