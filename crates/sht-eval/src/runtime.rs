//! Runtime context shared by every evaluation step of one session.
//!
//! Holds the options, the shared singletons and the call-depth counter.
//! A `Runtime` is a cheap handle: clones refer to the same context, which is
//! how generator threads evaluate against the session that created them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::builtins;
use crate::error::RuntimeError;
use crate::options::Options;
use crate::scope::Scope;
use crate::types::iteration::IterationValue;
use crate::value::{lock, Instance};

/// A sink for print output, allowing redirection away from stdout.
pub type PrintSink = Sender<String>;

struct Shared {
    options: Options,
    depth: AtomicUsize,
    generators: AtomicUsize,
    /// Containers whose rendering is in progress.
    rendering: Mutex<HashSet<usize>>,
    done: Instance,
    empty_string: Instance,
}

#[derive(Clone)]
pub struct Runtime {
    shared: Arc<Shared>,
}

/// Marks one active call; the depth drops back when the guard goes away.
pub(crate) struct CallGuard {
    shared: Arc<Shared>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.shared.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Marks one container as being rendered until dropped.
pub(crate) struct RenderGuard {
    shared: Arc<Shared>,
    key: usize,
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        lock(&self.shared.rendering).remove(&self.key);
    }
}

impl Runtime {
    pub fn new(options: Options) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                depth: AtomicUsize::new(0),
                generators: AtomicUsize::new(0),
                rendering: Mutex::new(HashSet::new()),
                done: IterationValue::done(),
                empty_string: Instance::string(""),
            }),
        }
    }

    pub fn options(&self) -> &Options {
        &self.shared.options
    }

    /// The shared terminal Iteration.
    pub fn done(&self) -> Instance {
        self.shared.done.clone()
    }

    pub fn empty_string(&self) -> Instance {
        self.shared.empty_string.clone()
    }

    /// Send a print message to the sink, or stdout if no sink is configured.
    ///
    /// Returns Ok(()) on success, or Err if the channel is disconnected.
    pub fn print(&self, message: String) -> Result<(), String> {
        if let Some(ref sink) = self.shared.options.print_sink {
            sink.send(message)
                .map_err(|e| format!("Print channel disconnected: {}", e))
        } else {
            println!("{}", message);
            Ok(())
        }
    }

    /// Enter a call, failing once `max_call_depth` calls are active.
    pub(crate) fn enter_call(&self) -> Result<CallGuard, RuntimeError> {
        let limit = self.shared.options.max_call_depth;
        let depth = self.shared.depth.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = CallGuard {
            shared: Arc::clone(&self.shared),
        };
        if depth > limit {
            return Err(RuntimeError::CallDepth(limit));
        }
        Ok(guard)
    }

    /// Number of calls currently active.
    pub fn call_depth(&self) -> usize {
        self.shared.depth.load(Ordering::SeqCst)
    }

    /// Start rendering the container identified by `key`. None when it is
    /// already being rendered further up, i.e. it contains itself.
    pub(crate) fn enter_render(&self, key: usize) -> Option<RenderGuard> {
        if !lock(&self.shared.rendering).insert(key) {
            return None;
        }
        Some(RenderGuard {
            shared: Arc::clone(&self.shared),
            key,
        })
    }

    /// Number of generator threads that have started and not yet exited.
    pub fn live_generators(&self) -> usize {
        self.shared.generators.load(Ordering::SeqCst)
    }

    pub(crate) fn generator_started(&self) {
        self.shared.generators.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn generator_exited(&self) {
        self.shared.generators.fetch_sub(1, Ordering::SeqCst);
    }

    /// A fresh top-level scope holding the built-in types, functions and
    /// the `math` module.
    pub fn global_scope(&self) -> Scope {
        let scope = Scope::new();
        builtins::register(&scope);
        scope
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_print_to_sink() {
        let (tx, rx) = mpsc::channel();
        let rt = Runtime::new(Options::default().print_sink(tx));
        rt.print("hello".to_string()).unwrap();
        assert_eq!(rx.recv().unwrap(), "hello");
    }

    #[test]
    fn test_print_to_closed_sink_fails() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let rt = Runtime::new(Options::default().print_sink(tx));
        assert!(rt.print("lost".to_string()).is_err());
    }

    #[test]
    fn test_call_depth_limit() {
        let rt = Runtime::new(Options::default().max_call_depth(2));
        let a = rt.enter_call().unwrap();
        let _b = rt.enter_call().unwrap();
        assert_eq!(rt.enter_call().err(), Some(RuntimeError::CallDepth(2)));
        assert_eq!(rt.call_depth(), 2);
        drop(a);
        assert_eq!(rt.call_depth(), 1);
    }

    #[test]
    fn test_render_guard_detects_reentry() {
        let rt = Runtime::default();
        let outer = rt.enter_render(7);
        assert!(outer.is_some());
        assert!(rt.enter_render(7).is_none());
        assert!(rt.enter_render(8).is_some());
        drop(outer);
        assert!(rt.enter_render(7).is_some());
    }

    #[test]
    fn test_clones_share_singletons() {
        let rt = Runtime::default();
        let other = rt.clone();
        assert!(rt.done().same(&other.done()));
    }
}
