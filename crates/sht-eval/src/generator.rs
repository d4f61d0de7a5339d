//! Generator functions as suspended computations.
//!
//! Calling a generator function binds its arguments and returns an Iterator
//! without running anything. The first `next` starts the body on its own
//! thread. Each `yield` hands its payload to the consumer and parks the
//! body until the next `next`; only one side runs at a time, so the body's
//! side effects happen exactly once.
//!
//! ## Channel Architecture
//!
//! - Resume signals: `tokio::sync::mpsc::UnboundedSender` (non-blocking send
//!   from the consumer, `blocking_recv` in the generator thread)
//! - Events: `std::sync::mpsc::sync_channel(0)` rendezvous (the consumer
//!   blocks until the body yields, finishes or raises)

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use sht_ast::FunctionDef;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::RuntimeError;
use crate::eval::eval_body;
use crate::flow::{Eval, Flow};
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::types::iteration::IterationValue;
use crate::types::iterator::IteratorValue;
use crate::types::function::FunctionValue;
use crate::value::{lock, Instance};

/// What the generator thread reports back to the consumer.
enum Event {
    Yielded(Vec<Instance>),
    Finished,
    Raised(Instance),
}

/// Generator side of the hand-off, reachable from the body's scope.
pub(crate) struct Yielder {
    events: SyncSender<Event>,
    resume: Mutex<UnboundedReceiver<()>>,
}

impl Yielder {
    /// Hand `value` to the consumer and park until resumed.
    ///
    /// A Tuple is yielded as a multi-value payload. The resumed `yield`
    /// expression evaluates to `false`. When the consumer is gone the body
    /// unwinds as if it had returned.
    pub(crate) fn suspend(&self, value: Instance) -> Eval {
        let payload = match &value {
            Instance::Tuple(values) => values.to_vec(),
            _ => vec![value],
        };
        if self.events.send(Event::Yielded(payload)).is_err() {
            return Err(Flow::Return(Instance::Boolean(false)));
        }
        match lock(&self.resume).blocking_recv() {
            Some(()) => Ok(Instance::Boolean(false)),
            None => Err(Flow::Return(Instance::Boolean(false))),
        }
    }
}

/// Counts a generator thread as live until it exits, panics included.
struct LiveThread {
    rt: Runtime,
}

impl LiveThread {
    fn new(rt: &Runtime) -> Self {
        rt.generator_started();
        Self { rt: rt.clone() }
    }
}

impl Drop for LiveThread {
    fn drop(&mut self) {
        self.rt.generator_exited();
    }
}

/// Consumer side of a running body.
struct Link {
    resume: UnboundedSender<()>,
    events: Receiver<Event>,
}

enum State {
    /// Created, body not started.
    Pending,
    /// Parked at a `yield`.
    Suspended(Link),
    /// A `next` is waiting on the body.
    Busy,
    Finished,
}

pub(crate) struct Generator {
    name: String,
    def: Arc<FunctionDef>,
    scope: Scope,
    state: Mutex<State>,
}

impl Generator {
    /// An Iterator driving `def`'s body in `scope`, which already holds the
    /// bound parameters.
    pub(crate) fn iterator(def: Arc<FunctionDef>, scope: Scope) -> Instance {
        let generator = Arc::new(Generator {
            name: def.name.clone().unwrap_or_else(|| "<lambda>".to_string()),
            def,
            scope,
            state: Mutex::new(State::Pending),
        });
        IteratorValue::new(FunctionValue::native("next", move |rt, _args| {
            Ok(generator.resume(rt))
        }))
    }

    fn spawn(&self, rt: &Runtime) -> Result<Link, RuntimeError> {
        let (events_tx, events_rx) = mpsc::sync_channel(0);
        let (resume_tx, resume_rx) = tokio::sync::mpsc::unbounded_channel();
        let yielder = Arc::new(Yielder {
            events: events_tx.clone(),
            resume: Mutex::new(resume_rx),
        });
        let body_scope = self.scope.generator_child(yielder);
        let def = Arc::clone(&self.def);
        let thread_rt = rt.clone();
        let name = self.name.clone();
        // Dropped with the closure if the thread fails to start.
        let live = LiveThread::new(rt);

        thread::Builder::new()
            .name("sht-generator".to_string())
            .stack_size(rt.options().stack_size)
            .spawn(move || {
                let _live = live;
                let event = match eval_body(&thread_rt, &def.body, &body_scope) {
                    Ok(_) | Err(Flow::Return(_)) => Event::Finished,
                    Err(Flow::Raise(error)) => Event::Raised(error),
                    Err(other) => match other.escaped() {
                        Flow::Raise(error) => Event::Raised(error),
                        _ => Event::Finished,
                    },
                };
                // Drop the body scope first so a consumer that already went
                // away does not keep this thread's bindings alive.
                drop(body_scope);
                if events_tx.send(event).is_err() {
                    debug!(generator = %name, "generator abandoned");
                } else {
                    debug!(generator = %name, "generator finished");
                }
            })
            .map_err(|e| RuntimeError::internal(format!("failed to start generator: {}", e)))?;

        debug!(generator = %self.name, "generator started");
        Ok(Link {
            resume: resume_tx,
            events: events_rx,
        })
    }

    /// Run the body to its next `yield` and report the step.
    fn resume(&self, rt: &Runtime) -> Instance {
        let link = {
            let mut state = lock(&self.state);
            match std::mem::replace(&mut *state, State::Busy) {
                State::Pending => match self.spawn(rt) {
                    Ok(link) => link,
                    Err(error) => {
                        *state = State::Finished;
                        return IterationValue::error(Instance::error(error));
                    }
                },
                State::Suspended(link) => {
                    if link.resume.send(()).is_err() {
                        *state = State::Finished;
                        return rt.done();
                    }
                    link
                }
                State::Busy => {
                    return IterationValue::error(Instance::error(RuntimeError::internal(
                        "generator is already running",
                    )));
                }
                State::Finished => {
                    *state = State::Finished;
                    return rt.done();
                }
            }
        };

        // The state lock is released while the body runs so a re-entrant
        // `next` from inside the body sees Busy instead of deadlocking.
        let event = link.events.recv();
        let mut state = lock(&self.state);
        match event {
            Ok(Event::Yielded(values)) => {
                *state = State::Suspended(link);
                IterationValue::values(values)
            }
            Ok(Event::Finished) => {
                *state = State::Finished;
                rt.done()
            }
            Ok(Event::Raised(error)) => {
                *state = State::Finished;
                IterationValue::error(error)
            }
            Err(_) => {
                *state = State::Finished;
                IterationValue::error(Instance::error(RuntimeError::internal(
                    "generator thread exited unexpectedly",
                )))
            }
        }
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        if let State::Suspended(_) = &*lock(&self.state) {
            debug!(generator = %self.name, "dropping suspended generator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use sht_ast::build::*;

    fn counting_generator(scope: &Scope) -> Instance {
        // fn gen() { yield 1; yield 2; yield 3 }
        let def = FunctionDef {
            name: Some("gen".to_string()),
            params: Vec::new(),
            body: block(vec![
                yield_(number(1.0)),
                yield_(number(2.0)),
                yield_(number(3.0)),
            ]),
            generator: true,
        };
        Generator::iterator(Arc::new(def), scope.child())
    }

    #[test]
    fn test_yields_in_order_then_done() {
        let rt = Runtime::new(Options::default());
        let Instance::Iterator(it) = counting_generator(&Scope::new()) else {
            panic!("expected iterator")
        };
        let mut seen = Vec::new();
        for _ in 0..3 {
            let Instance::Iteration(step) = it.advance(&rt) else { panic!("expected iteration") };
            assert!(!step.is_done());
            seen.push(step.value().repr(&rt).unwrap());
        }
        assert_eq!(seen, vec!["1", "2", "3"]);
        let Instance::Iteration(step) = it.advance(&rt) else { panic!("expected iteration") };
        assert!(step.is_done());
        assert!(step.error_value().is_none());
    }

    #[test]
    fn test_dropping_suspended_generator_does_not_hang() {
        let rt = Runtime::new(Options::default());
        let Instance::Iterator(it) = counting_generator(&Scope::new()) else {
            panic!("expected iterator")
        };
        let _ = it.advance(&rt);
        drop(it);
    }

    #[test]
    fn test_raise_in_body_becomes_error_iteration() {
        let rt = Runtime::new(Options::default());
        let def = FunctionDef {
            name: Some("bad".to_string()),
            params: Vec::new(),
            body: block(vec![yield_(number(1.0)), raise(string("boom"))]),
            generator: true,
        };
        let Instance::Iterator(it) = Generator::iterator(Arc::new(def), Scope::new()) else {
            panic!("expected iterator")
        };
        let _ = it.advance(&rt);
        assert_eq!(it.advance(&rt).repr(&rt).unwrap(), "<Iteration:error>");
        assert!(it.is_done());
    }
}
