//! Interpreter configuration.

use crate::runtime::PrintSink;

/// Options for running trees.
#[derive(Debug, Clone)]
pub struct Options {
    /// Nested calls allowed before a call raises instead of recursing.
    pub max_call_depth: usize,
    /// Stack size of the worker thread used by `Interpreter::run` and of
    /// every generator thread. The call-depth counter is shared across
    /// threads, so each thread needs room for `max_call_depth` calls.
    pub stack_size: usize,
    /// Destination for `print`. If None, prints go to stdout.
    pub print_sink: Option<PrintSink>,
}

impl Options {
    pub fn new() -> Self {
        Self {
            max_call_depth: 1000,
            stack_size: 32 * 1024 * 1024,
            print_sink: None,
        }
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn print_sink(mut self, sink: PrintSink) -> Self {
        self.print_sink = Some(sink);
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}
