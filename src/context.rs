//! Execution context for the runway CLI.
//!
//! Holds the global `--verbose` flag so the git layer can echo the commands
//! it runs without threading the flag through every signature. The pipeline
//! is strictly synchronous and single-threaded, so a thread-local is enough.

use std::cell::RefCell;

thread_local! {
    static CONTEXT: RefCell<ExecutionContext> = RefCell::new(ExecutionContext::default());
}

/// Global execution context for the current CLI invocation
#[derive(Clone, Copy, Default)]
pub struct ExecutionContext {
    /// Show git commands being executed
    pub verbose: bool,
}

impl ExecutionContext {
    /// Initialize the thread-local context
    pub fn init(verbose: bool) {
        CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = ExecutionContext { verbose };
        });
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose() -> bool {
        CONTEXT.with(|ctx| ctx.borrow().verbose)
    }
}
