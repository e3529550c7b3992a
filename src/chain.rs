//! Continuation chain construction and execution.
//!
//! # How a sequence becomes a chain
//!
//! An ordered sequence of middleware executes as nested continuations: each
//! unit receives the context and a [`Next`] representing everything after
//! it. [`Next::run`] peels one unit off the remaining slice and hands it the
//! continuation for the rest, so the chain builds itself one step at a time:
//!
//! ```text
//! execute([a, b, c], ctx)
//!        ↓
//! a.process(ctx, next{[b, c]})     ← a decides whether the rest runs
//!        ↓ next.run(ctx)
//! b.process(ctx, next{[c]})
//!        ↓ next.run(ctx)
//! c.process(ctx, next{[]})
//!        ↓ next.run(ctx)
//! tail: resolve, or the caller's terminal continuation
//! ```
//!
//! A unit that drops its `Next` truncates the chain; everything after it
//! (terminal included) is skipped and the execution still resolves. A unit
//! that fails rejects every `await` currently pending beneath it; the
//! failure reaches the caller of [`execute`] as ordinary error propagation.
//!
//! `Next` is consumed by value, so resuming the same continuation twice does
//! not type-check. There is no hidden per-execution state beyond the slice
//! position carried here; the same sequence can serve overlapping
//! executions, each with its own context.

use tracing::trace;

use crate::error::Error;
use crate::handler::AutoHandler;
use crate::meta::Meta;
use crate::middleware::{BoxFuture, DynMiddleware};

// ── Terminal erasure ──────────────────────────────────────────────────────────

/// Internal dispatch interface for terminal continuations.
trait ErasedTerminal<C>: Send + Sync {
    fn invoke<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, Result<(), Error>>;
}

/// Newtype bridging a concrete terminal fn to [`ErasedTerminal`].
struct TerminalFn<F>(F);

impl<C, F> ErasedTerminal<C> for TerminalFn<F>
where
    F: for<'a> AutoHandler<'a, C>,
{
    fn invoke<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(self.0.call(ctx))
    }
}

// ── The continuation ──────────────────────────────────────────────────────────

/// What runs once the remaining middleware are exhausted.
enum Tail<'a, C> {
    /// Resolve immediately.
    Halt,
    /// Run the caller-supplied terminal continuation.
    Terminal(&'a dyn ErasedTerminal<C>),
    /// Resume an enclosing chain (nested stacks, guarded subtrees).
    Resume(Box<Next<'a, C>>),
}

/// The rest of the chain.
///
/// Calling [`run`](Next::run) resumes it; dropping it truncates it. Both are
/// normal outcomes, not errors. `Next` is consumed either way, so a unit
/// resumes the remainder at most once.
pub struct Next<'a, C> {
    remaining: &'a [DynMiddleware<C>],
    tail: Tail<'a, C>,
}

impl<'a, C: Send + 'static> Next<'a, C> {
    fn over(remaining: &'a [DynMiddleware<C>], tail: Tail<'a, C>) -> Self {
        Self { remaining, tail }
    }

    /// Resumes the chain: the next middleware, everything after it, then the
    /// tail.
    pub async fn run(self, ctx: &mut C) -> Result<(), Error> {
        match self.remaining.split_first() {
            Some((head, rest)) => {
                trace!(
                    middleware = head.meta().and_then(Meta::name).unwrap_or("unnamed"),
                    remaining = rest.len(),
                    "running middleware"
                );
                head.process(ctx, Next::over(rest, self.tail)).await
            }
            None => match self.tail {
                Tail::Halt => Ok(()),
                Tail::Terminal(terminal) => terminal.invoke(ctx).await,
                Tail::Resume(outer) => Box::pin(outer.run(ctx)).await,
            },
        }
    }

    /// Returns a continuation that runs `layers` first and resumes `self`
    /// once they complete.
    ///
    /// This is the building block for units that wrap a subtree of their
    /// own: a nested [`Stack`](crate::Stack) runs its layers in front of the
    /// outer remainder, [`Catch`](crate::Catch) does the same under a fault
    /// handler. If any layer drops its continuation, `self` is dropped with
    /// it and the outer chain truncates too.
    pub fn prepend(self, layers: &'a [DynMiddleware<C>]) -> Next<'a, C> {
        Next::over(layers, Tail::Resume(Box::new(self)))
    }
}

// ── Execution entry points ────────────────────────────────────────────────────

/// Runs `layers` in order over `ctx` with no terminal continuation.
///
/// An empty sequence resolves immediately. This is the static form of
/// [`Stack::execute`](crate::Stack::execute): it runs any externally-held
/// sequence without a container.
pub async fn execute<C>(layers: &[DynMiddleware<C>], ctx: &mut C) -> Result<(), Error>
where
    C: Send + 'static,
{
    Next::over(layers, Tail::Halt).run(ctx).await
}

/// Runs `layers` in order over `ctx`, then `terminal`, if every layer
/// advanced.
///
/// The terminal is an auto-advancing handler shape: `async fn(&mut C) ->
/// Result<(), Error>`. It runs after the last layer resumes its
/// continuation and is skipped if any layer truncates.
pub async fn execute_with<C, F>(
    layers: &[DynMiddleware<C>],
    ctx: &mut C,
    terminal: F,
) -> Result<(), Error>
where
    C: Send + 'static,
    F: for<'a> AutoHandler<'a, C>,
{
    let terminal = TerminalFn(terminal);
    Next::over(layers, Tail::Terminal(&terminal)).run(ctx).await
}
