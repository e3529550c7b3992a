//! Combinator middleware: composition policies built on the executor alone.
//!
//! Each combinator is an ordinary [`Middleware`] wrapping an inner sequence.
//! None of them is special to the engine: everything here goes through
//! [`execute`](crate::execute) and [`Next`], the same surface available to
//! user-written combinators. All four expose their inner sequence through
//! [`Middleware::stack`], so [`hierarchy`](crate::hierarchy) sees through
//! them.

use std::future::Future;

use async_trait::async_trait;
use tracing::debug;

use crate::chain::{self, Next};
use crate::error::Error;
use crate::meta::Meta;
use crate::middleware::{BoxFuture, DynMiddleware, Middleware};
use crate::stack::Stack;

type Predicate<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

// ── If ────────────────────────────────────────────────────────────────────────

/// Conditional branch.
///
/// When the predicate holds, the branch runs and then — unless
/// [`short_circuit`](If::short_circuit) was set — the outer chain resumes.
/// When it does not hold, the branch is skipped entirely and the outer chain
/// resumes directly.
pub struct If<C> {
    predicate: Predicate<C>,
    layers: Vec<DynMiddleware<C>>,
    short_circuit: bool,
    meta: Option<Meta>,
}

impl<C: Send + 'static> If<C> {
    /// Runs `branch` whenever `predicate` holds for the context.
    pub fn new(predicate: impl Fn(&C) -> bool + Send + Sync + 'static, branch: Stack<C>) -> Self {
        Self {
            predicate: Box::new(predicate),
            layers: branch.into_layers(),
            short_circuit: false,
            meta: None,
        }
    }

    /// When the branch is taken, stop the outer chain instead of resuming
    /// it. Gate-style usage: the branch fully replaces the remainder.
    pub fn short_circuit(mut self) -> Self {
        self.short_circuit = true;
        self
    }

    /// Attaches a descriptor.
    pub fn annotate(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[async_trait]
impl<C: Send + 'static> Middleware<C> for If<C> {
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        if (self.predicate)(ctx) {
            debug!(short_circuit = self.short_circuit, "branch taken");
            chain::execute(&self.layers, ctx).await?;
            if self.short_circuit {
                Ok(())
            } else {
                next.run(ctx).await
            }
        } else {
            next.run(ctx).await
        }
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    fn stack(&self) -> &[DynMiddleware<C>] {
        &self.layers
    }
}

// ── AfterIf ───────────────────────────────────────────────────────────────────

/// Conditional epilogue: the outer chain runs first, then the inner sequence
/// if the predicate holds for the (by now updated) context.
///
/// A fault in the outer chain propagates immediately; the epilogue only runs
/// after a clean pass.
pub struct AfterIf<C> {
    predicate: Predicate<C>,
    layers: Vec<DynMiddleware<C>>,
    meta: Option<Meta>,
}

impl<C: Send + 'static> AfterIf<C> {
    /// Runs `epilogue` after the rest of the chain, whenever `predicate`
    /// holds.
    pub fn new(
        predicate: impl Fn(&C) -> bool + Send + Sync + 'static,
        epilogue: Stack<C>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            layers: epilogue.into_layers(),
            meta: None,
        }
    }

    /// Attaches a descriptor.
    pub fn annotate(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[async_trait]
impl<C: Send + 'static> Middleware<C> for AfterIf<C> {
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        next.run(ctx).await?;
        if (self.predicate)(ctx) {
            debug!("epilogue taken");
            chain::execute(&self.layers, ctx).await
        } else {
            Ok(())
        }
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    fn stack(&self) -> &[DynMiddleware<C>] {
        &self.layers
    }
}

// ── After ─────────────────────────────────────────────────────────────────────

/// Unconditional epilogue: the outer chain runs first, then the inner
/// sequence, always.
pub struct After<C> {
    layers: Vec<DynMiddleware<C>>,
    meta: Option<Meta>,
}

impl<C: Send + 'static> After<C> {
    /// Runs `epilogue` after the rest of the chain.
    pub fn new(epilogue: Stack<C>) -> Self {
        Self { layers: epilogue.into_layers(), meta: None }
    }

    /// Attaches a descriptor.
    pub fn annotate(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[async_trait]
impl<C: Send + 'static> Middleware<C> for After<C> {
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        next.run(ctx).await?;
        chain::execute(&self.layers, ctx).await
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    fn stack(&self) -> &[DynMiddleware<C>] {
        &self.layers
    }
}

// ── Catch ─────────────────────────────────────────────────────────────────────

/// The fault-handler shape accepted by [`Catch`]: receives the failure and
/// the context.
///
/// Implemented for any `async fn(Error, &mut C) -> Result<(), Error>`.
/// Returning `Ok` swallows the fault; returning `Err` re-raises (the same
/// failure or a different one).
pub trait Recover<'a, C: 'a>: Send + Sync {
    /// The future returned by the handler.
    type Future: Future<Output = Result<(), Error>> + Send + 'a;

    /// Invokes the handler.
    fn call(&'a self, err: Error, ctx: &'a mut C) -> Self::Future;
}

impl<'a, C, F, Fut> Recover<'a, C> for F
where
    C: 'a,
    F: Fn(Error, &'a mut C) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send + 'a,
{
    type Future = Fut;

    fn call(&'a self, err: Error, ctx: &'a mut C) -> Fut {
        self(err, ctx)
    }
}

/// Internal dispatch interface for fault handlers.
trait ErasedRecover<C>: Send + Sync {
    fn invoke<'a>(&'a self, err: Error, ctx: &'a mut C) -> BoxFuture<'a, Result<(), Error>>;
}

struct RecoverFn<F>(F);

impl<C, F> ErasedRecover<C> for RecoverFn<F>
where
    F: for<'a> Recover<'a, C>,
{
    fn invoke<'a>(&'a self, err: Error, ctx: &'a mut C) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(self.0.call(err, ctx))
    }
}

/// Fault interception over a subtree.
///
/// The guarded sequence runs with the outer remainder as its continuation,
/// so `Catch` fully replaces its slot in the outer chain: execution
/// continues past it only if the guarded chain resumes the outer
/// continuation, and a fault anywhere under it — its own layers or the
/// remainder they resumed — reaches the fault handler instead of the
/// caller.
pub struct Catch<C> {
    recover: Box<dyn ErasedRecover<C>>,
    layers: Vec<DynMiddleware<C>>,
    meta: Option<Meta>,
}

impl<C: Send + 'static> Catch<C> {
    /// Guards `guarded` with the fault handler `recover`.
    pub fn new(recover: impl for<'a> Recover<'a, C> + 'static, guarded: Stack<C>) -> Self {
        Self {
            recover: Box::new(RecoverFn(recover)),
            layers: guarded.into_layers(),
            meta: None,
        }
    }

    /// Attaches a descriptor.
    pub fn annotate(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[async_trait]
impl<C: Send + 'static> Middleware<C> for Catch<C> {
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        match next.prepend(&self.layers).run(ctx).await {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!(error = %err, "fault intercepted");
                self.recover.invoke(err, ctx).await
            }
        }
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    fn stack(&self) -> &[DynMiddleware<C>] {
        &self.layers
    }
}
