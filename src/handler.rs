//! Handler shapes and normalization.
//!
//! # How handlers are stored
//!
//! A [`Stack`](crate::Stack) needs to hold units of *different* types in a
//! single `Vec`. Rust collections can only hold one concrete type, so every
//! accepted shape is normalized at registration into a trait object
//! (`DynMiddleware<C>`) behind a common interface.
//!
//! Three shapes are accepted:
//!
//! | Shape | Signature | Auto-advance? |
//! |---|---|---|
//! | explicit fn | `async fn(&mut C, Next<'_, C>) -> Result<(), Error>` | no — resumes the chain itself |
//! | auto fn | `async fn(&mut C) -> Result<(), Error>` | yes — the engine resumes after it resolves |
//! | object | any [`Middleware<C>`] implementor | no — same contract as explicit |
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn audit(ctx: &mut Ctx) -> Result<(), Error> { … }   ← user writes this
//!        ↓ stack.with(audit)
//! audit.into_middleware()                  ← IntoMiddleware, shape picked by
//!        ↓                                   trait selection at compile time
//! Arc::new(AutoMiddleware { f: audit })    ← heap-allocated wrapper
//!        ↓ stored as DynMiddleware<Ctx>
//! unit.process(ctx, next)  at run time     ← one vtable dispatch per step
//! ```
//!
//! Normalization is total and order-preserving: registering N handlers
//! yields exactly N units in the same order, each independently invocable.
//! A shape the table does not list is rejected at the `with` call site by
//! the compiler; nothing is deferred to execution.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::chain::Next;
use crate::error::Error;
use crate::meta::Meta;
use crate::middleware::{DynMiddleware, Middleware};

// ── Function shapes ───────────────────────────────────────────────────────────

/// The explicit-continuation handler shape.
///
/// Implemented for any `async fn(&mut C, Next<'_, C>) -> Result<(), Error>`.
/// The handler owns the continuation: it may resume the chain before, after,
/// or between its own effects, or drop it to truncate.
pub trait Handler<'a, C: 'a>: Send + Sync {
    /// The future returned by the handler.
    type Future: Future<Output = Result<(), Error>> + Send + 'a;

    /// Invokes the handler.
    fn call(&'a self, ctx: &'a mut C, next: Next<'a, C>) -> Self::Future;
}

impl<'a, C, F, Fut> Handler<'a, C> for F
where
    C: 'a,
    F: Fn(&'a mut C, Next<'a, C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send + 'a,
{
    type Future = Fut;

    fn call(&'a self, ctx: &'a mut C, next: Next<'a, C>) -> Fut {
        self(ctx, next)
    }
}

/// The auto-advancing handler shape.
///
/// Implemented for any `async fn(&mut C) -> Result<(), Error>`. The engine
/// resumes the chain after the handler resolves; a failure propagates before
/// the remainder is ever reached. Terminal continuations use this shape too.
pub trait AutoHandler<'a, C: 'a>: Send + Sync {
    /// The future returned by the handler.
    type Future: Future<Output = Result<(), Error>> + Send + 'a;

    /// Invokes the handler.
    fn call(&'a self, ctx: &'a mut C) -> Self::Future;
}

impl<'a, C, F, Fut> AutoHandler<'a, C> for F
where
    C: 'a,
    F: Fn(&'a mut C) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send + 'a,
{
    type Future = Fut;

    fn call(&'a self, ctx: &'a mut C) -> Fut {
        self(ctx)
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

/// Newtype holding an explicit-continuation fn and bridging it to the
/// trait-object world.
struct FnMiddleware<F> {
    f: F,
}

#[async_trait]
impl<C, F> Middleware<C> for FnMiddleware<F>
where
    C: Send + 'static,
    F: for<'a> Handler<'a, C> + 'static,
{
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        self.f.call(ctx, next).await
    }
}

/// Newtype holding an auto-advancing fn. Resumes the chain itself, after the
/// fn resolves.
struct AutoMiddleware<F> {
    f: F,
}

#[async_trait]
impl<C, F> Middleware<C> for AutoMiddleware<F>
where
    C: Send + 'static,
    F: for<'a> AutoHandler<'a, C> + 'static,
{
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        self.f.call(ctx).await?;
        next.run(ctx).await
    }
}

/// Overlay attaching a descriptor to a unit that has none of its own.
struct WithMeta<C> {
    inner: DynMiddleware<C>,
    meta: Meta,
}

#[async_trait]
impl<C: Send + 'static> Middleware<C> for WithMeta<C> {
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        self.inner.process(ctx, next).await
    }

    fn meta(&self) -> Option<&Meta> {
        Some(&self.meta)
    }

    fn stack(&self) -> &[DynMiddleware<C>] {
        self.inner.stack()
    }
}

// ── Conversion ────────────────────────────────────────────────────────────────

/// Markers distinguishing the accepted handler shapes.
///
/// These only appear as an inference aid in [`IntoMiddleware`] bounds; you
/// never name them directly. Exactly one shape applies to any registered
/// handler, so the compiler picks the marker on its own.
pub mod shape {
    /// A type implementing [`Middleware`](crate::Middleware) itself.
    pub enum Object {}
    /// An already-normalized shared unit.
    pub enum Shared {}
    /// `async fn(&mut C, Next<'_, C>) -> Result<(), Error>`.
    pub enum Explicit {}
    /// `async fn(&mut C) -> Result<(), Error>`.
    pub enum Auto {}
}

/// Conversion of any accepted handler shape into a canonical unit.
///
/// This is the registration-time half of the engine:
/// [`Stack::with`](crate::Stack::with) goes through it, and custom
/// combinators can call [`convert`] to accept the same shapes a stack does.
pub trait IntoMiddleware<C, S>: Sized
where
    C: Send + 'static,
{
    /// Normalizes `self` into a shared, type-erased unit.
    fn into_middleware(self) -> DynMiddleware<C>;
}

impl<C, T> IntoMiddleware<C, shape::Object> for T
where
    C: Send + 'static,
    T: Middleware<C> + 'static,
{
    fn into_middleware(self) -> DynMiddleware<C> {
        Arc::new(self)
    }
}

/// Already canonical: conversion is the identity, so normalizing twice
/// yields the same unit.
impl<C> IntoMiddleware<C, shape::Shared> for DynMiddleware<C>
where
    C: Send + 'static,
{
    fn into_middleware(self) -> DynMiddleware<C> {
        self
    }
}

impl<C, F> IntoMiddleware<C, shape::Explicit> for F
where
    C: Send + 'static,
    F: for<'a> Handler<'a, C> + 'static,
{
    fn into_middleware(self) -> DynMiddleware<C> {
        Arc::new(FnMiddleware { f: self })
    }
}

impl<C, F> IntoMiddleware<C, shape::Auto> for F
where
    C: Send + 'static,
    F: for<'a> AutoHandler<'a, C> + 'static,
{
    fn into_middleware(self) -> DynMiddleware<C> {
        Arc::new(AutoMiddleware { f: self })
    }
}

/// Normalizes `handler` into a canonical unit.
pub fn convert<C, S>(handler: impl IntoMiddleware<C, S>) -> DynMiddleware<C>
where
    C: Send + 'static,
{
    handler.into_middleware()
}

/// Normalizes `handler` and attaches `meta`.
///
/// A unit that already carries its own descriptor keeps it; the supplied
/// `meta` only fills the gap for units that have none.
pub fn convert_with<C, S>(handler: impl IntoMiddleware<C, S>, meta: Meta) -> DynMiddleware<C>
where
    C: Send + 'static,
{
    let unit = handler.into_middleware();
    if unit.meta().is_some() {
        unit
    } else {
        Arc::new(WithMeta { inner: unit, meta })
    }
}
