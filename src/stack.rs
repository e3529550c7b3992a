//! Ordered middleware composition.

use async_trait::async_trait;

use crate::chain::{self, Next};
use crate::error::Error;
use crate::handler::{convert, convert_with, AutoHandler, IntoMiddleware};
use crate::meta::Meta;
use crate::middleware::{DynMiddleware, Middleware};

/// An ordered collection of middleware.
///
/// Handlers are normalized as they are registered and run in registration
/// order. Each [`Stack::with`] call returns `self` so registrations chain
/// naturally; build the stack once, then execute it as many times as you
/// like — one context per execution, no state shared between executions.
///
/// A `Stack` is itself a valid [`Middleware`], so stacks nest: register one
/// inside another and its layers run in place, with the outer remainder as
/// their continuation.
pub struct Stack<C> {
    layers: Vec<DynMiddleware<C>>,
    meta: Option<Meta>,
}

impl<C: Send + 'static> Stack<C> {
    /// An empty stack.
    pub fn new() -> Self {
        Self { layers: Vec::new(), meta: None }
    }

    /// An empty stack carrying a display name, visible in logs and
    /// introspection.
    pub fn named(name: impl Into<String>) -> Self {
        Self { layers: Vec::new(), meta: Some(Meta::named(name)) }
    }

    /// Normalizes `handler` and appends it. Returns `self` for chaining.
    ///
    /// Accepts any of the three handler shapes — see
    /// [`IntoMiddleware`](crate::IntoMiddleware).
    pub fn with<S>(mut self, handler: impl IntoMiddleware<C, S>) -> Self {
        self.layers.push(convert(handler));
        self
    }

    /// Like [`with`](Stack::with), attaching `meta` to the appended unit.
    pub fn with_meta<S>(mut self, handler: impl IntoMiddleware<C, S>, meta: Meta) -> Self {
        self.layers.push(convert_with(handler, meta));
        self
    }

    /// Runs the stack over `ctx`.
    ///
    /// Resolves when the chain completes, including when a layer truncates
    /// it; fails with the first uncaught fault.
    pub async fn execute(&self, ctx: &mut C) -> Result<(), Error> {
        chain::execute(&self.layers, ctx).await
    }

    /// Runs the stack over `ctx`, then `terminal`, if every layer advanced.
    pub async fn execute_with<F>(&self, ctx: &mut C, terminal: F) -> Result<(), Error>
    where
        F: for<'a> AutoHandler<'a, C>,
    {
        chain::execute_with(&self.layers, ctx, terminal).await
    }

    /// The registered layers, in execution order.
    pub fn layers(&self) -> &[DynMiddleware<C>] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub(crate) fn into_layers(self) -> Vec<DynMiddleware<C>> {
        self.layers
    }
}

impl<C: Send + 'static> Default for Stack<C> {
    fn default() -> Self {
        Self::new()
    }
}

// Layers are shared, so cloning is cheap and the clone executes
// independently. Written out by hand: deriving would demand `C: Clone`.
impl<C> Clone for Stack<C> {
    fn clone(&self) -> Self {
        Self { layers: self.layers.clone(), meta: self.meta.clone() }
    }
}

#[async_trait]
impl<C: Send + 'static> Middleware<C> for Stack<C> {
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error> {
        next.prepend(&self.layers).run(ctx).await
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    fn stack(&self) -> &[DynMiddleware<C>] {
        &self.layers
    }
}
