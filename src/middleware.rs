//! The canonical middleware unit.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::chain::Next;
use crate::error::Error;
use crate::meta::Meta;

/// A heap-allocated, type-erased future.
///
/// `Pin<Box<…>>` is required because the async runtime must be able to poll
/// the future in-place; it cannot move it in memory after the first poll.
/// `Send` lets a multi-threaded runtime move the future across threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shared, type-erased middleware unit.
///
/// `Arc` gives cheap, thread-safe shared ownership: the same unit can sit in
/// several compositions and serve overlapping executions without copying.
pub type DynMiddleware<C> = Arc<dyn Middleware<C>>;

/// The canonical middleware unit: one processing step over a shared context.
///
/// `C` is the caller-defined context threaded through one execution. The
/// engine never reads or writes its fields; everything domain-shaped lives
/// on the caller's side of this trait.
///
/// Most units are plain `async fn`s registered on a [`Stack`](crate::Stack)
/// and never implement this trait by hand. Implement it directly when a unit
/// carries state of its own, the way [`If`](crate::If) or
/// [`Catch`](crate::Catch) do.
#[async_trait]
pub trait Middleware<C>: Send + Sync {
    /// Runs this unit. `next` is the rest of the chain: call
    /// [`run`](Next::run) to resume it, drop it to truncate.
    async fn process(&self, ctx: &mut C, next: Next<'_, C>) -> Result<(), Error>;

    /// This unit's descriptor, if any. Feeds tracing and
    /// [`hierarchy`](crate::hierarchy).
    fn meta(&self) -> Option<&Meta> {
        None
    }

    /// Nested units, in order, for introspection only. The engine never
    /// executes these itself; a unit that holds an inner sequence runs it
    /// from inside its own `process`.
    fn stack(&self) -> &[DynMiddleware<C>] {
        &[]
    }
}
