//! # strata
//!
//! A minimal middleware composition engine for async Rust.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! You hand strata an ordered sequence of processing units and a mutable
//! context; it builds one asynchronous continuation chain and runs it. Each
//! unit receives the context and "the rest of the chain" ([`Next`]) and
//! decides whether the remainder runs at all, runs now, or runs between its
//! own effects. That single primitive is the whole engine — branching,
//! epilogues, and fault interception ([`If`], [`AfterIf`], [`After`],
//! [`Catch`]) are ordinary middleware built on top of it, not engine
//! features.
//!
//! What strata intentionally does not do:
//!
//! - **No I/O** — the context is yours; strata never reads or writes a
//!   domain field
//! - **No scheduling, timers, retries** — a unit that hangs, hangs; a unit
//!   that fails, fails outward
//! - **No error classification** — failures are carried, boxed, to the
//!   caller of [`Stack::execute`]; [`Catch`] is the only recovery primitive
//!   and only covers its own subtree
//!
//! ## Quick start
//!
//! ```rust
//! use strata::{Error, Next, Stack};
//!
//! struct Greeting {
//!     audience: String,
//!     lines: Vec<String>,
//! }
//!
//! // Auto-advancing: the chain resumes once this resolves.
//! async fn compose(ctx: &mut Greeting) -> Result<(), Error> {
//!     let line = format!("hello, {}", ctx.audience);
//!     ctx.lines.push(line);
//!     Ok(())
//! }
//!
//! // Explicit: receives the rest of the chain and decides when it runs.
//! async fn gate(ctx: &mut Greeting, next: Next<'_, Greeting>) -> Result<(), Error> {
//!     if ctx.audience.is_empty() {
//!         return Ok(()); // dropping `next` skips the rest of the chain
//!     }
//!     next.run(ctx).await
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Error> {
//! let app = Stack::new().with(gate).with(compose);
//!
//! let mut ctx = Greeting { audience: "world".into(), lines: Vec::new() };
//! app.execute(&mut ctx).await?;
//! assert_eq!(ctx.lines, ["hello, world"]);
//! # Ok(())
//! # }
//! ```
//!
//! Stacks nest (a [`Stack`] is itself a [`Middleware`]), compositions are
//! introspectable after the fact ([`hierarchy`]), and the whole chain can be
//! capped with a terminal continuation ([`Stack::execute_with`]).

mod chain;
mod combinator;
mod error;
mod handler;
mod hierarchy;
mod meta;
mod middleware;
mod stack;

pub use chain::{execute, execute_with, Next};
pub use combinator::{After, AfterIf, Catch, If, Recover};
pub use error::{BoxError, Error};
pub use handler::{convert, convert_with, shape, AutoHandler, Handler, IntoMiddleware};
pub use hierarchy::{hierarchy, Node};
pub use meta::Meta;
pub use middleware::{BoxFuture, DynMiddleware, Middleware};
pub use stack::Stack;
