//! Bounded fan-out/fan-in combinators for batches of asynchronous work.
//!
//! This crate applies a caller-supplied asynchronous operation to every
//! element of a sequence with a bounded number of simultaneous executions,
//! then rejoins the results in the original element order before the caller
//! proceeds.
//!
//! # Key Components
//!
//! ## Batch Combinators
//!
//! - [`batch`] - `map`, `filter` and `for_each` over eagerly-available
//!   sequences
//! - [`stream`] - the same three shapes over incrementally-produced sources,
//!   interleaving source pulls with already-running work
//!
//! ## Admission Control
//!
//! - [`gate`] - the per-call concurrency gate bounding how many operation
//!   bodies run at once; spawning is never limited, only execution
//! - [`options`] - the explicit concurrency limit and cancellation signal
//!   threaded through one call
//!
//! ## Joining
//!
//! - [`wait`] - the batch join primitive for work the caller started itself
//!
//! # Execution Model
//!
//! Every element becomes one spawned work unit tagged with its zero-based
//! source position. Units acquire a gate slot before invoking the operation
//! body and the join barrier waits for all of them to reach a terminal
//! state, successfully or not, before any result or failure is surfaced.
//! Completion order is never observable in the output: results come back in
//! source-traversal order, and a failing call never yields a partial result
//! set.
//!
//! # Example
//!
//! ```
//! use fanjoin::{BatchOptions, Limit};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> fanjoin::Result<()> {
//! let options = BatchOptions::new().limit(Limit::bounded(4)?);
//! let doubled = fanjoin::batch::map(0..16, &options, |element, _position, _cancel| {
//!     async move { Ok(element * 2) }
//! })
//! .await?;
//! assert_eq!(doubled[7], 14);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod gate;
pub mod options;
pub mod result;
pub mod stream;
mod unit;
pub mod wait;

pub use error::{Error, ErrorKind};
pub use options::{BatchOptions, Limit};
pub use result::Result;
pub use wait::wait_all;
