//! Cooperative runtime primitives for strand.
//!
//! Tasks run on tokio and only give up control at suspension points. On top
//! of that this crate provides deadline-bounded channels, tickers, and byte
//! streams with uniform error reporting.
//!
//! # Components
//!
//! - [`Scheduler`], [`spawn`], [`yield_now`], [`nap`], [`wake_at`], [`after`]
//! - [`Deadline`]: absolute bound for every blocking call
//! - [`Channel`], [`select`], [`FallibleChannel`]
//! - [`Ticker`]
//! - [`stream`]: [`Stream`](stream::Stream), [`Host`](stream::Host) and their TCP and in-memory implementations
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use strand_runtime::{Channel, Deadline, spawn};
//!
//! # async fn run() {
//! let channel = Channel::new();
//! let sender = channel.clone();
//! spawn(async move { sender.send("ping", Deadline::never()).await });
//!
//! let message = channel.receive(Deadline::after(Duration::from_secs(1))).await;
//! assert_eq!(message, Ok("ping"));
//! # }
//! ```

pub mod channel;
mod deadline;
mod scheduler;
pub mod stream;
mod ticker;

pub use channel::{Channel, ChannelError, FallibleChannel, FallibleError, SendError, select};
pub use deadline::{Deadline, Elapsed};
pub use scheduler::{Scheduler, Task, TaskError, after, nap, spawn, spawn_with_failure_handler, wake_at, yield_now};
pub use ticker::Ticker;
