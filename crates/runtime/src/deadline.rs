//! Absolute deadlines bounding blocking operations.
//!
//! Every suspending call in this crate (channel operations, stream I/O,
//! `accept`) takes a [`Deadline`]. Expiry is reported as an ordinary error
//! value, never as a forced unwind, so the resource stays usable afterwards.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// A point in time after which a blocking operation gives up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Deadline {
    /// Wait as long as it takes.
    #[default]
    Never,
    /// Poll once and give up if the operation is not ready.
    Immediate,
    /// Give up at the given instant.
    At(Instant),
}

/// Returned by [`Deadline::run`] when the deadline passed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline elapsed")]
pub struct Elapsed;

impl Deadline {
    pub fn never() -> Self {
        Deadline::Never
    }

    pub fn immediate() -> Self {
        Deadline::Immediate
    }

    pub fn after(duration: Duration) -> Self {
        Deadline::At(Instant::now() + duration)
    }

    pub fn at(instant: Instant) -> Self {
        Deadline::At(instant)
    }

    /// The instant this deadline expires at, `None` for [`Deadline::Never`].
    pub fn instant(&self) -> Option<Instant> {
        match self {
            Deadline::Never => None,
            Deadline::Immediate => Some(Instant::now()),
            Deadline::At(instant) => Some(*instant),
        }
    }

    pub fn is_expired(&self) -> bool {
        match self {
            Deadline::Never => false,
            Deadline::Immediate => true,
            Deadline::At(instant) => *instant <= Instant::now(),
        }
    }

    /// Time left before expiry, `None` when the deadline never expires.
    pub fn remaining(&self) -> Option<Duration> {
        self.instant().map(|instant| instant.saturating_duration_since(Instant::now()))
    }

    /// Drives `future` until it completes or the deadline passes.
    ///
    /// The future is always polled at least once, so an [`Deadline::Immediate`]
    /// deadline still picks up a result that is already available.
    pub async fn run<F: Future>(self, future: F) -> Result<F::Output, Elapsed> {
        match self.instant() {
            None => Ok(future.await),
            Some(instant) => tokio::time::timeout_at(instant, future).await.map_err(|_elapsed| Elapsed),
        }
    }
}

impl From<Duration> for Deadline {
    fn from(duration: Duration) -> Self {
        Deadline::after(duration)
    }
}

impl From<Instant> for Deadline {
    fn from(instant: Instant) -> Self {
        Deadline::at(instant)
    }
}
