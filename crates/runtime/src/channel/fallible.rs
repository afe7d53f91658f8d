use std::fmt;

use thiserror::Error;

use super::{Channel, ChannelError, SendError};
use crate::Deadline;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum FallibleError<E> {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("sender reported a failure")]
    Failure(E),
}

/// A channel whose senders may deliver an error instead of a value.
///
/// A received error surfaces as [`FallibleError::Failure`].
pub struct FallibleChannel<T, E> {
    channel: Channel<Result<T, E>>,
}

impl<T, E> FallibleChannel<T, E> {
    pub fn new() -> Self {
        Self { channel: Channel::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { channel: Channel::with_capacity(capacity) }
    }

    pub async fn send(&self, value: T, deadline: Deadline) -> Result<(), SendError<T>> {
        self.channel.send(Ok(value), deadline).await.map_err(|e| match e {
            SendError::Closed(Ok(value)) => SendError::Closed(value),
            SendError::Timeout(Ok(value)) => SendError::Timeout(value),
            // only `Ok` was sent
            SendError::Closed(Err(_)) | SendError::Timeout(Err(_)) => unreachable!(),
        })
    }

    /// Delivers `error` to a receiver in place of a value.
    pub async fn send_error(&self, error: E, deadline: Deadline) -> Result<(), SendError<E>> {
        self.channel.send(Err(error), deadline).await.map_err(|e| match e {
            SendError::Closed(Err(error)) => SendError::Closed(error),
            SendError::Timeout(Err(error)) => SendError::Timeout(error),
            SendError::Closed(Ok(_)) | SendError::Timeout(Ok(_)) => unreachable!(),
        })
    }

    pub async fn receive(&self, deadline: Deadline) -> Result<T, FallibleError<E>> {
        self.channel.receive(deadline).await?.map_err(FallibleError::Failure)
    }

    pub fn close(&self) {
        self.channel.close();
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }
}

impl<T, E> Default for FallibleChannel<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for FallibleChannel<T, E> {
    fn clone(&self) -> Self {
        Self { channel: self.channel.clone() }
    }
}

impl<T, E> fmt::Debug for FallibleChannel<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FallibleChannel").field(&self.channel).finish()
    }
}
