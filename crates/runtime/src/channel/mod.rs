//! Typed channels for synchronizing tasks.
//!
//! # Components
//!
//! - [`Channel`]: unbuffered rendezvous by default, optionally buffered
//! - [`select`]: waits on several channels at once
//! - [`FallibleChannel`]: carries either a value or an error
//!
//! Every value sent is received exactly once. Parked senders and receivers
//! withdraw themselves when their deadline passes or their future is
//! dropped; a value that was handed to a receiver which has since gone away
//! is put back at the front of the channel.

mod fallible;
mod select;

pub use fallible::FallibleChannel;
pub use fallible::FallibleError;
pub use select::select;

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::Stream;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::trace;

use crate::Deadline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel is closed")]
    Closed,

    #[error("channel operation timed out")]
    Timeout,
}

/// Returned by a failed send, handing the value back to the caller.
#[derive(PartialEq, Eq, Error)]
pub enum SendError<T> {
    #[error("channel is closed")]
    Closed(T),

    #[error("channel send timed out")]
    Timeout(T),
}

impl<T> SendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            SendError::Closed(value) | SendError::Timeout(value) => value,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SendError::Closed(_))
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Closed(_) => f.write_str("Closed(..)"),
            SendError::Timeout(_) => f.write_str("Timeout(..)"),
        }
    }
}

/// A channel between tasks.
///
/// `Channel` is a handle: clones refer to the same channel, and any clone
/// may send, receive or close.
pub struct Channel<T> {
    inner: Arc<Mutex<State<T>>>,
}

struct State<T> {
    closed: bool,
    capacity: usize,
    next_id: u64,
    buffer: VecDeque<T>,
    /// Values handed to receivers that went away; not counted against `capacity`.
    requeued: VecDeque<T>,
    receivers: VecDeque<ParkedReceiver<T>>,
    senders: VecDeque<ParkedSender<T>>,
}

struct ParkedReceiver<T> {
    id: u64,
    tx: oneshot::Sender<T>,
}

struct ParkedSender<T> {
    id: u64,
    value: T,
    notify: Option<oneshot::Sender<()>>,
}

impl<T> Channel<T> {
    /// Creates an unbuffered channel: `send` completes once a receiver took the value.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a channel buffering up to `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        let state = State {
            closed: false,
            capacity,
            next_id: 0,
            buffer: VecDeque::with_capacity(capacity),
            requeued: VecDeque::new(),
            receivers: VecDeque::new(),
            senders: VecDeque::new(),
        };
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends `value`, waiting for a receiver (or buffer space) until `deadline`.
    pub async fn send(&self, value: T, deadline: Deadline) -> Result<(), SendError<T>> {
        let parked = {
            let mut state = self.lock();
            if state.closed {
                return Err(SendError::Closed(value));
            }

            let value = match state.offer(value) {
                Ok(()) => return Ok(()),
                Err(value) => value,
            };

            if state.buffer.len() < state.capacity {
                state.buffer.push_back(value);
                return Ok(());
            }

            let (notify, notified) = oneshot::channel();
            let id = state.next_id();
            state.senders.push_back(ParkedSender { id, value, notify: Some(notify) });
            ParkedSend { channel: self.clone(), id, notified, done: false }
        };

        parked.wait(deadline).await
    }

    /// Sends without waiting; fails with `Timeout` when no receiver or buffer slot is ready.
    pub fn try_send(&self, value: T) -> Result<(), SendError<T>> {
        let mut state = self.lock();
        if state.closed {
            return Err(SendError::Closed(value));
        }

        let value = match state.offer(value) {
            Ok(()) => return Ok(()),
            Err(value) => value,
        };

        if state.buffer.len() < state.capacity {
            state.buffer.push_back(value);
            Ok(())
        } else {
            Err(SendError::Timeout(value))
        }
    }

    /// Receives the next value, waiting until `deadline`.
    ///
    /// Fails with [`ChannelError::Closed`] once the channel is closed and drained.
    pub async fn receive(&self, deadline: Deadline) -> Result<T, ChannelError> {
        let parked = {
            let mut state = self.lock();
            if let Some(value) = state.take() {
                return Ok(value);
            }

            if state.closed {
                return Err(ChannelError::Closed);
            }

            let (tx, rx) = oneshot::channel();
            let id = state.next_id();
            state.receivers.push_back(ParkedReceiver { id, tx });
            ParkedReceive { channel: self.clone(), id, rx, done: false }
        };

        parked.wait(deadline).await
    }

    /// Receives a value if one is ready right now.
    pub fn try_receive(&self) -> Option<T> {
        self.lock().take()
    }

    /// Closes the channel.
    ///
    /// Buffered values stay receivable. Parked receivers wake up with
    /// [`ChannelError::Closed`], parked senders get their value back.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }

        state.closed = true;
        state.receivers.clear();
        for sender in &mut state.senders {
            sender.notify.take();
        }
        trace!("channel closed");
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of values waiting to be received, parked senders excluded.
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.buffer.len() + state.requeued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over received values until the channel is closed.
    pub fn stream(&self) -> impl Stream<Item = T> + Send + 'static
    where
        T: Send + 'static,
    {
        futures::stream::unfold(self.clone(), |channel| async move {
            let value = channel.receive(Deadline::never()).await.ok()?;
            Some((value, channel))
        })
    }

    fn withdraw_receiver(&self, id: u64) -> bool {
        let mut state = self.lock();
        match state.receivers.iter().position(|receiver| receiver.id == id) {
            Some(index) => {
                state.receivers.remove(index);
                true
            }
            None => false,
        }
    }

    fn withdraw_sender(&self, id: u64) -> Option<T> {
        let mut state = self.lock();
        let index = state.senders.iter().position(|sender| sender.id == id)?;
        state.senders.remove(index).map(|sender| sender.value)
    }

    /// Puts back a value whose receiver went away after it was handed over.
    fn requeue(&self, value: T) {
        let mut state = self.lock();
        if let Err(value) = state.offer(value) {
            state.requeued.push_front(value);
        }
    }
}

impl<T> State<T> {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Hands `value` to the oldest parked receiver, if any.
    fn offer(&mut self, mut value: T) -> Result<(), T> {
        while let Some(receiver) = self.receivers.pop_front() {
            match receiver.tx.send(value) {
                Ok(()) => return Ok(()),
                Err(returned) => value = returned,
            }
        }
        Err(value)
    }

    /// Takes the next value: requeued ones first, then the buffer, then a
    /// parked sender. The buffer never grows past `capacity`.
    fn take(&mut self) -> Option<T> {
        if let Some(value) = self.requeued.pop_front() {
            return Some(value);
        }

        if let Some(value) = self.buffer.pop_front() {
            if !self.closed && self.buffer.len() < self.capacity {
                if let Some(sender) = self.senders.pop_front() {
                    let ParkedSender { value: next, notify, .. } = sender;
                    self.buffer.push_back(next);
                    if let Some(notify) = notify {
                        let _ = notify.send(());
                    }
                }
            }
            return Some(value);
        }

        if self.closed {
            return None;
        }

        let ParkedSender { value, notify, .. } = self.senders.pop_front()?;
        if let Some(notify) = notify {
            let _ = notify.send(());
        }
        Some(value)
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Channel")
            .field("closed", &state.closed)
            .field("capacity", &state.capacity)
            .field("buffered", &state.buffer.len())
            .field("requeued", &state.requeued.len())
            .field("parked_receivers", &state.receivers.len())
            .field("parked_senders", &state.senders.len())
            .finish()
    }
}

struct ParkedReceive<T> {
    channel: Channel<T>,
    id: u64,
    rx: oneshot::Receiver<T>,
    done: bool,
}

impl<T> ParkedReceive<T> {
    async fn wait(mut self, deadline: Deadline) -> Result<T, ChannelError> {
        let outcome = deadline.run(&mut self.rx).await;
        self.done = true;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            // the sending half is only dropped by `close`
            Ok(Err(_)) => Err(ChannelError::Closed),
            Err(_elapsed) => {
                if self.channel.withdraw_receiver(self.id) {
                    Err(ChannelError::Timeout)
                } else {
                    // handed over right as the deadline passed
                    self.rx.try_recv().map_err(|_empty| ChannelError::Closed)
                }
            }
        }
    }
}

impl<T> Drop for ParkedReceive<T> {
    fn drop(&mut self) {
        if self.done || self.channel.withdraw_receiver(self.id) {
            return;
        }

        if let Ok(value) = self.rx.try_recv() {
            self.channel.requeue(value);
        }
    }
}

struct ParkedSend<T> {
    channel: Channel<T>,
    id: u64,
    notified: oneshot::Receiver<()>,
    done: bool,
}

impl<T> ParkedSend<T> {
    async fn wait(mut self, deadline: Deadline) -> Result<(), SendError<T>> {
        let outcome = deadline.run(&mut self.notified).await;
        self.done = true;

        if let Ok(Ok(())) = outcome {
            return Ok(());
        }

        match self.channel.withdraw_sender(self.id) {
            // a receiver took the value before we could withdraw it
            None => Ok(()),
            Some(value) if self.channel.is_closed() => Err(SendError::Closed(value)),
            Some(value) => Err(SendError::Timeout(value)),
        }
    }
}

impl<T> Drop for ParkedSend<T> {
    fn drop(&mut self) {
        if !self.done {
            self.channel.withdraw_sender(self.id);
        }
    }
}
