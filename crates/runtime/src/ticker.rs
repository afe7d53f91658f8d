use std::time::Duration;

use futures::Stream;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

use crate::channel::{Channel, ChannelError};
use crate::{Deadline, Task, spawn};

/// Delivers the current instant on a channel once per period.
///
/// Ticks are sent on an unbuffered channel: a tick nobody is waiting for is
/// held until it is received, and later ticks are skipped meanwhile.
/// Stopping the ticker (or dropping it) closes the channel.
#[derive(Debug)]
pub struct Ticker {
    channel: Channel<Instant>,
    task: Task<()>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let channel = Channel::new();

        let sender = channel.clone();
        let task = spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let tick = interval.tick().await;
                if sender.send(tick, Deadline::never()).await.is_err() {
                    break;
                }
            }
            trace!("ticker finished");
        });

        Self { channel, task }
    }

    /// Waits for the next tick.
    pub async fn tick(&self, deadline: Deadline) -> Result<Instant, ChannelError> {
        self.channel.receive(deadline).await
    }

    /// The channel ticks are delivered on.
    pub fn channel(&self) -> &Channel<Instant> {
        &self.channel
    }

    pub fn stream(&self) -> impl Stream<Item = Instant> + Send + 'static {
        self.channel.stream()
    }

    pub fn stop(&self) {
        self.task.abort();
        self.channel.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.channel.is_closed()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
