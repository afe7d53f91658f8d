use futures::FutureExt;
use futures::future::{BoxFuture, select_all};

use super::{Channel, ChannelError};
use crate::Deadline;

/// Receives from whichever of `channels` has a value first.
///
/// Returns the index of the channel together with the value. Closed
/// channels are skipped; when every channel is closed the result is
/// [`ChannelError::Closed`]. Losing receives are withdrawn, so no value is
/// taken from a channel other than the one reported.
pub async fn select<T>(channels: &[&Channel<T>], deadline: Deadline) -> Result<(usize, T), ChannelError>
where
    T: Send + 'static,
{
    for (index, channel) in channels.iter().enumerate() {
        if let Some(value) = channel.try_receive() {
            return Ok((index, value));
        }
    }

    let mut pending: Vec<BoxFuture<'static, (usize, Result<T, ChannelError>)>> = channels
        .iter()
        .enumerate()
        .filter(|(_, channel)| !channel.is_closed())
        .map(|(index, channel)| {
            let channel = (*channel).clone();
            async move { (index, channel.receive(Deadline::never()).await) }.boxed()
        })
        .collect();

    let race = async move {
        while !pending.is_empty() {
            let ((index, result), _, rest) = select_all(pending).await;
            match result {
                Ok(value) => return Ok((index, value)),
                Err(_closed) => pending = rest,
            }
        }
        Err(ChannelError::Closed)
    };

    deadline.run(race).await.unwrap_or(Err(ChannelError::Timeout))
}
