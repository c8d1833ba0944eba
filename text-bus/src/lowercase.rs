use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::message::{Message, MessageReceiver, PipeSender};
use crate::pipeline::StageExit;
use crate::transform;

/// Stage 1: lowercases inbound messages and forwards them on the stage link,
/// at most one forward per `rate_limit` interval.
///
/// The sentinel is forwarded and ends the loop; the token is honored only
/// between messages, so work already queued ahead of a sentinel is never
/// abandoned. The pacing sleep trails the send: the first message goes out
/// immediately.
pub(crate) async fn run_lowercase(
    mut rx: MessageReceiver,
    tx: PipeSender,
    rate_limit: Duration,
    cancel: CancellationToken,
) -> StageExit {
    log::info!("lowercase stage started, rate limit {:?}", rate_limit);

    let exit = loop {
        tokio::select! {
            // Drain pending messages before honoring cancellation.
            biased;
            msg = rx.recv() => match msg {
                Some(Message::Exit) => {
                    if let Err(e) = tx.send(Message::Exit).await {
                        log::error!("lowercase: sentinel forward failed: {}", e);
                    }
                    break StageExit::Sentinel;
                }
                Some(Message::Text(text)) => {
                    let lowered = transform::lowercase(&text);
                    log::debug!("lowercase: '{}' -> '{}'", text, lowered);
                    if let Err(e) = tx.send(Message::Text(lowered)).await {
                        log::error!("lowercase: forward failed: {}", e);
                        continue;
                    }
                    tokio::time::sleep(rate_limit).await;
                }
                None => {
                    break StageExit::Closed;
                }
            },
            _ = cancel.cancelled() => {
                break StageExit::Cancelled;
            }
        }
    };

    log::info!("lowercase stage finished: {:?}", exit);
    exit
}
