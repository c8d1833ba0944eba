use tokio_util::sync::CancellationToken;

use crate::message::{Message, MessageSender, PipeReceiver};
use crate::pipeline::StageExit;
use crate::transform;

/// Stage 2: ROT13-encodes messages from the stage link and enqueues them for
/// the drain. No pacing here; the queue is the only back-pressure.
pub(crate) async fn run_rotate(
    mut rx: PipeReceiver,
    tx: MessageSender,
    cancel: CancellationToken,
) -> StageExit {
    log::info!("rotate stage started");

    let exit = loop {
        tokio::select! {
            biased;
            msg = rx.recv() => match msg {
                Some(msg) => {
                    if let Some(exit) = handle(msg, &tx) {
                        break exit;
                    }
                }
                None => {
                    break StageExit::Closed;
                }
            },
            _ = cancel.cancelled() => {
                // The link can be momentarily empty while stage 1 is pacing
                // a burst that still ends in a sentinel. Upstream owns its
                // own shutdown and closes the link when it stops, so keep
                // consuming until then instead of abandoning queued work.
                break drain_link(&mut rx, &tx).await;
            }
        }
    };

    log::info!("rotate stage finished: {:?}", exit);
    exit
}

async fn drain_link(rx: &mut PipeReceiver, tx: &MessageSender) -> StageExit {
    while let Some(msg) = rx.recv().await {
        if let Some(exit) = handle(msg, tx) {
            return exit;
        }
    }
    StageExit::Closed
}

fn handle(msg: Message, tx: &MessageSender) -> Option<StageExit> {
    match msg {
        Message::Exit => {
            if tx.send(Message::Exit).is_err() {
                log::error!("rotate: sentinel forward failed, drain is gone");
            }
            Some(StageExit::Sentinel)
        }
        Message::Text(text) => {
            let encoded = transform::rot13(&text);
            log::debug!("rotate: '{}' -> '{}'", text, encoded);
            if tx.send(Message::Text(encoded)).is_err() {
                log::error!("rotate: forward failed, drain is gone");
            }
            None
        }
    }
}
