use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::message::{EXIT_COMMAND, Message, MessageSender};
use crate::pipeline::StageExit;

/// Reads lines from the input source and enqueues them for stage 1.
///
/// A line matching the exit command (case-insensitive) enqueues the sentinel,
/// cancels the token and stops the loop. End-of-input stops the loop without
/// touching the token: an exhausted source is not a shutdown request.
pub(crate) async fn run_feeder<R>(
    input: R,
    tx: MessageSender,
    cancel: CancellationToken,
) -> StageExit
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    log::info!("feeder started, type '{}' to quit", EXIT_COMMAND);

    let mut lines = input.lines();
    let exit = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break StageExit::Cancelled;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.eq_ignore_ascii_case(EXIT_COMMAND) {
                        log::info!("feeder: exit command received");
                        if tx.send(Message::Exit).is_err() {
                            log::error!("feeder: stage 1 is gone, sentinel not delivered");
                        }
                        cancel.cancel();
                        break StageExit::Sentinel;
                    }
                    match Message::text(line) {
                        Ok(message) => {
                            log::debug!("feeder: enqueued '{}'", message);
                            if tx.send(message).is_err() {
                                log::error!("feeder: inbound queue closed, dropping line");
                            }
                        }
                        Err(e) => {
                            log::warn!("feeder: rejected line: {}", e);
                        }
                    }
                }
                Ok(None) => {
                    log::info!("feeder: input exhausted");
                    break StageExit::Closed;
                }
                Err(e) => {
                    log::error!("feeder: read error: {}", e);
                }
            }
        }
    };

    log::info!("feeder finished: {:?}", exit);
    exit
}
