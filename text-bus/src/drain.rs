use tokio::sync::broadcast;

use crate::message::{Message, MessageReceiver};
use crate::pipeline::StageExit;

/// Drains the outbound queue, printing each message and broadcasting it to
/// subscribed taps.
///
/// The sentinel is the drain's only shutdown path; it never watches the
/// cancellation token. When no sentinel arrives the coordinator either sees
/// the queue close behind stage 2 or force-stops the drain after the grace
/// deadline.
pub(crate) async fn run_drain(mut rx: MessageReceiver, tap: broadcast::Sender<String>) -> StageExit {
    log::info!("drain started");

    let exit = loop {
        match rx.recv().await {
            Some(Message::Exit) => {
                break StageExit::Sentinel;
            }
            Some(Message::Text(text)) => {
                println!("{}", text);
                // No receivers is fine; nobody has to listen on the tap.
                let _ = tap.send(text);
            }
            None => {
                break StageExit::Closed;
            }
        }
    };

    log::info!("drain finished: {:?}", exit);
    exit
}
