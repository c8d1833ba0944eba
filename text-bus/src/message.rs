pub type MessageSender = tokio::sync::mpsc::UnboundedSender<Message>;
pub type MessageReceiver = tokio::sync::mpsc::UnboundedReceiver<Message>;

pub type PipeSender = tokio::sync::mpsc::Sender<Message>;
pub type PipeReceiver = tokio::sync::mpsc::Receiver<Message>;

/// Wire literal of the end-of-stream sentinel. Reserved: never valid as
/// ordinary payload content.
pub const EXIT_SENTINEL: &str = "EXIT";

/// Line that requests shutdown when read by the feeder (case-insensitive).
pub const EXIT_COMMAND: &str = "exit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Exit,
}

impl Message {
    /// Wraps an ordinary payload, rejecting the reserved sentinel literal.
    pub fn text(payload: impl Into<String>) -> anyhow::Result<Self> {
        let payload = payload.into();
        if payload == EXIT_SENTINEL {
            anyhow::bail!("payload {:?} is reserved for the exit sentinel", payload);
        }
        Ok(Message::Text(payload))
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Message::Exit)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Text(payload) => f.write_str(payload),
            Message::Exit => f.write_str(EXIT_SENTINEL),
        }
    }
}

/// Unbounded FIFO queue: feeder -> stage 1 and stage 2 -> drain.
pub fn queue() -> (MessageSender, MessageReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Single-slot point-to-point link between the two stages.
pub fn pipe() -> (PipeSender, PipeReceiver) {
    tokio::sync::mpsc::channel(1)
}
