use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The daemon is not reachable; nothing was sent.
    #[error("{0}")]
    Unavailable(String),

    /// A command was sent and failed. State is unchanged.
    #[error("{0}")]
    Command(String),

    /// The daemon answered with something that is not a recording state.
    #[error("unexpected recording state reply: {0}")]
    UnexpectedReply(String),
}
