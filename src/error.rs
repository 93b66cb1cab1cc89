/// error taxonomy for the training core.
///
/// configuration and compatibility problems are fatal at the operation
/// that hits them. worker problems are recoverable per batch and never
/// surface here. numerical problems are absorbed at the regret store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("checkpoint incomplete: missing {0}")]
    CheckpointIncomplete(String),

    #[error("abstraction hash mismatch: current {current} != stored {stored} ({detail})")]
    AbstractionMismatch {
        current: String,
        stored: String,
        detail: String,
    },

    #[error("player count mismatch: current {current} != stored {stored}")]
    PlayerCountMismatch { current: usize, stored: usize },

    #[error("missing bucket file: {0}")]
    MissingBuckets(String),

    #[error("malformed infoset key: {0}")]
    MalformedKey(String),

    #[error("malformed table state: {0}")]
    MalformedTable(String),

    #[error("no complete checkpoint under {0}")]
    NoCheckpoint(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("codec: {0}")]
    Codec(String),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

impl Error {
    /// process exit code for the CLI surface. compatibility refusals are
    /// distinguished so harnesses can tell "wrong artifacts" from "bug".
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CheckpointIncomplete(_)
            | Self::AbstractionMismatch { .. }
            | Self::PlayerCountMismatch { .. }
            | Self::NoCheckpoint(_)
            | Self::MissingBuckets(_) => 2,
            _ => 1,
        }
    }
}
