use atbridge_frame::FrameError;
use atbridge_transport::TransportError;

/// Errors that can occur while starting or running a bridge session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An endpoint failed to open, read, or write.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame accumulation failed.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// The cycle thread could not be spawned.
    #[error("failed to spawn bridge cycle thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
