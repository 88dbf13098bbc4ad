use atbridge_transport::TransportError;

/// Errors that can occur while accumulating a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The underlying link failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A frame exceeded the defensive size cap without terminating.
    #[error("unterminated frame of {size} bytes exceeds the {max} byte cap")]
    FrameTooLong { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
