use std::io;

/// Errors that can occur on serial endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The port could not be opened or configured.
    #[error("failed to open {port}: {source}")]
    Open { port: String, source: io::Error },

    /// An I/O error occurred on an open port.
    #[error("serial I/O error on {port}: {source}")]
    Io { port: String, source: io::Error },

    /// The port is not open.
    #[error("port {port} is closed")]
    Closed { port: String },

    /// The requested baud rate has no line-speed mapping.
    #[error("unsupported baud rate {baud}")]
    UnsupportedBaud { baud: u32 },
}

pub type Result<T> = std::result::Result<T, TransportError>;
