use std::time::Duration;

/// Terminator set for host command frames.
pub const COMMAND_TERMINATORS: &[&[u8]] = &[b"\r\n"];

/// Terminator set for modem response frames.
pub const RESPONSE_TERMINATORS: &[&[u8]] = &[b"OK\r\n", b"ERROR\r\n"];

/// Default backoff between polls while the peer is idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default defensive cap on one accumulated frame: 64 KiB.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// True when the accumulated buffer's tail matches one of the terminators.
///
/// The check is against the trailing bytes only; nothing is stripped.
pub fn is_complete(buf: &[u8], terminators: &[&[u8]]) -> bool {
    terminators.iter().any(|t| buf.ends_with(t))
}

/// Configuration for frame accumulation.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Backoff between polls while the peer is idle. Default: 100 ms.
    pub poll_interval: Duration,
    /// Defensive cap on one frame. Default: 64 KiB. Well-formed modem
    /// traffic never comes close.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}
