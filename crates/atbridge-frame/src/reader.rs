use atbridge_transport::SerialLink;
use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::terminator::{is_complete, FrameConfig};

const INITIAL_BUFFER_CAPACITY: usize = 256;
const READ_CHUNK_SIZE: usize = 1024;

/// Accumulates complete frames from a [`SerialLink`].
///
/// Handles partial reads internally — callers always get complete frames,
/// terminator included. The link exposes no blocking wait primitive, so an
/// idle peer is handled by polling with a fixed backoff; `read_frame`
/// suspends until a terminator arrives or the link errors.
pub struct FrameReader<'a, L: ?Sized> {
    link: &'a L,
    buf: BytesMut,
    config: FrameConfig,
}

impl<'a, L: SerialLink + ?Sized> FrameReader<'a, L> {
    /// Create a frame reader with default configuration.
    pub fn new(link: &'a L) -> Self {
        Self::with_config(link, FrameConfig::default())
    }

    /// Create a frame reader with explicit configuration.
    pub fn with_config(link: &'a L, config: FrameConfig) -> Self {
        Self {
            link,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame, terminator included (blocking).
    ///
    /// The buffer is fresh per call; a terminator may straddle any number of
    /// physical reads.
    pub fn read_frame(&mut self, terminators: &[&[u8]]) -> Result<Bytes> {
        self.buf.clear();
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let available = self.link.bytes_available()?;
            if available == 0 {
                std::thread::sleep(self.config.poll_interval);
                continue;
            }

            let want = available.min(chunk.len());
            let read = self.link.read(&mut chunk[..want])?;
            self.buf.extend_from_slice(&chunk[..read]);

            if is_complete(&self.buf, terminators) {
                trace!(port = self.link.name(), len = self.buf.len(), "frame complete");
                return Ok(self.buf.split().freeze());
            }
            if self.buf.len() > self.config.max_frame_size {
                return Err(FrameError::FrameTooLong {
                    size: self.buf.len(),
                    max: self.config.max_frame_size,
                });
            }
        }
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use atbridge_transport::{FakeEvent, FakeLink, TransportError};

    use super::*;
    use crate::terminator::{COMMAND_TERMINATORS, RESPONSE_TERMINATORS};

    fn fast_config() -> FrameConfig {
        FrameConfig {
            poll_interval: Duration::from_millis(1),
            ..FrameConfig::default()
        }
    }

    fn reader_over(link: &FakeLink) -> FrameReader<'_, FakeLink> {
        FrameReader::with_config(link, fast_config())
    }

    #[test]
    fn terminator_straddles_physical_reads() {
        let link = FakeLink::scripted(
            "host",
            vec![
                FakeEvent::chunk(b"AT+C"),
                FakeEvent::chunk(b"GMI\r"),
                FakeEvent::chunk(b"\n"),
            ],
        );
        link.open().expect("open should succeed");

        let frame = reader_over(&link)
            .read_frame(COMMAND_TERMINATORS)
            .expect("frame should complete");
        assert_eq!(frame.as_ref(), b"AT+CGMI\r\n");
    }

    #[test]
    fn idle_polls_do_not_complete_a_frame() {
        let link = FakeLink::scripted(
            "host",
            vec![
                FakeEvent::Quiet,
                FakeEvent::chunk(b"ATI\r"),
                FakeEvent::Quiet,
                FakeEvent::chunk(b"\n"),
            ],
        );
        link.open().expect("open should succeed");

        let frame = reader_over(&link)
            .read_frame(COMMAND_TERMINATORS)
            .expect("frame should complete");
        assert_eq!(frame.as_ref(), b"ATI\r\n");
    }

    #[test]
    fn response_frames_complete_at_ok_or_error() {
        let link = FakeLink::scripted(
            "modem",
            vec![
                FakeEvent::chunk(b"\r\n+CGMI: ACME\r\n"),
                FakeEvent::chunk(b"OK\r\n"),
                FakeEvent::chunk(b"\r\nERROR\r\n"),
            ],
        );
        link.open().expect("open should succeed");
        let mut reader = reader_over(&link);

        let first = reader
            .read_frame(RESPONSE_TERMINATORS)
            .expect("first response");
        assert_eq!(first.as_ref(), b"\r\n+CGMI: ACME\r\nOK\r\n");

        let second = reader
            .read_frame(RESPONSE_TERMINATORS)
            .expect("second response");
        assert_eq!(second.as_ref(), b"\r\nERROR\r\n");
    }

    #[test]
    fn each_call_starts_a_fresh_frame() {
        let link = FakeLink::scripted(
            "host",
            vec![FakeEvent::chunk(b"AT\r\n"), FakeEvent::chunk(b"ATI\r\n")],
        );
        link.open().expect("open should succeed");
        let mut reader = reader_over(&link);

        assert_eq!(
            reader
                .read_frame(COMMAND_TERMINATORS)
                .expect("first frame")
                .as_ref(),
            b"AT\r\n"
        );
        assert_eq!(
            reader
                .read_frame(COMMAND_TERMINATORS)
                .expect("second frame")
                .as_ref(),
            b"ATI\r\n"
        );
    }

    #[test]
    fn link_fault_mid_frame_propagates() {
        let link = FakeLink::scripted(
            "host",
            vec![FakeEvent::chunk(b"AT"), FakeEvent::Fault],
        );
        link.open().expect("open should succeed");

        let err = reader_over(&link)
            .read_frame(COMMAND_TERMINATORS)
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Io { .. })
        ));
    }

    #[test]
    fn closed_link_propagates() {
        let link = FakeLink::new("host");
        link.open().expect("open should succeed");

        let err = reader_over(&link)
            .read_frame(COMMAND_TERMINATORS)
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Closed { .. })
        ));
    }

    #[test]
    fn unterminated_frame_hits_the_defensive_cap() {
        let link = FakeLink::scripted("host", vec![FakeEvent::Chunk(vec![b'A'; 32])]);
        link.open().expect("open should succeed");

        let config = FrameConfig {
            poll_interval: Duration::from_millis(1),
            max_frame_size: 16,
        };
        let err = FrameReader::with_config(&link, config)
            .read_frame(COMMAND_TERMINATORS)
            .unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLong { size: 32, max: 16 }));
    }
}
