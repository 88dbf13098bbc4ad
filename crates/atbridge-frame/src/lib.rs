//! Terminator-delimited frame accumulation over serial links.
//!
//! AT traffic has no length prefix; a frame is complete when its tail matches
//! a terminator. Host commands end at CR LF, modem responses at `OK\r\n` or
//! `ERROR\r\n`. The [`FrameReader`] accumulates bytes across physical reads —
//! a terminator split over two reads is handled here, not in user code.

pub mod error;
pub mod reader;
pub mod terminator;

pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use terminator::{
    is_complete, FrameConfig, COMMAND_TERMINATORS, DEFAULT_MAX_FRAME, DEFAULT_POLL_INTERVAL,
    RESPONSE_TERMINATORS,
};
