//! Serial endpoint capability for the AT command bridge.
//!
//! Provides the byte source/sink surface the bridge core needs from an open
//! serial-like endpoint: poll for buffered bytes, read them, write replies,
//! flush stale input, and close exactly once.
//!
//! This is the lowest layer of atbridge. Everything else builds on top of
//! the [`SerialLink`] trait provided here.

pub mod error;
pub mod fake;
pub mod link;

#[cfg(unix)]
pub mod tty;

pub use error::{Result, TransportError};
pub use fake::{FakeEvent, FakeLink};
pub use link::SerialLink;

#[cfg(unix)]
pub use tty::TtyPort;
