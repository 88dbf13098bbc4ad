//! Translating serial bridge between a host and a cellular modem.
//!
//! atbridge sits between a host and a modem, each reachable only through its
//! own serial link, and makes the modem's command set appear different than
//! it actually is: host commands are forwarded, rewritten, or answered
//! locally, and modem responses are passed through or transformed on the way
//! back.
//!
//! # Crate Structure
//!
//! - [`transport`] — Serial endpoint capability (tty ports, test fakes)
//! - [`frame`] — Terminator-delimited frame accumulation
//! - [`session`] — Classification, response synthesis, and the bridge lifecycle

/// Re-export transport types.
pub mod transport {
    pub use atbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use atbridge_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use atbridge_session::*;
}
