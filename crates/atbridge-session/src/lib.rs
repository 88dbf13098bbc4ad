//! The protocol brain of the AT bridge.
//!
//! This is the layer that makes the modem's command set appear different
//! than it actually is. Every host command is classified against an ordered
//! rule table — forward, forward rewritten, or answer locally — and every
//! reply to the host is produced by the synthesizer, either passing the
//! modem's real response through, transforming it, or fabricating one from
//! session state. [`BridgeSession`] owns both endpoints and runs the
//! read-classify-forward-respond cycle on a background thread.

pub mod bridge;
pub mod error;
pub mod rules;
pub mod state;
pub mod synth;

pub use bridge::{BridgeConfig, BridgeSession, SessionStatus, DEFAULT_CYCLE_PAUSE};
pub use error::{Result, SessionError};
pub use rules::{classify, Decision, Disposition};
pub use state::{SessionState, DEFAULT_RAT};
pub use synth::synthesize;
