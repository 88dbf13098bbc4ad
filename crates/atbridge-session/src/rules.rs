use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::state::{SessionState, DEFAULT_RAT};

/// The two-letter command signal every rule is anchored on.
const SIGNAL: &[u8] = b"AT";

/// The classifier's decision for one command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Send the frame downstream unchanged.
    Forward,
    /// Send the frame downstream with the command rewritten.
    ForwardRewritten,
    /// Answer locally after storing a value extracted from the frame.
    InterceptSet,
    /// Answer locally from stored session state.
    InterceptQuery,
    /// Answer locally with a plain OK.
    InterceptOk,
}

impl Disposition {
    /// Whether the command reaches the modem at all.
    pub fn is_forwarded(self) -> bool {
        matches!(self, Disposition::Forward | Disposition::ForwardRewritten)
    }
}

/// Outcome of classifying one command frame.
#[derive(Debug, Clone)]
pub struct Decision {
    pub disposition: Disposition,
    /// The case-normalized (and possibly rewritten) bytes to send to the
    /// modem. `None` when the command is fully intercepted.
    pub outgoing: Option<Bytes>,
}

enum Action {
    Forward,
    Rewrite(&'static [u8]),
    InterceptSet,
    InterceptQuery,
    InterceptOk,
}

/// Interception rules, evaluated in order; the first matching prefix wins.
const RULES: &[(&[u8], Action)] = &[
    (b"AT+", Action::Forward),
    (b"ATI", Action::Forward),
    (b"ATV", Action::Forward),
    (b"AT^SCTM?", Action::Rewrite(b"AT#TEMPMON?")),
    (b"AT^SXRAT=", Action::InterceptSet),
    (b"AT^SXRAT?", Action::InterceptQuery),
    (b"AT^SCFG=", Action::InterceptOk),
    (b"AT^SPOW=", Action::InterceptOk),
];

/// Classify one host command frame against the rule table.
///
/// A leading lower- or mixed-case `at` signal is upper-cased first; the rest
/// of the frame is matched and forwarded byte-for-byte. Frames that do not
/// start with the signal at all, and `AT` frames matching no rule, are
/// forwarded unchanged.
pub fn classify(frame: &[u8], state: &mut SessionState) -> Decision {
    let frame = normalize(frame);

    if frame.starts_with(SIGNAL) {
        for (prefix, action) in RULES {
            if !frame.starts_with(prefix) {
                continue;
            }
            return apply(action, prefix, frame, state);
        }
    }

    Decision {
        disposition: Disposition::Forward,
        outgoing: Some(frame),
    }
}

fn apply(action: &Action, prefix: &[u8], frame: Bytes, state: &mut SessionState) -> Decision {
    match action {
        Action::Forward => Decision {
            disposition: Disposition::Forward,
            outgoing: Some(frame),
        },
        Action::Rewrite(replacement) => {
            let mut rewritten =
                BytesMut::with_capacity(replacement.len() + frame.len() - prefix.len());
            rewritten.extend_from_slice(replacement);
            rewritten.extend_from_slice(&frame[prefix.len()..]);
            debug!(command = %printable(&frame), "rewriting command for the modem");
            Decision {
                disposition: Disposition::ForwardRewritten,
                outgoing: Some(rewritten.freeze()),
            }
        }
        Action::InterceptSet => {
            let value = rat_value(&frame[prefix.len()..]);
            debug!(value = %value, "caching radio access technology setting");
            state.set_rat(value);
            Decision {
                disposition: Disposition::InterceptSet,
                outgoing: None,
            }
        }
        Action::InterceptQuery => Decision {
            disposition: Disposition::InterceptQuery,
            outgoing: None,
        },
        Action::InterceptOk => Decision {
            disposition: Disposition::InterceptOk,
            outgoing: None,
        },
    }
}

/// Upper-case a leading lower- or mixed-case command signal.
///
/// Only the signal is case-normalized; the remainder of the frame is
/// preserved byte-for-byte.
fn normalize(frame: &[u8]) -> Bytes {
    let signal_len = SIGNAL.len();
    let has_signal = frame.len() >= signal_len && frame[..signal_len].eq_ignore_ascii_case(SIGNAL);
    if has_signal && frame[..signal_len] != *SIGNAL {
        let mut out = BytesMut::from(frame);
        out[..signal_len].copy_from_slice(SIGNAL);
        out.freeze()
    } else {
        Bytes::copy_from_slice(frame)
    }
}

/// Extract the value payload of a set command; payloads that cannot be
/// derived (not text, or nothing left after trimming) fall back to the
/// default rather than failing the cycle.
fn rat_value(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                DEFAULT_RAT.to_string()
            } else {
                text.to_string()
            }
        }
        Err(_) => DEFAULT_RAT.to_string(),
    }
}

/// Render frame bytes for log output.
pub(crate) fn printable(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
