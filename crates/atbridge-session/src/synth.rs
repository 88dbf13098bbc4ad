use bytes::Bytes;

use crate::rules::{Decision, Disposition};
use crate::state::SessionState;

/// Reply sent upstream for intercepted commands.
const PLAIN_OK: &[u8] = b"\r\nOK\r\n";

/// Produce the exact bytes returned to the host for one cycle.
///
/// `command` is the classifier's normalized command (the forwarded bytes for
/// forwarded commands). `response` carries the modem's real response when the
/// command was forwarded; intercepted commands never have one.
pub fn synthesize(
    command: &[u8],
    decision: &Decision,
    response: Option<&[u8]>,
    state: &SessionState,
) -> Bytes {
    match decision.disposition {
        Disposition::InterceptSet | Disposition::InterceptOk => Bytes::from_static(PLAIN_OK),
        Disposition::InterceptQuery => {
            Bytes::from(format!("\r\n^SXRAT: {}\r\n\r\nOK\r\n", state.rat()))
        }
        Disposition::Forward | Disposition::ForwardRewritten => {
            let Some(response) = response else {
                return Bytes::new();
            };
            if command.starts_with(b"AT+CEER") {
                Bytes::from(format!("\r\n+CEER: \"{}\"\r\n\r\nOK\r\n", ceer_text(response)))
            } else {
                Bytes::copy_from_slice(response)
            }
        }
    }
}

/// Extract the cause text between the `+CEER:` marker and the trailing `OK`.
///
/// Responses that do not decode as text, lack the marker, or have no
/// trailing `OK` yield an empty string; a malformed response never fails the
/// cycle.
fn ceer_text(response: &[u8]) -> String {
    let Ok(text) = std::str::from_utf8(response) else {
        return String::new();
    };
    let Some((_, after_marker)) = text.split_once("+CEER:") else {
        return String::new();
    };
    let Some(idx) = after_marker.rfind("OK") else {
        return String::new();
    };
    after_marker[..idx].trim().to_string()
}
