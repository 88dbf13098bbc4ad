//! Full read-classify-forward-respond cycles over scripted fake endpoints.

use std::sync::Arc;
use std::time::{Duration, Instant};

use atbridge_frame::FrameConfig;
use atbridge_session::{BridgeConfig, BridgeSession, SessionStatus};
use atbridge_transport::{FakeEvent, FakeLink, SerialLink};

fn fast_config() -> BridgeConfig {
    BridgeConfig {
        cycle_pause: Duration::from_millis(1),
        frame: FrameConfig {
            poll_interval: Duration::from_millis(1),
            ..FrameConfig::default()
        },
    }
}

fn start(host: &Arc<FakeLink>, modem: &Arc<FakeLink>) -> BridgeSession<FakeLink> {
    let session = BridgeSession::with_config(Arc::clone(host), Arc::clone(modem), fast_config());
    session.connect().expect("session should start");
    session
}

fn wait_until_stopped(session: &BridgeSession<FakeLink>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while session.status() != SessionStatus::Stopped {
        assert!(Instant::now() < deadline, "session did not stop in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn host_with(commands: &[&[u8]]) -> Arc<FakeLink> {
    Arc::new(FakeLink::scripted(
        "host",
        commands.iter().map(FakeEvent::chunk).collect(),
    ))
}

fn modem_with(responses: &[&[u8]]) -> Arc<FakeLink> {
    Arc::new(FakeLink::scripted(
        "modem",
        responses.iter().map(FakeEvent::chunk).collect(),
    ))
}

#[test]
fn forwards_unmatched_commands_and_responses_verbatim() {
    let host = host_with(&[b"AT+CGMI\r\n"]);
    let modem = modem_with(&[b"\r\nACME Industries\r\n\r\nOK\r\n"]);
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert_eq!(modem.writes(), vec![b"AT+CGMI\r\n".to_vec()]);
    assert_eq!(
        host.writes(),
        vec![b"\r\nACME Industries\r\n\r\nOK\r\n".to_vec()]
    );
}

#[test]
fn normalizes_the_signal_before_forwarding() {
    let host = host_with(&[b"at+cgmi\r\n"]);
    let modem = modem_with(&[b"\r\nOK\r\n"]);
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert_eq!(modem.writes(), vec![b"AT+cgmi\r\n".to_vec()]);
}

#[test]
fn rewrites_the_temperature_query_for_the_modem() {
    let host = host_with(&[b"AT^SCTM?\r\n"]);
    let modem = modem_with(&[b"\r\n#TEMPMON: 0,27\r\n\r\nOK\r\n"]);
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert_eq!(modem.writes(), vec![b"AT#TEMPMON?\r\n".to_vec()]);
    assert_eq!(
        host.writes(),
        vec![b"\r\n#TEMPMON: 0,27\r\n\r\nOK\r\n".to_vec()]
    );
}

#[test]
fn answers_rat_set_and_query_without_the_modem() {
    let host = host_with(&[b"AT^SXRAT=3,2\r\n", b"AT^SXRAT?\r\n"]);
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert!(modem.writes().is_empty(), "intercepts must not reach the modem");
    assert_eq!(
        host.writes(),
        vec![
            b"\r\nOK\r\n".to_vec(),
            b"\r\n^SXRAT: 3,2\r\n\r\nOK\r\n".to_vec(),
        ]
    );
}

#[test]
fn swallows_config_and_power_commands() {
    let host = host_with(&[b"AT^SCFG=\"Radio/Band\",127\r\n", b"AT^SPOW=1,0,0\r\n"]);
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert!(modem.writes().is_empty());
    assert_eq!(
        host.writes(),
        vec![b"\r\nOK\r\n".to_vec(), b"\r\nOK\r\n".to_vec()]
    );
}

#[test]
fn rewraps_ceer_responses() {
    let host = host_with(&[b"AT+CEER\r\n"]);
    let modem = modem_with(&[b"+CEER: 123 some text\r\nOK\r\n"]);
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert_eq!(
        host.writes(),
        vec![b"\r\n+CEER: \"123 some text\"\r\n\r\nOK\r\n".to_vec()]
    );
}

#[test]
fn flushes_both_input_buffers_on_connect() {
    let host = Arc::new(FakeLink::new("host").idle_when_exhausted());
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);

    assert_eq!(host.resets(), 1);
    assert_eq!(modem.resets(), 1);

    session.stop();
    wait_until_stopped(&session);
}

#[test]
fn read_fault_tears_the_session_down() {
    let host = Arc::new(FakeLink::scripted(
        "host",
        vec![FakeEvent::chunk(b"AT"), FakeEvent::Fault],
    ));
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert!(!session.is_running());
    assert!(!host.is_open());
    assert!(!modem.is_open());
}

#[test]
fn write_fault_on_the_modem_tears_the_session_down() {
    let host = host_with(&[b"AT+CSQ\r\n"]);
    let modem = Arc::new(FakeLink::new("modem").failing_writes());
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert!(!session.is_running());
    assert!(!host.is_open());
    assert!(!modem.is_open());
}

#[test]
fn external_stop_winds_the_session_down() {
    let host = Arc::new(FakeLink::new("host").idle_when_exhausted());
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);
    assert!(session.is_running());

    session.stop();
    wait_until_stopped(&session);

    assert!(!session.is_running());
    assert!(!host.is_open());
    assert!(!modem.is_open());
}

#[test]
fn disconnect_twice_is_idempotent() {
    let host = Arc::new(FakeLink::new("host").idle_when_exhausted());
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);

    session.stop();
    wait_until_stopped(&session);
    session.disconnect();
    session.disconnect();

    assert_eq!(session.status(), SessionStatus::Stopped);
    assert!(!host.is_open());
    assert!(!modem.is_open());
}

#[test]
fn a_new_session_starts_from_the_default_rat_value() {
    // First session caches a value...
    let host = host_with(&[b"AT^SXRAT=5,1\r\n"]);
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    // ...a fresh session does not see it.
    let host = host_with(&[b"AT^SXRAT?\r\n"]);
    let modem = Arc::new(FakeLink::new("modem").idle_when_exhausted());
    let session = start(&host, &modem);
    wait_until_stopped(&session);

    assert_eq!(
        host.writes(),
        vec![b"\r\n^SXRAT: 0,0\r\n\r\nOK\r\n".to_vec()]
    );
}
