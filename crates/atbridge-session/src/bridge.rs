use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use atbridge_frame::{FrameConfig, FrameReader, COMMAND_TERMINATORS, RESPONSE_TERMINATORS};
use atbridge_transport::SerialLink;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SessionError};
use crate::rules::{classify, printable};
use crate::state::SessionState;
use crate::synth::synthesize;

/// Pause between request/response cycles.
pub const DEFAULT_CYCLE_PAUSE: Duration = Duration::from_millis(100);

/// Tunables for the bridge cycle.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Pause between cycles. Default: 100 ms.
    pub cycle_pause: Duration,
    /// Frame accumulation settings (poll backoff, defensive frame cap).
    pub frame: FrameConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cycle_pause: DEFAULT_CYCLE_PAUSE,
            frame: FrameConfig::default(),
        }
    }
}

/// Lifecycle of a bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Endpoints configured, not yet opened.
    Idle,
    /// Endpoints being opened and flushed.
    Opening,
    /// The cycle thread is bridging traffic.
    Running,
    /// A read or write failed; teardown is in progress.
    Faulted,
    /// Both endpoints closed. Terminal.
    Stopped,
}

struct Shared<L> {
    host: Arc<L>,
    modem: Arc<L>,
    running: AtomicBool,
    status: Mutex<SessionStatus>,
    teardown: Mutex<()>,
}

/// Owns both serial endpoints and runs the read-classify-forward-respond
/// cycle on a background thread.
///
/// The protocol is strictly request/response, so there is exactly one cycle
/// per session: the host waits for a reply before issuing the next command,
/// and nothing ever needs to pump the two directions concurrently. The
/// launching thread only observes [`is_running`] and [`status`].
///
/// [`is_running`]: BridgeSession::is_running
/// [`status`]: BridgeSession::status
pub struct BridgeSession<L> {
    shared: Arc<Shared<L>>,
    config: BridgeConfig,
}

impl<L: SerialLink + Send + Sync + 'static> BridgeSession<L> {
    /// Build a session over a host-facing and a modem-facing endpoint.
    pub fn new(host: Arc<L>, modem: Arc<L>) -> Self {
        Self::with_config(host, modem, BridgeConfig::default())
    }

    /// Build a session with explicit cycle tunables.
    pub fn with_config(host: Arc<L>, modem: Arc<L>, config: BridgeConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                host,
                modem,
                running: AtomicBool::new(false),
                status: Mutex::new(SessionStatus::Idle),
                teardown: Mutex::new(()),
            }),
            config,
        }
    }

    /// The host-facing endpoint.
    pub fn host(&self) -> &Arc<L> {
        &self.shared.host
    }

    /// The modem-facing endpoint.
    pub fn modem(&self) -> &Arc<L> {
        &self.shared.modem
    }

    /// Whether the cycle thread is (still) bridging traffic.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    pub fn status(&self) -> SessionStatus {
        *self
            .shared
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Open both endpoints, discard stale input, and start the cycle thread.
    ///
    /// On failure to open either endpoint the session is left `Idle` with
    /// both endpoints closed; the caller decides whether to retry. Session
    /// state starts fresh on every connect.
    pub fn connect(&self) -> Result<()> {
        set_status(&self.shared.status, SessionStatus::Opening);
        info!(
            host = self.shared.host.name(),
            modem = self.shared.modem.name(),
            "starting bridge"
        );

        if let Err(err) = self.shared.host.open() {
            warn!(port = self.shared.host.name(), error = %err, "failed to open host endpoint");
            set_status(&self.shared.status, SessionStatus::Idle);
            return Err(err.into());
        }
        if let Err(err) = self.shared.modem.open() {
            warn!(port = self.shared.modem.name(), error = %err, "failed to open modem endpoint");
            self.shared.host.close();
            set_status(&self.shared.status, SessionStatus::Idle);
            return Err(err.into());
        }

        // Discard anything buffered from before the session existed.
        if let Err(err) = self
            .shared
            .host
            .reset_input()
            .and_then(|()| self.shared.modem.reset_input())
        {
            warn!(error = %err, "failed to flush endpoint input buffers");
            self.close_both();
            set_status(&self.shared.status, SessionStatus::Idle);
            return Err(err.into());
        }

        self.shared.running.store(true, Ordering::SeqCst);
        set_status(&self.shared.status, SessionStatus::Running);

        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let spawned = thread::Builder::new()
            .name("bridge-cycle".into())
            .spawn(move || run_cycles(shared, config));
        if let Err(err) = spawned {
            self.shared.running.store(false, Ordering::SeqCst);
            self.close_both();
            set_status(&self.shared.status, SessionStatus::Idle);
            return Err(SessionError::Spawn(err));
        }
        Ok(())
    }

    /// Stop the session: clears the running flag and closes both endpoints.
    ///
    /// Closing also unblocks a cycle waiting for a frame — its next poll
    /// observes the closed port and the thread winds down.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.disconnect();
    }

    /// Close both endpoints. Idempotent; safe to call from any thread.
    pub fn disconnect(&self) {
        teardown(&self.shared);
    }

    fn close_both(&self) {
        self.shared.host.close();
        self.shared.modem.close();
    }
}

fn run_cycles<L: SerialLink>(shared: Arc<Shared<L>>, config: BridgeConfig) {
    let mut state = SessionState::new();
    let mut host_reader = FrameReader::with_config(shared.host.as_ref(), config.frame.clone());
    let mut modem_reader = FrameReader::with_config(shared.modem.as_ref(), config.frame.clone());

    while shared.running.load(Ordering::SeqCst) {
        if let Err(err) = run_one_cycle(&shared, &mut host_reader, &mut modem_reader, &mut state) {
            // An externally requested stop closes the ports under the cycle;
            // the resulting error is a normal wind-down, not a fault.
            if shared.running.load(Ordering::SeqCst) {
                error!(error = %err, "bridge cycle fault");
                set_status(&shared.status, SessionStatus::Faulted);
            }
            break;
        }
        thread::sleep(config.cycle_pause);
    }

    teardown(&shared);
}

fn run_one_cycle<L: SerialLink>(
    shared: &Shared<L>,
    host_reader: &mut FrameReader<'_, L>,
    modem_reader: &mut FrameReader<'_, L>,
    state: &mut SessionState,
) -> Result<()> {
    let command = host_reader.read_frame(COMMAND_TERMINATORS)?;
    let decision = classify(&command, state);
    debug!(
        command = %printable(&command),
        disposition = ?decision.disposition,
        "classified host command"
    );

    let response = match &decision.outgoing {
        Some(outgoing) => {
            shared.modem.write_all(outgoing)?;
            Some(modem_reader.read_frame(RESPONSE_TERMINATORS)?)
        }
        None => None,
    };

    let forwarded = decision.outgoing.as_deref().unwrap_or(&command);
    let reply = synthesize(forwarded, &decision, response.as_deref(), state);
    shared.host.write_all(&reply)?;
    debug!(reply = %printable(&reply), "replied to host");
    Ok(())
}

/// Close both endpoints exactly once each and clear the running flag.
///
/// Guarded so a close from the cycle thread never races a close from an
/// external stop request; whoever loses finds the ports already closed.
fn teardown<L: SerialLink>(shared: &Shared<L>) {
    let _guard = shared
        .teardown
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    shared.running.store(false, Ordering::SeqCst);
    for port in [shared.host.as_ref(), shared.modem.as_ref()] {
        if port.is_open() {
            port.close();
            info!(port = port.name(), "closed bridge port");
        }
    }
    set_status(&shared.status, SessionStatus::Stopped);
}

fn set_status(cell: &Mutex<SessionStatus>, status: SessionStatus) {
    *cell.lock().unwrap_or_else(PoisonError::into_inner) = status;
}
