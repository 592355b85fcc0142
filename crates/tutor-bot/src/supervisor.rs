//! Connection lifecycle supervision.
//!
//! One supervisor drives one gateway session. The state machine:
//!
//! ```text
//! Connecting -> AwaitingQr | Open
//! AwaitingQr -> Open | Closed
//! Open       -> Closed
//! Closed     -> Connecting (reconnect)
//!            -> exit 0     (corruption: wipe credentials, supervised restart)
//!            -> halt       (explicit logout: operator must re-pair)
//! ```
//!
//! Partial in-memory cryptographic state is not trustworthy enough to
//! patch incrementally, so corruption is answered by wiping the credential
//! store and letting the process manager restart us into a fresh pairing
//! flow.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use engine::{ConversationEngine, TurnOutcome};
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use tutor_core::FailureKind;
use wa_gateway::{
    subscribe, ConnectionClose, GatewayEvent, SessionStore, WaClient,
};

/// Status code the transport uses for an explicit logout.
pub const LOGGED_OUT_CODE: u16 = 401;

/// Status codes indicating an unauthorized or expired session.
const CORRUPTION_CODES: [u16; 2] = [403, 419];

/// Message fragments indicating corrupted cryptographic state.
const CORRUPTION_SIGNATURES: [&str; 3] = ["bad mac", "invalid prekey", "unauthorized"];

/// Connection state, readable through [`ConnectionSupervisor::state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    /// Pairing required; carries the current QR challenge.
    AwaitingQr(String),
    Open,
    Closed,
}

/// What to do about a connection close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Transient failure: reconnect after the fixed delay.
    Reconnect,
    /// Corrupted session state: wipe credentials, restart the process.
    ResetAndRestart,
    /// Explicit logout: terminal, the operator must re-pair.
    Halt,
}

impl CloseAction {
    /// Failure classification for logs and tests.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Reconnect => FailureKind::TransientIo,
            Self::ResetAndRestart => FailureKind::SessionCorruption,
            Self::Halt => FailureKind::LoggedOut,
        }
    }
}

/// Classify a connection close by status code and message.
pub fn classify_close(close: &ConnectionClose) -> CloseAction {
    if close.status_code == Some(LOGGED_OUT_CODE) {
        return CloseAction::Halt;
    }

    if close
        .status_code
        .is_some_and(|code| CORRUPTION_CODES.contains(&code))
    {
        return CloseAction::ResetAndRestart;
    }

    let message = close.message.as_deref().unwrap_or("").to_lowercase();
    if CORRUPTION_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
    {
        return CloseAction::ResetAndRestart;
    }

    CloseAction::Reconnect
}

/// How a supervisor run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// Credentials were wiped; exit 0 so the process manager restarts us
    /// into a fresh pairing flow.
    RestartAfterReset,
    /// Explicit logout; no automatic recovery.
    LoggedOut,
}

/// Drives one gateway session: connect, pump events, recover.
pub struct ConnectionSupervisor {
    client: WaClient,
    auth: Arc<dyn SessionStore>,
    engine: Arc<ConversationEngine>,
    state: Arc<RwLock<ConnectionState>>,
    reconnect_delay: Duration,
}

impl ConnectionSupervisor {
    /// Create a new supervisor.
    pub fn new(
        client: WaClient,
        auth: Arc<dyn SessionStore>,
        engine: Arc<ConversationEngine>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            client,
            auth,
            engine,
            state: Arc::new(RwLock::new(ConnectionState::Connecting)),
            reconnect_delay,
        }
    }

    /// Current connection state (read-only accessor for health checks).
    pub fn state(&self) -> ConnectionState {
        self.state.read().unwrap().clone()
    }

    /// Shared handle to the state, for health-check collaborators.
    pub fn state_handle(&self) -> Arc<RwLock<ConnectionState>> {
        self.state.clone()
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap() = state;
    }

    /// Run until the session ends for a non-reconnectable reason.
    pub async fn run(&self) -> Result<SupervisorExit, wa_gateway::GatewayError> {
        loop {
            self.set_state(ConnectionState::Connecting);

            let creds = self.auth.creds().await;
            if !creds.is_paired() {
                info!("No paired session; the gateway will issue a QR challenge");
            }
            self.client.start_session(Some(&creds)).await?;

            let mut events = subscribe(&self.client);
            let mut reconnect = false;

            while let Some(result) = events.next().await {
                match result {
                    Ok(event) => {
                        if let Some(exit) = self.handle_event(event).await {
                            match exit {
                                EventOutcome::Exit(exit) => return Ok(exit),
                                EventOutcome::Reconnect => {
                                    reconnect = true;
                                    break;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        error!("Event stream error: {}", e);
                        reconnect = true;
                        break;
                    }
                }
            }

            if !reconnect {
                warn!("Event stream ended");
            }
            self.set_state(ConnectionState::Closed);
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Handle one gateway event. Returns Some when the event pump must
    /// stop (reconnect or exit).
    async fn handle_event(&self, event: GatewayEvent) -> Option<EventOutcome> {
        match event {
            // Credential rotation is persisted before anything else.
            GatewayEvent::CredsUpdate(creds) => {
                if let Err(e) = self.auth.save_creds(&creds).await {
                    warn!("Failed to persist rotated credentials: {}", e);
                }
                None
            }
            GatewayEvent::KeysMutation(mutations) => {
                self.auth.set_keys(mutations).await;
                None
            }
            GatewayEvent::KeysRequest(request) => {
                let keys = self.auth.get_keys(request.category, &request.ids).await;
                debug!(
                    "Serving {} of {} requested {} keys",
                    keys.len(),
                    request.ids.len(),
                    request.category
                );
                if let Err(e) = self.client.respond_keys(request.request_id, keys).await {
                    warn!("Failed to answer key request: {}", e);
                }
                None
            }
            GatewayEvent::Qr { code } => {
                info!("Pairing required; scan the QR challenge to link: {}", code);
                self.set_state(ConnectionState::AwaitingQr(code));
                None
            }
            GatewayEvent::Open => {
                info!("Connection open");
                self.set_state(ConnectionState::Open);
                None
            }
            GatewayEvent::Message(message) => {
                // Only an open connection feeds the engine.
                if self.state() != ConnectionState::Open {
                    debug!("Dropping message received while not open");
                    return None;
                }
                match self.engine.process_event(&message).await {
                    TurnOutcome::Replied { recipient, voice_sent, .. } => {
                        debug!("Replied to {} (voice: {})", recipient, voice_sent);
                    }
                    TurnOutcome::Skipped { reason } => {
                        debug!("Skipped: {}", reason);
                    }
                    TurnOutcome::Failed(e) => {
                        warn!(kind = e.kind().as_str(), "Turn error: {}", e);
                    }
                }
                None
            }
            GatewayEvent::Closed(close) => {
                self.set_state(ConnectionState::Closed);
                Some(self.handle_close(&close).await)
            }
        }
    }

    /// Decide what a connection close means and act on it.
    async fn handle_close(&self, close: &ConnectionClose) -> EventOutcome {
        match apply_close_policy(self.auth.as_ref(), close).await {
            CloseAction::Reconnect => EventOutcome::Reconnect,
            CloseAction::Halt => EventOutcome::Exit(SupervisorExit::LoggedOut),
            CloseAction::ResetAndRestart => EventOutcome::Exit(SupervisorExit::RestartAfterReset),
        }
    }
}

/// Classify a close and perform the corruption reset when called for.
///
/// On [`CloseAction::ResetAndRestart`] the credential store is wiped
/// before returning; there is no reconnect attempt with corrupt state.
pub async fn apply_close_policy(auth: &dyn SessionStore, close: &ConnectionClose) -> CloseAction {
    let action = classify_close(close);
    warn!(
        kind = action.kind().as_str(),
        "Connection closed (code: {:?}): {}",
        close.status_code,
        close.message.as_deref().unwrap_or("no message")
    );

    if action == CloseAction::ResetAndRestart {
        warn!("Session state is corrupt; wiping credentials");
        if let Err(e) = auth.wipe().await {
            error!("Credential wipe failed: {}", e);
        }
    }

    action
}

/// Internal control-flow result of one event.
enum EventOutcome {
    Reconnect,
    Exit(SupervisorExit),
}
