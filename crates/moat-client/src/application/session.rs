//! MoatSession: the protocol state machine for one bridge-request attempt.
//!
//! The session gates the two protocol operations on anonymizing-network
//! readiness and sequences them:
//!
//! ```text
//! Idle ─Off→ AwaitingNetwork ─On→ Ready → CaptchaLoading
//!        → CaptchaDisplayed ─submit→ SolutionSubmitting → Done | Failed
//! ```
//!
//! Readiness notifications arrive asynchronously and may be re-delivered
//! with the same status; the session is idempotent under duplicates (a
//! second `On` while already ready is a no-op, never a re-fetch).
//!
//! # Concurrency model
//!
//! At most one network call is outstanding at any time.  That invariant is
//! structural: every method takes `&mut self` and awaits its network call
//! inline, so a hosting event loop can never interleave two calls, and
//! user actions arriving in the wrong phase are rejected with a
//! [`SessionError`] instead of being raced.  If the hosting context drops
//! the session mid-call, the response future is dropped with it; events
//! sent into a closed channel are discarded, not panicked on.
//!
//! All mutable state (the current phase and the single live challenge) is
//! owned exclusively by the session instance.  A new attempt is a new
//! session.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use moat_core::{MoatError, ProxyEndpoint, StatusEvent, TorStatus};

use crate::application::moat_client::{MoatClient, MoatTransport, TransportError};

/// Bridge-source literal recorded while the fetch itself is in progress,
/// so the daemon routes the MOAT exchange through the built-in tunnel.
pub const MOAT_BRIDGE_SOURCE: &str = "moat";

/// Commands the session issues to the network-control collaborator.
///
/// All three are fire-and-forget signals; results come back asynchronously
/// as [`StatusEvent`]s on the session's status channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkController: Send + Sync {
    /// Ask the collaborator to start the anonymizing network.
    async fn start_network(&self);
    /// Signal the collaborator to reread its bridge settings.
    async fn reload_configuration(&self);
    /// Request a (re-)delivery of the current status.
    async fn poll_status(&self);
}

/// Error type for the bridge preference store.
#[derive(Debug, Clone, Error)]
#[error("preference store error: {0}")]
pub struct PrefsError(pub String);

/// The preference store the surrounding application reads its bridge
/// configuration from.
///
/// The session writes through this seam twice per successful attempt:
/// once on network-up (recording [`MOAT_BRIDGE_SOURCE`]) and once with
/// the fetched bridge lines on completion.
pub trait BridgePrefs: Send + Sync {
    /// Replaces the stored bridge lines.
    fn set_bridge_lines(&self, lines: &str) -> Result<(), PrefsError>;
    /// Marks bridge-transport usage enabled or disabled.
    fn set_bridges_enabled(&self, enabled: bool) -> Result<(), PrefsError>;
}

/// Events the session emits to the hosting UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A captcha challenge is ready for display.
    CaptchaReady {
        /// Decoded image bytes.
        image: Vec<u8>,
    },
    /// Terminal success: bridges were received and persisted.
    Completed {
        /// Bridge lines in server order.
        bridge_lines: Vec<String>,
    },
    /// Terminal failure for this attempt.
    Failed {
        /// User-facing message, server detail preferred.
        message: String,
    },
}

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No status has been acted on yet.
    Idle,
    /// The network was off; a start command was issued.
    AwaitingNetwork,
    /// The network is on and the proxied transport is constructed.
    Ready,
    /// A `fetch` call is outstanding.
    CaptchaLoading,
    /// A challenge is live and awaiting the user's solution.
    CaptchaDisplayed,
    /// A `check` call is outstanding.
    SolutionSubmitting,
    /// Terminal: bridges delivered.
    Done,
    /// Terminal: the attempt failed.
    Failed,
}

/// A user action arrived in a phase that cannot accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// There is no live captcha to answer (none fetched, already consumed,
    /// or a call is still outstanding).
    #[error("no captcha is currently displayed")]
    NoChallenge,
    /// The anonymizing network is not on, so no call can be made.
    #[error("the anonymizing network is not ready")]
    NetworkNotReady,
}

/// The protocol state machine for a single bridge-request attempt.
///
/// Generic over the transport (so tests inject scripted ones), the
/// network controller, and the transport factory invoked once the SOCKS
/// endpoint becomes known.
pub struct MoatSession<T, C, F>
where
    T: MoatTransport,
    C: NetworkController,
    F: Fn(&ProxyEndpoint) -> Result<T, TransportError>,
{
    controller: C,
    prefs: Arc<dyn BridgePrefs>,
    events: mpsc::Sender<SessionEvent>,
    make_transport: F,
    client: Option<MoatClient<T>>,
    challenge: Option<moat_core::Challenge>,
    phase: SessionPhase,
    status: TorStatus,
}

impl<T, C, F> MoatSession<T, C, F>
where
    T: MoatTransport,
    C: NetworkController,
    F: Fn(&ProxyEndpoint) -> Result<T, TransportError>,
{
    /// Creates an idle session.
    ///
    /// `make_transport` is called exactly once, with the endpoint from the
    /// first `On` notification; a factory failure is a terminal failure.
    pub fn new(
        controller: C,
        prefs: Arc<dyn BridgePrefs>,
        make_transport: F,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            controller,
            prefs,
            events,
            make_transport,
            client: None,
            challenge: None,
            phase: SessionPhase::Idle,
            status: TorStatus::Unknown,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The most recently delivered network status.
    pub fn status(&self) -> TorStatus {
        self.status
    }

    /// Kicks off the attempt by asking for the current network status.
    pub async fn start(&mut self) {
        info!("requesting network status");
        self.controller.poll_status().await;
    }

    /// Reacts to a readiness notification from the collaborator.
    ///
    /// Transient Off/Starting/Unknown statuses are wait states that
    /// trigger a re-poll, never a failure.
    pub async fn handle_status(&mut self, event: StatusEvent) {
        let status = event.status;
        self.status = status;
        debug!(?status, "network status delivered");

        match status {
            TorStatus::Off => {
                if self.phase == SessionPhase::Idle {
                    info!("network is off; issuing start command");
                    self.controller.start_network().await;
                    self.phase = SessionPhase::AwaitingNetwork;
                } else {
                    // Re-delivered Off while waiting: keep polling.
                    self.controller.poll_status().await;
                }
            }
            TorStatus::Starting | TorStatus::Unknown => {
                self.controller.poll_status().await;
            }
            TorStatus::On => self.network_ready(event.endpoint()).await,
        }
    }

    /// The user answered the displayed captcha.
    ///
    /// Consumes the live challenge: whatever the outcome, a fresh `fetch`
    /// is required before another submission.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoChallenge`] when no captcha is displayed, which
    /// also covers a second tap while a call is still outstanding.
    pub async fn submit(&mut self, solution: &str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::CaptchaDisplayed {
            return Err(SessionError::NoChallenge);
        }
        let challenge = self.challenge.take().ok_or(SessionError::NoChallenge)?;
        let Some(client) = self.client.as_ref() else {
            return Err(SessionError::NetworkNotReady);
        };

        self.phase = SessionPhase::SolutionSubmitting;
        info!("submitting captcha solution");
        let outcome = client.submit_solution(&challenge.token, solution).await;

        match outcome {
            Ok(bridges) => {
                info!(count = bridges.len(), "bridge lines received");
                if let Err(e) = self.prefs.set_bridge_lines(&bridges.to_storage_string()) {
                    warn!(error = %e, "could not persist bridge lines");
                }
                if let Err(e) = self.prefs.set_bridges_enabled(true) {
                    warn!(error = %e, "could not enable bridge mode");
                }
                self.phase = SessionPhase::Done;
                self.emit(SessionEvent::Completed { bridge_lines: bridges.into_lines() })
                    .await;
            }
            Err(e) => self.fail(e).await,
        }
        Ok(())
    }

    /// Manual refresh: discard any live challenge and fetch a new one.
    ///
    /// # Errors
    ///
    /// [`SessionError::NetworkNotReady`] unless the network is on and the
    /// transport has been constructed.
    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        if self.status != TorStatus::On || self.client.is_none() {
            return Err(SessionError::NetworkNotReady);
        }
        info!("manual refresh requested");
        self.load_captcha().await;
        Ok(())
    }

    /// First `On` delivery: wire up the transport and fetch a captcha.
    async fn network_ready(&mut self, endpoint: ProxyEndpoint) {
        if self.client.is_some()
            || matches!(self.phase, SessionPhase::Done | SessionPhase::Failed)
        {
            debug!("duplicate network-ready notification ignored");
            return;
        }
        info!(host = %endpoint.host, port = endpoint.port, "network ready");

        // Route the surrounding application through moat while the fetch
        // itself runs, then have the daemon reread its bridge settings.
        if let Err(e) = self.prefs.set_bridge_lines(MOAT_BRIDGE_SOURCE) {
            warn!(error = %e, "could not record bridge source");
        }
        if let Err(e) = self.prefs.set_bridges_enabled(true) {
            warn!(error = %e, "could not enable bridge mode");
        }

        match (self.make_transport)(&endpoint) {
            Ok(transport) => {
                self.client = Some(MoatClient::new(transport));
                self.controller.reload_configuration().await;
                self.phase = SessionPhase::Ready;
                self.load_captcha().await;
            }
            Err(e) => self.fail(MoatError::new(e.to_string())).await,
        }
    }

    /// Fetches a challenge, discarding any live one first.
    async fn load_captcha(&mut self) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        self.challenge = None;
        self.phase = SessionPhase::CaptchaLoading;

        let outcome = client.fetch_captcha().await;
        match outcome {
            Ok(challenge) => {
                info!(image_bytes = challenge.image.len(), "captcha challenge ready");
                let image = challenge.image.clone();
                self.challenge = Some(challenge);
                self.phase = SessionPhase::CaptchaDisplayed;
                self.emit(SessionEvent::CaptchaReady { image }).await;
            }
            Err(e) => self.fail(e).await,
        }
    }

    /// Transitions to Failed and forwards the message unchanged.
    async fn fail(&mut self, err: MoatError) {
        error!(message = %err, "bridge request attempt failed");
        self.phase = SessionPhase::Failed;
        let message = err.message().to_string();
        self.emit(SessionEvent::Failed { message }).await;
    }

    /// Sends an event, tolerating a torn-down receiver.
    async fn emit(&mut self, event: SessionEvent) {
        if self.events.send(event).await.is_err() {
            debug!("event receiver dropped; discarding session event");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    /// Transport that must never be reached in these tests.
    #[derive(Clone)]
    struct UnreachableTransport;

    #[async_trait]
    impl MoatTransport for UnreachableTransport {
        async fn send(&self, _endpoint: &str, _body: Value) -> Result<Value, TransportError> {
            panic!("transport must not be invoked");
        }
    }

    /// Transport with a single canned fetch response.
    #[derive(Clone)]
    struct CannedTransport;

    #[async_trait]
    impl MoatTransport for CannedTransport {
        async fn send(&self, _endpoint: &str, _body: Value) -> Result<Value, TransportError> {
            Ok(json!({"data":[{"challenge":"tok","image":"aGk="}]}))
        }
    }

    struct NoopPrefs;

    impl BridgePrefs for NoopPrefs {
        fn set_bridge_lines(&self, _lines: &str) -> Result<(), PrefsError> {
            Ok(())
        }
        fn set_bridges_enabled(&self, _enabled: bool) -> Result<(), PrefsError> {
            Ok(())
        }
    }

    fn session_with<T, F>(
        controller: MockNetworkController,
        make_transport: F,
    ) -> (
        MoatSession<T, MockNetworkController, F>,
        mpsc::Receiver<SessionEvent>,
    )
    where
        T: MoatTransport,
        F: Fn(&ProxyEndpoint) -> Result<T, TransportError>,
    {
        let (tx, rx) = mpsc::channel(8);
        let session = MoatSession::new(controller, Arc::new(NoopPrefs), make_transport, tx);
        (session, rx)
    }

    #[tokio::test]
    async fn test_off_from_idle_issues_start_network() {
        // Arrange
        let mut controller = MockNetworkController::new();
        controller.expect_start_network().times(1).returning(|| ());
        controller.expect_poll_status().times(0);
        let (mut session, _rx) =
            session_with(controller, |_| Ok(UnreachableTransport));

        // Act
        session
            .handle_status(StatusEvent::status_only(TorStatus::Off))
            .await;

        // Assert
        assert_eq!(session.phase(), SessionPhase::AwaitingNetwork);
    }

    #[tokio::test]
    async fn test_redelivered_off_polls_instead_of_restarting() {
        // Arrange: one start for the first Off, one poll for the second
        let mut controller = MockNetworkController::new();
        controller.expect_start_network().times(1).returning(|| ());
        controller.expect_poll_status().times(1).returning(|| ());
        let (mut session, _rx) =
            session_with(controller, |_| Ok(UnreachableTransport));

        // Act
        session
            .handle_status(StatusEvent::status_only(TorStatus::Off))
            .await;
        session
            .handle_status(StatusEvent::status_only(TorStatus::Off))
            .await;

        // Assert: still waiting, not failed
        assert_eq!(session.phase(), SessionPhase::AwaitingNetwork);
    }

    #[tokio::test]
    async fn test_starting_and_unknown_are_wait_states() {
        // Arrange
        let mut controller = MockNetworkController::new();
        controller.expect_poll_status().times(2).returning(|| ());
        let (mut session, mut rx) =
            session_with(controller, |_| Ok(UnreachableTransport));

        // Act
        session
            .handle_status(StatusEvent::status_only(TorStatus::Starting))
            .await;
        session
            .handle_status(StatusEvent::status_only(TorStatus::Unknown))
            .await;

        // Assert: no failure event was emitted
        assert!(rx.try_recv().is_err());
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_on_reloads_configuration_and_fetches() {
        // Arrange
        let mut controller = MockNetworkController::new();
        controller
            .expect_reload_configuration()
            .times(1)
            .returning(|| ());
        let (mut session, mut rx) = session_with(controller, |_| Ok(CannedTransport));

        // Act
        session
            .handle_status(StatusEvent::status_only(TorStatus::On))
            .await;

        // Assert
        assert_eq!(session.phase(), SessionPhase::CaptchaDisplayed);
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::CaptchaReady { image: b"hi".to_vec() }
        );
    }

    #[tokio::test]
    async fn test_transport_factory_failure_is_terminal() {
        // Arrange
        let controller = MockNetworkController::new();
        let (mut session, mut rx) = session_with::<UnreachableTransport, _>(controller, |_| {
            Err(TransportError::Exchange("proxy unavailable".into()))
        });

        // Act
        session
            .handle_status(StatusEvent::status_only(TorStatus::On))
            .await;

        // Assert
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Failed { message: "proxy unavailable".to_string() }
        );
    }

    #[tokio::test]
    async fn test_submit_in_idle_is_rejected() {
        let controller = MockNetworkController::new();
        let (mut session, _rx) =
            session_with(controller, |_| Ok(UnreachableTransport));

        assert_eq!(
            session.submit("answer").await,
            Err(SessionError::NoChallenge)
        );
    }

    #[tokio::test]
    async fn test_refresh_without_network_is_rejected() {
        let controller = MockNetworkController::new();
        let (mut session, _rx) =
            session_with(controller, |_| Ok(UnreachableTransport));

        assert_eq!(session.refresh().await, Err(SessionError::NetworkNotReady));
    }
}
