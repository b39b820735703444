//! Adapters carrying the session's commands to the network-control
//! collaborator.
//!
//! The session issues three fire-and-forget commands (start the network,
//! reload configuration, poll status) and consumes readiness notifications
//! on an mpsc channel.  How the commands reach the daemon depends on the
//! embedding:
//!
//! - [`ChannelController`] forwards commands on a channel for hosts that
//!   manage the daemon themselves (a service supervisor, an IPC bridge).
//! - [`StaticController`] suits the standalone binary, where the SOCKS
//!   daemon runs outside this process and is assumed up: status polls
//!   re-announce a fixed endpoint as `On`, and start/reload are no-ops.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use moat_core::{ProxyEndpoint, StatusEvent, TorStatus};

use crate::application::session::NetworkController;

/// A command the client asks the network-control collaborator to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Start the anonymizing network.
    StartNetwork,
    /// Reread bridge settings (the daemon's HUP-equivalent).
    ReloadConfiguration,
    /// Re-deliver the current status.
    PollStatus,
}

/// Forwards commands on an mpsc channel to the embedding host.
pub struct ChannelController {
    commands: mpsc::Sender<ControlCommand>,
}

impl ChannelController {
    /// Creates a controller sending on the given channel.
    pub fn new(commands: mpsc::Sender<ControlCommand>) -> Self {
        Self { commands }
    }

    async fn forward(&self, command: ControlCommand) {
        debug!(?command, "forwarding control command");
        if self.commands.send(command).await.is_err() {
            warn!(?command, "command receiver dropped; control command lost");
        }
    }
}

#[async_trait]
impl NetworkController for ChannelController {
    async fn start_network(&self) {
        self.forward(ControlCommand::StartNetwork).await;
    }

    async fn reload_configuration(&self) {
        self.forward(ControlCommand::ReloadConfiguration).await;
    }

    async fn poll_status(&self) {
        self.forward(ControlCommand::PollStatus).await;
    }
}

/// Controller for a standalone setup with an externally managed daemon.
///
/// The daemon cannot be started or reconfigured from here; polls answer
/// immediately with the configured endpoint marked `On`.
pub struct StaticController {
    endpoint: ProxyEndpoint,
    status: mpsc::Sender<StatusEvent>,
}

impl StaticController {
    /// Creates a controller announcing the given endpoint on every poll.
    pub fn new(endpoint: ProxyEndpoint, status: mpsc::Sender<StatusEvent>) -> Self {
        Self { endpoint, status }
    }
}

#[async_trait]
impl NetworkController for StaticController {
    async fn start_network(&self) {
        warn!("the SOCKS daemon is managed externally and cannot be started from here");
    }

    async fn reload_configuration(&self) {
        debug!("externally managed daemon; nothing to reload");
    }

    async fn poll_status(&self) {
        let event = StatusEvent {
            host: Some(self.endpoint.host.clone()),
            port: Some(self.endpoint.port),
            status: TorStatus::On,
        };
        if self.status.send(event).await.is_err() {
            debug!("status receiver dropped; discarding status event");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
