//! MOAT client binary entry point.
//!
//! Wires together the network controller, the SOCKS transport factory,
//! the preference store, and the UI bridge, then runs the Tokio event
//! loop that drives one bridge-request attempt.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ MoatConfig::load()        -- TOML config + CLI overrides
//!  └─ StaticController          -- announces the external SOCKS daemon
//!  └─ MoatSession               -- the protocol state machine
//!  └─ event dispatch loop
//!       ├─ StatusEvent          -> session.handle_status()
//!       ├─ CaptchaReady         -> write image, read solution, submit
//!       └─ Completed / Failed   -> report and exit
//! ```
//!
//! The standalone binary assumes an externally managed SOCKS daemon
//! (e.g. a tor instance on 127.0.0.1:9050).  Embedders that manage the
//! daemon themselves use `ChannelController` instead and feed real status
//! notifications into the session's status channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use moat_client::application::session::{BridgePrefs, MoatSession, SessionEvent};
use moat_client::infrastructure::network::SocksHttpTransport;
use moat_client::infrastructure::storage::config::MoatConfig;
use moat_client::infrastructure::storage::prefs::TomlBridgePrefs;
use moat_client::infrastructure::tor_control::StaticController;
use moat_client::infrastructure::ui_bridge::MoatAppState;
use moat_core::ProxyEndpoint;

#[derive(Debug, Parser)]
#[command(
    name = "moat-client",
    about = "Fetch censorship-circumvention bridges over the MOAT protocol",
    version
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "MOAT_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the bridge distribution server.
    #[arg(long, env = "MOAT_BASE_URL")]
    base_url: Option<String>,

    /// Host of the local SOCKS proxy.
    #[arg(long, env = "MOAT_SOCKS_HOST")]
    socks_host: Option<String>,

    /// Port of the local SOCKS proxy.
    #[arg(long, env = "MOAT_SOCKS_PORT")]
    socks_port: Option<u16>,

    /// Path of the bridge preference store.
    #[arg(long, env = "MOAT_PREFS")]
    prefs: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // ── Configuration: CLI overrides file, file overrides defaults ──────────
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => MoatConfig::default_path().context("determining config path")?,
    };
    let config = MoatConfig::load(&config_path).context("loading configuration")?;

    // Initialise structured logging.  RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.moat.log_level.clone())),
        )
        .init();

    let base_url = args.base_url.unwrap_or(config.moat.base_url);
    let endpoint = ProxyEndpoint::new(
        args.socks_host.unwrap_or(config.proxy.host),
        args.socks_port.unwrap_or(config.proxy.port),
    );
    let prefs_path = args.prefs.unwrap_or(config.storage.prefs_path);

    info!(%base_url, host = %endpoint.host, port = endpoint.port, "MOAT client starting");

    // ── Wiring ───────────────────────────────────────────────────────────────
    let (status_tx, mut status_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::channel(8);

    let controller = StaticController::new(endpoint, status_tx);
    let prefs = Arc::new(TomlBridgePrefs::open(&prefs_path).context("opening preference store")?);
    let app_state = MoatAppState::new();

    let mut session = MoatSession::new(
        controller,
        Arc::clone(&prefs) as Arc<dyn BridgePrefs>,
        move |ep| SocksHttpTransport::new(base_url.clone(), ep),
        event_tx,
    );

    session.start().await;

    // ── Main dispatch loop ───────────────────────────────────────────────────
    loop {
        tokio::select! {
            Some(status) = status_rx.recv() => {
                app_state.note_status(status.status).await;
                session.handle_status(status).await;
                app_state.note_phase(session.phase()).await;
            }

            Some(event) = event_rx.recv() => {
                app_state.apply_event(&event).await;
                match event {
                    SessionEvent::CaptchaReady { image } => {
                        let path = std::env::temp_dir().join("moat-captcha.jpg");
                        std::fs::write(&path, &image).context("writing captcha image")?;
                        info!(path = %path.display(), "captcha written; type the solution and press return");

                        let solution = read_solution().await?;
                        if let Err(e) = session.submit(solution.trim()).await {
                            warn!(error = %e, "solution not accepted for submission");
                        }
                        app_state.note_phase(session.phase()).await;
                    }

                    SessionEvent::Completed { bridge_lines } => {
                        info!(count = bridge_lines.len(), "bridges received and stored");
                        for line in &bridge_lines {
                            info!(bridge = %line);
                        }
                        break;
                    }

                    SessionEvent::Failed { message } => {
                        error!(%message, "bridge request failed");
                        break;
                    }
                }
            }

            else => break,
        }
    }

    info!("MOAT client stopped");
    Ok(())
}

/// Reads one line from stdin without blocking the async runtime.
async fn read_solution() -> anyhow::Result<String> {
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .context("stdin reader task failed")?
    .context("reading solution from stdin")?;
    Ok(line)
}
