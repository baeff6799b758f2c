//! Unix-socket daemon serving the scribe flows to local clients.

mod connection;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::Result;
use tokio::net::UnixListener;
use tokio::sync::watch;
use tracing::{error, info};

use cartscribe_config::AppConfig;
use cartscribe_llm::build_generator;
use cartscribe_scribe::Scribe;

use crate::DaemonStatus;

pub use connection::DEFAULT_PRODUCT_QUERY;

/// Build the scribe a process should serve with: the configured generator
/// plus the optional fallback seed.
pub fn scribe_from_config(config: &AppConfig) -> Scribe {
    Scribe::new(build_generator(&config.llm)).with_mock_seed(config.fallback.seed)
}

struct DaemonState {
    scribe: Arc<Scribe>,
    socket_path: String,
    started_at: Instant,
    requests_served: AtomicU64,
}

impl DaemonState {
    fn record_request(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    fn status(&self) -> DaemonStatus {
        DaemonStatus {
            generator: self.scribe.generator_label(),
            socket_path: self.socket_path.clone(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            requests_served: self.requests_served.load(Ordering::Relaxed),
        }
    }
}

/// Serve until a client sends `Shutdown`.  Each connection is handled on its
/// own task; requests share nothing but the read-only scribe.
pub async fn run_daemon(config: AppConfig, scribe: Arc<Scribe>) -> Result<()> {
    let socket_path = PathBuf::from(&config.server.socket_path);
    if socket_path.exists() {
        let _ = std::fs::remove_file(&socket_path);
    }

    let listener = UnixListener::bind(&socket_path)?;
    info!(
        socket = %socket_path.display(),
        generator = %scribe.generator_label(),
        "daemon listening"
    );

    let state = Arc::new(DaemonState {
        scribe,
        socket_path: config.server.socket_path.clone(),
        started_at: Instant::now(),
        requests_served: AtomicU64::new(0),
    });
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_ok() && *shutdown_rx.borrow() {
                    break;
                }
            }
            accept = listener.accept() => {
                let (stream, _) = accept?;
                let state = state.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = connection::handle_connection(stream, state, shutdown_tx).await {
                        error!(?err, "daemon connection handler failed");
                    }
                });
            }
        }
    }

    info!("daemon shutting down gracefully");
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}
