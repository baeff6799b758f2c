//! Unix domain socket connection handling and command dispatch.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::watch;
use tracing::{info, warn};

use cartscribe_scribe::is_product_url;

use crate::{ClientCommand, ServerEvent};

use super::DaemonState;

/// Stand-in used when a product request arrives with an empty query.
pub const DEFAULT_PRODUCT_QUERY: &str = "Latest Product";

pub(super) async fn handle_connection(
    stream: UnixStream,
    state: Arc<DaemonState>,
    shutdown_tx: watch::Sender<bool>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(());
    }

    let command: ClientCommand = match serde_json::from_str(line.trim()) {
        Ok(command) => command,
        Err(err) => {
            warn!(%err, "rejecting malformed command");
            let event = ServerEvent::Error(format!("invalid command: {err}"));
            return send_event(&mut write_half, event).await;
        }
    };

    let shutdown = matches!(command, ClientCommand::Shutdown);
    let event = dispatch(command, &state).await;
    send_event(&mut write_half, event).await?;

    // Reply first so the client sees the ack before the listener closes.
    if shutdown {
        let _ = shutdown_tx.send(true);
    }
    Ok(())
}

async fn dispatch(command: ClientCommand, state: &DaemonState) -> ServerEvent {
    match command {
        ClientCommand::ProductDetail { query } => {
            let query = if query.trim().is_empty() {
                DEFAULT_PRODUCT_QUERY.to_string()
            } else {
                query
            };
            info!(%query, "product request");
            let detail = state.scribe.product_detail(&query).await;
            state.record_request();
            let source_url = is_product_url(&query).then_some(query);
            ServerEvent::Product { detail, source_url }
        }
        ClientCommand::Compare { requirements } => {
            if requirements.trim().is_empty() {
                return ServerEvent::Error("No query provided".to_string());
            }
            info!(%requirements, "compare request");
            let items = state.scribe.comparison(&requirements).await;
            state.record_request();
            ServerEvent::Comparison {
                requirements,
                items,
            }
        }
        ClientCommand::Suggest { query } => {
            if query.trim().is_empty() {
                return ServerEvent::Error("No query provided".to_string());
            }
            let suggestions = state.scribe.suggestions(&query).await;
            state.record_request();
            ServerEvent::Suggestions(suggestions)
        }
        ClientCommand::Ping => match state.scribe.ping().await {
            Ok(reply) => ServerEvent::Pong(reply),
            Err(err) => ServerEvent::Error(format!("API Error: {err}")),
        },
        ClientCommand::Status => ServerEvent::Status(state.status()),
        ClientCommand::Shutdown => ServerEvent::Ack("daemon shutting down".to_string()),
    }
}

async fn send_event(
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    event: ServerEvent,
) -> Result<()> {
    let encoded = serde_json::to_string(&event)?;
    writer.write_all(encoded.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
