mod client;
mod commands;
mod server;

pub use client::DaemonClient;
pub use commands::{ClientCommand, DaemonStatus, ServerEvent};
pub use server::{DEFAULT_PRODUCT_QUERY, run_daemon, scribe_from_config};
