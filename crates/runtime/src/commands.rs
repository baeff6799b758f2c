use serde::{Deserialize, Serialize};

use cartscribe_scribe::{ComparisonItem, ProductDetail, Suggestion};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub generator: String,
    pub socket_path: String,
    pub uptime_secs: u64,
    pub requests_served: u64,
}

/// One request per connection, sent as a single JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientCommand {
    ProductDetail { query: String },
    Compare { requirements: String },
    Suggest { query: String },
    Ping,
    Status,
    Shutdown,
}

/// One reply per connection, sent as a single JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerEvent {
    Product {
        detail: ProductDetail,
        /// The query itself when it was a pasted product link.
        source_url: Option<String>,
    },
    Comparison {
        requirements: String,
        items: Vec<ComparisonItem>,
    },
    Suggestions(Vec<Suggestion>),
    Pong(String),
    Status(DaemonStatus),
    Error(String),
    Ack(String),
}
