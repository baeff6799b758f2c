mod render;

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cartscribe_config::{AppConfig, DEFAULT_CONFIG_PATH};
use cartscribe_llm::{DEFAULT_PROBE_MODELS, ModelProbe, list_gemini_models, probe_gemini_models};
use cartscribe_runtime::{
    ClientCommand, DEFAULT_PRODUCT_QUERY, DaemonClient, ServerEvent, run_daemon, scribe_from_config,
};
use cartscribe_scribe::{ComparisonItem, ProductDetail, Suggestion, is_product_url};

#[derive(Debug, Parser)]
#[command(
    name = "cartscribe",
    version,
    about = "AI-scribed product details and cross-platform price comparison"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scribe details and platform prices for a product name or link.
    Product {
        query: String,
        #[arg(long)]
        json: bool,
        /// Ask the running daemon instead of calling the model directly.
        #[arg(long)]
        remote: bool,
    },
    /// Find products matching free-text requirements, cheapest first.
    Compare {
        requirements: String,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        remote: bool,
    },
    /// Quick search-box suggestions.
    Suggest {
        query: String,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        remote: bool,
    },
    /// Run the daemon in the foreground.
    Serve,
    /// Send a trivial prompt to the configured model.
    Ping {
        #[arg(long)]
        remote: bool,
    },
    /// Show daemon status.
    Status,
    /// List Gemini models that support content generation.
    Models,
    /// Try each candidate Gemini model with a short prompt.
    Probe {
        /// Models to try (defaults to a built-in list).
        models: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(config = %cli.config, model = %config.active_model(), "configuration loaded");

    match cli.command {
        Commands::Product {
            query,
            json,
            remote,
        } => {
            let query = if query.trim().is_empty() {
                DEFAULT_PRODUCT_QUERY.to_string()
            } else {
                query
            };
            let (detail, source_url) = if remote {
                fetch_product_remote(&config, query).await?
            } else {
                let detail = scribe_from_config(&config).product_detail(&query).await;
                let source_url = is_product_url(&query).then_some(query);
                (detail, source_url)
            };
            if json {
                println!("{}", render::product_json(&detail, source_url.as_deref())?);
            } else {
                print!("{}", render::product_text(&detail, source_url.as_deref()));
            }
        }
        Commands::Compare {
            requirements,
            json,
            remote,
        } => {
            if requirements.trim().is_empty() {
                bail!("No query provided");
            }
            let items = if remote {
                fetch_comparison_remote(&config, requirements.clone()).await?
            } else {
                scribe_from_config(&config).comparison(&requirements).await
            };
            if json {
                println!("{}", render::comparison_json(&requirements, &items)?);
            } else {
                print!("{}", render::comparison_text(&requirements, &items));
            }
        }
        Commands::Suggest {
            query,
            json,
            remote,
        } => {
            if query.trim().is_empty() {
                bail!("No query provided");
            }
            let suggestions = if remote {
                fetch_suggestions_remote(&config, query).await?
            } else {
                scribe_from_config(&config).suggestions(&query).await
            };
            if json {
                println!("{}", render::suggestions_json(&suggestions)?);
            } else {
                print!("{}", render::suggestions_text(&suggestions));
            }
        }
        Commands::Serve => {
            let scribe = Arc::new(scribe_from_config(&config));
            run_daemon(config, scribe).await?;
        }
        Commands::Ping { remote } => {
            if remote {
                match daemon_client(&config).request(ClientCommand::Ping).await? {
                    ServerEvent::Pong(reply) => println!("AI Response: {reply}"),
                    ServerEvent::Error(message) => println!("{message}"),
                    other => bail!("unexpected daemon reply: {other:?}"),
                }
            } else {
                match scribe_from_config(&config).ping().await {
                    Ok(reply) => println!("AI Response: {reply}"),
                    Err(err) => println!("API Error: {err}"),
                }
            }
        }
        Commands::Status => match daemon_client(&config).request(ClientCommand::Status).await? {
            ServerEvent::Status(status) => {
                println!("cartscribe daemon");
                println!("- socket: {}", status.socket_path);
                println!("- generator: {}", status.generator);
                println!("- uptime: {}s", status.uptime_secs);
                println!("- requests served: {}", status.requests_served);
            }
            other => bail!("unexpected daemon reply: {other:?}"),
        },
        Commands::Models => {
            println!("Available models:");
            for model in list_gemini_models(&config.llm).await? {
                println!("{model}");
            }
        }
        Commands::Probe { models } => {
            let candidates = if models.is_empty() {
                DEFAULT_PROBE_MODELS.iter().map(|m| m.to_string()).collect()
            } else {
                models
            };
            for probe in probe_gemini_models(&config.llm, &candidates).await {
                match probe {
                    ModelProbe::Ok { model, preview } => {
                        println!("Testing {model}...\n  SUCCESS: {preview}...")
                    }
                    ModelProbe::Failed { model, error } => {
                        println!("Testing {model}...\n  FAILED: {error}")
                    }
                }
            }
        }
    }

    Ok(())
}

fn daemon_client(config: &AppConfig) -> DaemonClient {
    DaemonClient::new(&config.server.socket_path)
}

async fn fetch_product_remote(
    config: &AppConfig,
    query: String,
) -> Result<(ProductDetail, Option<String>)> {
    match daemon_client(config)
        .request(ClientCommand::ProductDetail { query })
        .await?
    {
        ServerEvent::Product { detail, source_url } => Ok((detail, source_url)),
        ServerEvent::Error(message) => bail!(message),
        other => bail!("unexpected daemon reply: {other:?}"),
    }
}

async fn fetch_comparison_remote(
    config: &AppConfig,
    requirements: String,
) -> Result<Vec<ComparisonItem>> {
    match daemon_client(config)
        .request(ClientCommand::Compare { requirements })
        .await?
    {
        ServerEvent::Comparison { items, .. } => Ok(items),
        ServerEvent::Error(message) => bail!(message),
        other => bail!("unexpected daemon reply: {other:?}"),
    }
}

async fn fetch_suggestions_remote(config: &AppConfig, query: String) -> Result<Vec<Suggestion>> {
    match daemon_client(config)
        .request(ClientCommand::Suggest { query })
        .await?
    {
        ServerEvent::Suggestions(suggestions) => Ok(suggestions),
        ServerEvent::Error(message) => bail!(message),
        other => bail!("unexpected daemon reply: {other:?}"),
    }
}
