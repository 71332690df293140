//! CLI entry point for the neobridge MCP server.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use neobridge_graph::{Executor, GraphClient, GraphConfig, QueryPolicy};
use neobridge_mcp::config::BridgeConfig;
use neobridge_mcp::dispatch::Dispatcher;
use neobridge_mcp::registry::Registry;
use neobridge_mcp::server::McpServer;

#[derive(Parser)]
#[command(name = "neobridge-mcp")]
#[command(about = "MCP server exposing safe Neo4j tool operations")]
struct Cli {
    /// Config file prefix (default: neobridge).
    #[arg(short, long, default_value = "neobridge")]
    config: String,

    /// Neo4j bolt URI override (otherwise from config).
    #[arg(long)]
    uri: Option<String>,

    /// Neo4j user override.
    #[arg(long)]
    user: Option<String>,

    /// Neo4j password override.
    #[arg(long)]
    password: Option<String>,

    /// Reject mutating execute_query statements, regardless of config.
    #[arg(long)]
    read_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is the JSON-RPC channel; all diagnostics go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let bridge_config = BridgeConfig::load(&cli.config)?;
    let mut graph_config = load_graph_config(&cli.config);

    if let Some(uri) = &cli.uri {
        graph_config.uri = uri.clone();
    }
    if let Some(user) = &cli.user {
        graph_config.user = user.clone();
    }
    if let Some(password) = &cli.password {
        graph_config.password = password.clone();
    }

    let client = GraphClient::connect(&graph_config).await?;

    let policy = if cli.read_only || bridge_config.read_only {
        QueryPolicy::ReadOnly
    } else {
        QueryPolicy::Unrestricted
    };
    let timeout = Duration::from_secs(bridge_config.query_timeout_secs);
    tracing::info!(?policy, timeout_secs = bridge_config.query_timeout_secs, "Bridge ready");

    let executor = Executor::new(client, policy, timeout);
    let dispatcher = Dispatcher::new(
        Registry::builtin(),
        executor,
        bridge_config.default_find_limit,
    );

    McpServer::new(dispatcher).run().await?;
    Ok(())
}

fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("NEOBRIDGE")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => GraphConfig {
            uri: c
                .get_string("neo4j.uri")
                .unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: c
                .get_string("neo4j.user")
                .unwrap_or_else(|_| "neo4j".to_string()),
            password: c
                .get_string("neo4j.password")
                .unwrap_or_else(|_| "neobridge-dev".to_string()),
            max_connections: c.get_int("neo4j.max_connections").map(|v| v as u32).unwrap_or(16),
            fetch_size: c.get_int("neo4j.fetch_size").map(|v| v as usize).unwrap_or(256),
        },
        Err(_) => GraphConfig::default(),
    }
}
