//! rsvd — the rsvgrid node daemon.
//!
//! One process per node. Each node serves the peer protocol and the
//! booking API, and coordinates seat writes with its statically configured
//! peers through a shared critical section.
//!
//! # Usage
//!
//! ```text
//! rsvd serve --config node-a.toml
//! rsvd serve --config node.toml --node-id node-b --listen 0.0.0.0:8081 \
//!     --peer node-a=http://10.0.0.1:8080
//! rsvd check-config --config node-a.toml
//! ```

mod config;
mod node;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, NodeConfig, Overrides, PeerEntry};

const DEFAULT_FILTER: &str = "info,rsvd=debug,rsvgrid=debug";

#[derive(Parser)]
#[command(name = "rsvd", about = "rsvgrid reservation node")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a node.
    Serve {
        /// Path to the node's TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Override `node_id`.
        #[arg(long)]
        node_id: Option<String>,

        /// Override `listen`.
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Add or replace a peer. Repeatable.
        #[arg(long = "peer", value_name = "ID=URL", value_parser = config::parse_peer_arg)]
        peers: Vec<PeerEntry>,
    },

    /// Validate a config file and print the resolved settings.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            node_id,
            listen,
            peers,
        } => {
            let mut config = NodeConfig::from_file(&config)?;
            config.apply(Overrides {
                node_id,
                listen,
                peers,
            });
            config.validate()?;
            init_tracing(config.log_format);
            node::run_node(config).await
        }
        Command::CheckConfig { config: path } => {
            let config = NodeConfig::from_file(&path)?;
            config.validate()?;
            let notify = config.notifier_config()?;
            println!("{}: ok", path.display());
            println!("  node_id: {}", config.node_id);
            println!("  listen:  {}", config.listen);
            println!(
                "  notify:  timeout={:?} workers={} queue_capacity={}",
                notify.timeout, notify.workers, notify.queue_capacity
            );
            for peer in config.peer_directory()?.iter() {
                println!("  peer:    {} -> {}", peer.id, peer.url);
            }
            for train in &config.trains {
                println!("  train:   {} {} ({} seats)", train.id, train.name, train.total_seats);
            }
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
