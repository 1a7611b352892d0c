//! RelayGate Node - Main Binary
//!
//! Reputation-gated delivery node with:
//! - Per-round node health evolution and scoring
//! - Minimum healthy set enforcement
//! - KEM + AES-256-GCM sealed envelopes for one eligible recipient
//! - Prometheus metrics

use anyhow::{Context, Result};
use clap::Parser;
use relaygate_crypto::{kem_for, KemAlgorithm};
use relaygate_delivery::{NodeRegistry, SelectionPolicy};
use relaygate_node::{score_registry, DeliveryNode, NodeConfig};
use relaygate_reputation::is_safe;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};

/// RelayGate Node CLI
#[derive(Parser)]
#[command(name = "relaygate-node")]
#[command(about = "RelayGate - reputation-gated secure delivery node")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, env = "RELAYGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (overrides config)
    #[arg(long, env = "RELAYGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Payload to seal every round (overrides config)
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Recipient selection policy (overrides config)
    #[arg(long)]
    policy: Option<SelectionPolicy>,

    /// KEM algorithm (overrides config)
    #[arg(long)]
    algorithm: Option<KemAlgorithm>,

    /// Round interval in milliseconds (overrides config)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many rounds
    #[arg(long)]
    rounds: Option<u64>,

    /// Disable the metrics endpoint
    #[arg(long)]
    no_metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser)]
enum Command {
    /// Run delivery rounds (default)
    Run,

    /// Show node version
    Version,

    /// Generate a node registry with fresh key pairs
    Keygen {
        /// Number of nodes
        #[arg(short = 'n', long, default_value_t = 8)]
        count: usize,

        /// Registry file to write
        #[arg(short, long, default_value = "./nodes.json")]
        output: PathBuf,

        /// Also write a copy without secret keys
        #[arg(long)]
        public_output: Option<PathBuf>,
    },

    /// Print scores for the configured registry
    Score {
        /// Rounds to advance before printing (at least 1)
        #[arg(long, default_value_t = 1)]
        rounds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},relaygate_node=debug", log_level).into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => {
            let config = NodeConfig::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => NodeConfig::default(),
    };

    // Apply CLI overrides
    if let Some(data_dir) = cli.data_dir {
        config.node.data_dir = data_dir;
    }
    if let Some(payload) = cli.payload {
        config.delivery.payload_path = Some(payload);
    }
    if let Some(policy) = cli.policy {
        config.delivery.policy = policy;
    }
    if let Some(algorithm) = cli.algorithm {
        config.crypto.algorithm = algorithm;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.node.round_interval_ms = interval_ms;
    }
    if let Some(rounds) = cli.rounds {
        config.node.max_rounds = Some(rounds);
    }
    if cli.no_metrics {
        config.metrics.enabled = false;
    }

    // Validate configuration
    config.validate()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Version => {
            println!("RelayGate Node v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Keygen {
            count,
            output,
            public_output,
        } => generate_registry(&config, count, output, public_output),
        Command::Score { rounds } => print_scores(&config, rounds),
        Command::Run => run_node(config).await,
    }
}

async fn run_node(config: NodeConfig) -> Result<()> {
    info!("Starting RelayGate Node v{}", env!("CARGO_PKG_VERSION"));

    let node = DeliveryNode::new(config)?;
    info!("Delivery node initialized");

    // Stop the scheduler on Ctrl+C or SIGTERM and let it drain
    let token = node.shutdown_token();
    tokio::spawn(async move {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C)");
            }
            _ = shutdown_signal() => {
                info!("Received shutdown signal (SIGTERM)");
            }
            _ = token.cancelled() => return,
        }
        token.cancel();
    });

    if let Err(e) = node.run().await {
        error!("Node error: {:#}", e);
        return Err(e);
    }
    node.shutdown();

    info!(
        rounds = node.orchestrator().rounds(),
        published = node.store().len(),
        "Node stopped gracefully"
    );
    Ok(())
}

/// Generate a registry file
fn generate_registry(
    config: &NodeConfig,
    count: usize,
    output: PathBuf,
    public_output: Option<PathBuf>,
) -> Result<()> {
    if count == 0 {
        anyhow::bail!("--count must be at least 1");
    }

    let kem = kem_for(config.crypto.algorithm);
    info!("Generating {} node registry ({} nodes)...", kem.algorithm(), count);
    let registry = NodeRegistry::generate(kem.as_ref(), count, &mut rand::thread_rng())?;

    registry
        .save(&output)
        .with_context(|| format!("Failed to write registry to {:?}", output))?;
    info!("Registry generated:");
    info!("  Registry file: {:?}", output);
    info!("  Nodes: {}", registry.len());

    if let Some(path) = public_output {
        registry
            .without_secrets()
            .save(&path)
            .with_context(|| format!("Failed to write public registry to {:?}", path))?;
        info!("  Public registry: {:?}", path);
    }

    Ok(())
}

/// Advance the configured registry and print one line per node
fn print_scores(config: &NodeConfig, rounds: u64) -> Result<()> {
    let report = score_registry(config, rounds)?;

    let threshold = config.reputation.safe_threshold;
    println!("round {} (threshold {})", report.round, threshold);
    for (node_id, score) in &report.scores {
        let verdict = if is_safe(*score, threshold) { "safe" } else { "unsafe" };
        println!("{}  {:>3}  {}", node_id, score, verdict);
    }
    println!(
        "safe {}/{}  mean {:.1}",
        report.statistics.safe_nodes, report.statistics.total_nodes, report.statistics.average_score
    );

    Ok(())
}

/// Cross-platform shutdown signal handling
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix systems, only Ctrl+C is supported
    std::future::pending::<()>().await
}
