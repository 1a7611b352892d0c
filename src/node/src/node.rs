//! Delivery node: round scheduler, score publishing and metrics endpoint

use anyhow::{Context, Result};
use prometheus::{Encoder, TextEncoder};
use relaygate_core::{NodeId, ReputationScore};
use relaygate_crypto::{kem_for, KeyEncapsulation};
use relaygate_delivery::{
    publish_scores, register_delivery_metrics, Delivery, DeliveryError, DeliveryMetrics,
    DeliveryOrchestrator, InMemoryScoreStore, NodeRegistry, PublishSummary, RoundReport,
};
use relaygate_reputation::{get_registry, register_metrics};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::NodeConfig;

/// What one scheduled round produced
#[derive(Debug)]
pub struct RoundSummary {
    pub round: u64,
    pub scores: BTreeMap<NodeId, ReputationScore>,
    pub safe: Vec<NodeId>,
    pub recipient: Option<NodeId>,
    pub envelope_path: Option<PathBuf>,
    /// Outcome of opening the envelope and comparing it with the payload,
    /// `None` when verification is off or nothing was delivered
    pub verified: Option<std::result::Result<(), DeliveryError>>,
    pub published: PublishSummary,
}

/// Long-running node driving delivery rounds on a fixed interval
pub struct DeliveryNode {
    config: NodeConfig,
    orchestrator: DeliveryOrchestrator,
    store: InMemoryScoreStore,
    payload: Option<Vec<u8>>,
    delivery_metrics: Option<Arc<DeliveryMetrics>>,
    shutdown: CancellationToken,
}

impl DeliveryNode {
    /// Create a node from validated configuration
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;

        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // 1. Key material
        let kem = kem_for(config.crypto.algorithm);
        let registry = Self::load_or_generate_registry(
            &config.registry_path(),
            kem.as_ref(),
            config.node.registry_count,
            config.node.auto_generate_registry,
        )?;
        registry
            .validate(kem.as_ref())
            .context("Node registry failed key validation")?;
        info!(
            nodes = registry.len(),
            algorithm = %kem.algorithm(),
            "Node registry ready"
        );

        // 2. Payload
        let payload = match config.payload_path() {
            Some(path) => {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read payload {:?}", path))?;
                info!(path = ?path, bytes = bytes.len(), "Loaded delivery payload");
                Some(bytes)
            }
            None => {
                info!("No payload configured; rounds will only score nodes");
                None
            }
        };

        // 3. Orchestrator and metrics
        let mut orchestrator = DeliveryOrchestrator::new(
            Arc::new(registry),
            kem,
            config.reputation.clone(),
            config.delivery.policy,
        )
        .context("Failed to initialize delivery orchestrator")?;

        let delivery_metrics = if config.metrics.enabled {
            let reputation_metrics =
                register_metrics().context("Failed to register reputation metrics")?;
            let delivery_metrics =
                register_delivery_metrics().context("Failed to register delivery metrics")?;
            orchestrator = orchestrator
                .with_reputation_metrics(reputation_metrics)
                .with_delivery_metrics(delivery_metrics.clone());
            Some(delivery_metrics)
        } else {
            None
        };

        let store = InMemoryScoreStore::new(config.reputation.safe_threshold);

        Ok(Self {
            config,
            orchestrator,
            store,
            payload,
            delivery_metrics,
            shutdown: CancellationToken::new(),
        })
    }

    /// Run rounds until shutdown or `max_rounds`
    pub async fn run(&self) -> Result<()> {
        info!(
            interval_ms = self.config.node.round_interval_ms,
            max_rounds = ?self.config.node.max_rounds,
            policy = %self.orchestrator.policy(),
            "Starting delivery rounds"
        );

        let metrics_task = if self.config.metrics.enabled {
            let addr: SocketAddr =
                format!("{}:{}", self.config.metrics.host, self.config.metrics.port)
                    .parse()
                    .context("Invalid metrics listen address")?;
            Some(spawn_metrics_server(addr, self.shutdown.clone())?)
        } else {
            None
        };

        let mut ticker = interval(self.config.round_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Round scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(summary) => debug!(
                            round = summary.round,
                            safe = summary.safe.len(),
                            delivered = summary.recipient.is_some(),
                            "Round complete"
                        ),
                        Err(e) => error!("Round failed: {:#}", e),
                    }

                    if let Some(max) = self.config.node.max_rounds {
                        if self.orchestrator.rounds() >= max {
                            info!(rounds = max, "Reached configured round limit");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown.cancel();
        if let Some(task) = metrics_task {
            let _ = task.await;
        }

        Ok(())
    }

    /// Run one round: evolve, score, publish, seal, persist
    pub async fn tick(&self) -> Result<RoundSummary> {
        let (report, delivery) = match &self.payload {
            Some(payload) => {
                let outcome = self.orchestrator.run_round(payload)?;
                (outcome.report, outcome.delivery)
            }
            None => (self.orchestrator.advance_round(), None),
        };

        let published =
            publish_scores(&self.store, &report.scores, self.config.store_timeout()).await;
        if !published.is_complete() {
            warn!(
                round = report.round,
                failed = published.failed.len(),
                timed_out = published.timed_out.len(),
                "Score publishing incomplete"
            );
        }
        if let Some(m) = &self.delivery_metrics {
            m.record_store_failures(published.failed.len(), published.timed_out.len());
        }

        write_scores(&self.config.scores_path(), &report.scores)?;

        let mut summary = RoundSummary {
            round: report.round,
            scores: report.scores,
            safe: report.safe,
            recipient: None,
            envelope_path: None,
            verified: None,
            published,
        };

        if let (Some(delivery), Some(payload)) = (delivery, &self.payload) {
            let path = write_envelope(&self.config.outbox_dir(), &delivery)?;
            if self.config.delivery.verify_roundtrip {
                summary.verified = Some(self.orchestrator.verify_payload(&delivery, payload));
            }
            info!(
                round = delivery.round,
                recipient = %delivery.recipient,
                path = ?path,
                "Envelope written to outbox"
            );
            summary.recipient = Some(delivery.recipient);
            summary.envelope_path = Some(path);
        }

        Ok(summary)
    }

    /// Graceful shutdown
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn orchestrator(&self) -> &DeliveryOrchestrator {
        &self.orchestrator
    }

    pub fn store(&self) -> &InMemoryScoreStore {
        &self.store
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Load the registry file, or generate and save one
    fn load_or_generate_registry(
        path: &Path,
        kem: &dyn KeyEncapsulation,
        count: usize,
        auto_generate: bool,
    ) -> Result<NodeRegistry> {
        if path.exists() {
            info!("Loading node registry from {:?}", path);
            Ok(NodeRegistry::load(path)?)
        } else if auto_generate {
            info!(count, "Generating node registry...");
            let registry = NodeRegistry::generate(kem, count, &mut rand::thread_rng())?;
            registry.save(path)?;
            info!("Node registry saved to {:?}", path);
            Ok(registry)
        } else {
            anyhow::bail!(
                "Node registry {:?} not found and auto-generation is disabled",
                path
            );
        }
    }
}

/// Advance a fresh orchestrator over the configured registry `rounds` times
/// and return the last report
pub fn score_registry(config: &NodeConfig, rounds: u64) -> Result<RoundReport> {
    if rounds == 0 {
        anyhow::bail!("--rounds must be at least 1");
    }

    let path = config.registry_path();
    let registry = NodeRegistry::load(&path)
        .with_context(|| format!("Failed to load registry {:?}", path))?;

    let orchestrator = DeliveryOrchestrator::new(
        Arc::new(registry),
        kem_for(config.crypto.algorithm),
        config.reputation.clone(),
        config.delivery.policy,
    )?;

    let mut report = orchestrator.advance_round();
    for _ in 1..rounds {
        report = orchestrator.advance_round();
    }
    Ok(report)
}

/// Write the latest score of every node as a JSON object
pub fn write_scores(path: &Path, scores: &BTreeMap<NodeId, ReputationScore>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(scores)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write scores to {:?}", path))?;
    Ok(())
}

/// Write `<outbox>/envelope-<round>.json`
pub fn write_envelope(outbox: &Path, delivery: &Delivery) -> Result<PathBuf> {
    std::fs::create_dir_all(outbox)
        .with_context(|| format!("Failed to create outbox {:?}", outbox))?;
    let path = outbox.join(format!("envelope-{}.json", delivery.round));
    std::fs::write(&path, delivery.to_json()?)
        .with_context(|| format!("Failed to write envelope {:?}", path))?;
    Ok(path)
}

/// Text exposition of every metric on the shared registry
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = get_registry().map(|r| r.gather()).unwrap_or_default();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).ok();
    String::from_utf8(buffer).unwrap_or_default()
}

/// Serve `/metrics` until `shutdown` fires
fn spawn_metrics_server(
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    use warp::Filter;

    let metrics_route = warp::path("metrics").map(render_metrics);

    let (bound, server) = warp::serve(metrics_route)
        .try_bind_with_graceful_shutdown(addr, async move { shutdown.cancelled().await })
        .with_context(|| format!("Failed to bind metrics server on {}", addr))?;

    info!("Metrics server listening on http://{}/metrics", bound);
    Ok(tokio::spawn(server))
}
