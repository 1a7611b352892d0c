//! Prometheus metrics for node reputation
//!
//! All collectors register on one process-wide registry so the node can
//! serve reputation and delivery metrics from a single endpoint
//! (default: http://localhost:9090/metrics).

use crate::reputation_tracker::ReputationStatistics;
use crate::types::ReputationScore;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use prometheus::{
    register_gauge_vec_with_registry, register_gauge_with_registry,
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Gauge, GaugeVec,
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;

/// Histogram buckets for reputation scores (0 to 100)
const REPUTATION_SCORE_BUCKETS: &[f64] = &[
    0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0,
];

lazy_static! {
    /// Global metrics registry shared across all components
    static ref METRICS_REGISTRY: Arc<RwLock<Option<Registry>>> = Arc::new(RwLock::new(None));
}

/// Reputation metrics collection
pub struct ReputationMetrics {
    /// Current reputation score per node (Gauge)
    pub reputation_score: GaugeVec,

    /// Mean reputation score across all nodes (Gauge)
    pub reputation_mean: Gauge,

    /// Nodes strictly above the safety threshold (Gauge)
    pub reputation_safe_nodes: IntGauge,

    /// Nodes at or below the safety threshold (Gauge)
    pub reputation_unsafe_nodes: IntGauge,

    /// Total number of tracked nodes (Gauge)
    pub reputation_total_nodes: IntGauge,

    pub reputation_highest_score: Gauge,

    pub reputation_lowest_score: Gauge,

    /// Fault events per node (Counter)
    pub reputation_faults_total: IntCounterVec,

    /// Times each node was forced into the healthy band (Counter)
    pub reputation_forced_healthy_total: IntCounterVec,

    /// Rounds evaluated (Counter)
    pub reputation_rounds_total: IntCounter,

    /// Distribution of per-node scores (Histogram)
    pub reputation_score_distribution: Histogram,
}

impl ReputationMetrics {
    /// Create a new metrics collection on `registry`
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let reputation_score = register_gauge_vec_with_registry!(
            Opts::new("relaygate_reputation_score", "Current reputation score per node (0-100)"),
            &["node_id"],
            registry
        )?;

        let reputation_mean = register_gauge_with_registry!(
            Opts::new("relaygate_reputation_mean", "Mean reputation score across all nodes"),
            registry
        )?;

        let reputation_safe_nodes = register_int_gauge_with_registry!(
            Opts::new("relaygate_reputation_safe_nodes", "Number of nodes eligible for delivery"),
            registry
        )?;

        let reputation_unsafe_nodes = register_int_gauge_with_registry!(
            Opts::new("relaygate_reputation_unsafe_nodes", "Number of nodes not eligible for delivery"),
            registry
        )?;

        let reputation_total_nodes = register_int_gauge_with_registry!(
            Opts::new("relaygate_reputation_total_nodes", "Total number of tracked nodes"),
            registry
        )?;

        let reputation_highest_score = register_gauge_with_registry!(
            Opts::new("relaygate_reputation_highest_score", "Highest reputation score in the network"),
            registry
        )?;

        let reputation_lowest_score = register_gauge_with_registry!(
            Opts::new("relaygate_reputation_lowest_score", "Lowest reputation score in the network"),
            registry
        )?;

        let reputation_faults_total = register_int_counter_vec_with_registry!(
            Opts::new("relaygate_reputation_faults_total", "Fault events per node"),
            &["node_id"],
            registry
        )?;

        let reputation_forced_healthy_total = register_int_counter_vec_with_registry!(
            Opts::new(
                "relaygate_reputation_forced_healthy_total",
                "Times a node was forced into the healthy band"
            ),
            &["node_id"],
            registry
        )?;

        let reputation_rounds_total = register_int_counter_with_registry!(
            Opts::new("relaygate_reputation_rounds_total", "Reputation rounds evaluated"),
            registry
        )?;

        let reputation_score_distribution = register_histogram_with_registry!(
            HistogramOpts::new(
                "relaygate_reputation_score_distribution",
                "Distribution of reputation scores"
            )
            .buckets(REPUTATION_SCORE_BUCKETS.to_vec()),
            registry
        )?;

        Ok(Self {
            reputation_score,
            reputation_mean,
            reputation_safe_nodes,
            reputation_unsafe_nodes,
            reputation_total_nodes,
            reputation_highest_score,
            reputation_lowest_score,
            reputation_faults_total,
            reputation_forced_healthy_total,
            reputation_rounds_total,
            reputation_score_distribution,
        })
    }
}

/// Shared process-wide registry, created on first use
pub fn global_registry() -> Registry {
    METRICS_REGISTRY.write().get_or_insert_with(Registry::new).clone()
}

/// Register reputation metrics on the global registry.
///
/// Call once during node startup.
pub fn register_metrics() -> Result<Arc<ReputationMetrics>, prometheus::Error> {
    let registry = global_registry();
    let metrics = ReputationMetrics::new(&registry)?;
    Ok(Arc::new(metrics))
}

/// Get the global metrics registry, if initialized
pub fn get_registry() -> Option<Registry> {
    METRICS_REGISTRY.read().clone()
}

/// Update aggregate gauges from round statistics
pub fn update_reputation_metrics(metrics: &ReputationMetrics, stats: &ReputationStatistics) {
    metrics.reputation_total_nodes.set(stats.total_nodes as i64);
    metrics.reputation_safe_nodes.set(stats.safe_nodes as i64);
    metrics.reputation_unsafe_nodes.set(stats.unsafe_nodes as i64);
    metrics.reputation_mean.set(stats.average_score);
    metrics.reputation_highest_score.set(f64::from(stats.highest_score));
    metrics.reputation_lowest_score.set(f64::from(stats.lowest_score));
}

/// Update per-node score gauge and the score histogram
pub fn update_node_reputation_score(
    metrics: &ReputationMetrics,
    node_id: &str,
    score: ReputationScore,
) {
    metrics
        .reputation_score
        .with_label_values(&[node_id])
        .set(f64::from(score));

    metrics.reputation_score_distribution.observe(f64::from(score));
}

pub fn record_fault(metrics: &ReputationMetrics, node_id: &str) {
    metrics.reputation_faults_total.with_label_values(&[node_id]).inc();
}

pub fn record_forced_healthy(metrics: &ReputationMetrics, node_id: &str) {
    metrics
        .reputation_forced_healthy_total
        .with_label_values(&[node_id])
        .inc();
}

pub fn record_round(metrics: &ReputationMetrics) {
    metrics.reputation_rounds_total.inc();
}
