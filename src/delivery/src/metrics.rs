//! Prometheus metrics for delivery rounds

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Histogram, HistogramOpts, IntCounter, IntCounterVec,
    Opts, Registry,
};
use relaygate_reputation::global_registry;
use std::sync::Arc;

/// Envelope size buckets in bytes
const ENVELOPE_SIZE_BUCKETS: &[f64] = &[
    128.0, 512.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0, 1048576.0,
];

pub struct DeliveryMetrics {
    /// Envelopes produced, by selection policy
    pub deliveries_total: IntCounterVec,

    /// Rounds that found no eligible recipient
    pub rounds_skipped_total: IntCounter,

    /// Score store writes that failed, by reason (error/timeout)
    pub store_failures_total: IntCounterVec,

    /// Round-trip verifications, by result (ok/failed)
    pub verifications_total: IntCounterVec,

    pub envelope_size_bytes: Histogram,
}

impl DeliveryMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let deliveries_total = register_int_counter_vec_with_registry!(
            Opts::new("relaygate_deliveries_total", "Envelopes produced for a recipient"),
            &["policy"],
            registry
        )?;

        let rounds_skipped_total = register_int_counter_with_registry!(
            Opts::new(
                "relaygate_rounds_skipped_total",
                "Rounds skipped because no node was eligible"
            ),
            registry
        )?;

        let store_failures_total = register_int_counter_vec_with_registry!(
            Opts::new("relaygate_store_failures_total", "Score store writes that did not complete"),
            &["reason"],
            registry
        )?;

        let verifications_total = register_int_counter_vec_with_registry!(
            Opts::new("relaygate_verifications_total", "Envelope round-trip verifications"),
            &["result"],
            registry
        )?;

        let envelope_size_bytes = register_histogram_with_registry!(
            HistogramOpts::new("relaygate_envelope_size_bytes", "Size of produced envelopes")
                .buckets(ENVELOPE_SIZE_BUCKETS.to_vec()),
            registry
        )?;

        Ok(Self {
            deliveries_total,
            rounds_skipped_total,
            store_failures_total,
            verifications_total,
            envelope_size_bytes,
        })
    }

    pub fn record_delivery(&self, policy: &str, envelope_size: usize) {
        self.deliveries_total.with_label_values(&[policy]).inc();
        self.envelope_size_bytes.observe(envelope_size as f64);
    }

    pub fn record_skipped(&self) {
        self.rounds_skipped_total.inc();
    }

    pub fn record_store_failures(&self, failed: usize, timed_out: usize) {
        self.store_failures_total
            .with_label_values(&["error"])
            .inc_by(failed as u64);
        self.store_failures_total
            .with_label_values(&["timeout"])
            .inc_by(timed_out as u64);
    }

    pub fn record_verification(&self, ok: bool) {
        let result = if ok { "ok" } else { "failed" };
        self.verifications_total.with_label_values(&[result]).inc();
    }
}

/// Register delivery metrics on the shared process registry
pub fn register_delivery_metrics() -> Result<Arc<DeliveryMetrics>, prometheus::Error> {
    let registry = global_registry();
    Ok(Arc::new(DeliveryMetrics::new(&registry)?))
}
