//! Per-round random walk of node health

use crate::types::{EvolutionParams, NodeMetrics, ACCURACY_BOUNDS, LATENCY_BOUNDS, UPTIME_BOUNDS};
use rand::Rng;

/// Advance a health record by one round.
///
/// Uptime, latency and accuracy drift by an independent uniform step each,
/// then a single fault check may knock accuracy down and bump `missed`.
/// `epochs_active` always increments.
pub fn evolve<R: Rng + ?Sized>(
    metrics: &NodeMetrics,
    params: &EvolutionParams,
    rng: &mut R,
) -> NodeMetrics {
    let mut next = *metrics;

    next.uptime = (next.uptime + (rng.gen::<f64>() - params.uptime_bias) * params.uptime_step)
        .clamp(UPTIME_BOUNDS.0, UPTIME_BOUNDS.1);
    next.latency = (next.latency + (rng.gen::<f64>() - 0.5) * params.latency_step)
        .clamp(LATENCY_BOUNDS.0, LATENCY_BOUNDS.1);
    next.accuracy = (next.accuracy + (rng.gen::<f64>() - 0.5) * params.accuracy_step)
        .clamp(ACCURACY_BOUNDS.0, ACCURACY_BOUNDS.1);
    next.epochs_active = next.epochs_active.saturating_add(1);

    if rng.gen::<f64>() < params.fault_probability {
        let span = params.fault_penalty_max - params.fault_penalty_min;
        let penalty = params.fault_penalty_min + rng.gen::<f64>() * span;
        next.accuracy = (next.accuracy - penalty).max(ACCURACY_BOUNDS.0);
        next.missed = next.missed.saturating_add(1);
    }

    next
}
