//! Reputation-gated delivery for RelayGate
//!
//! Each round evolves node health, scores every node, picks an eligible
//! recipient and seals a payload for it with the configured KEM:
//!
//! ```text
//! MetricsTable --advance--> scores --partition--> safe set
//!      --SelectionPolicy--> recipient --encrypt_for--> Envelope
//! ```
//!
//! Scores are published to a [`relaygate_core::ScoreStore`] on a best-effort
//! basis through [`publish_scores`].

pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod publisher;
pub mod registry;
pub mod selection;
pub mod store;

pub use error::{DeliveryError, Result};
pub use metrics::{register_delivery_metrics, DeliveryMetrics};
pub use orchestrator::{Delivery, DeliveryOrchestrator, RoundOutcome, RoundReport};
pub use publisher::{publish_scores, PublishSummary};
pub use registry::{NodeRegistry, RegistryEntry};
pub use selection::SelectionPolicy;
pub use store::InMemoryScoreStore;
