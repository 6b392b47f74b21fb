//! Lunara is the insight engine behind a reproductive and preventive health
//! tracker.
//!
//! The pipeline per request: a domain module renders a prompt from the
//! caller's record and profile, the provider registry runs it against the
//! active provider (falling back down the chain on exhaustion), the
//! extractor pulls declared sections out of the free-text response, and the
//! assembler combines them with rule-based tips, reminders, and a non-AI
//! quick check into one stable result shape. When every provider fails the
//! same shape is served from the rule-based generators alone.

pub mod config;
pub mod domains;
pub mod insight;
pub mod models;
pub mod providers;

pub use config::ProviderSettings;
pub use domains::{DomainModule, DomainRegistry};
pub use insight::engine::InsightEngine;
pub use insight::InsightError;
pub use models::{
    FieldValue, HealthEntry, HealthRecord, InsightResult, PredictedWindow, QuickCheck,
    QuickMetric, UserProfile,
};
pub use providers::registry::{AllProvidersFailed, ProviderRegistry, ProviderStatus};
pub use providers::{ProviderError, TextProvider};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and tests that want it. Respects
/// `RUST_LOG`, defaulting to the crate's info level. Safe to call more than
/// once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
