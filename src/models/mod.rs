pub mod entry;
pub mod insight;
pub mod profile;

pub use entry::{FieldValue, HealthEntry, HealthRecord};
pub use insight::{InsightResult, PredictedWindow, QuickCheck, QuickMetric};
pub use profile::UserProfile;
