pub mod engine;
pub mod extract;
pub mod keywords;
pub mod prompt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("unknown tracking domain: {0}")]
    UnknownDomain(String),
}
