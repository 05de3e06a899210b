use blockshift_common::{BlockUri, ParseCategoryError};
use std::path::PathBuf;

/// Errors from loading or validating definitions.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported definitions format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("{block} rule {index}: chance {chance} is outside [0, 1]")]
    InvalidChance {
        block: BlockUri,
        index: usize,
        chance: f32,
    },
    #[error("{block} rule {index}: min_distance {min} exceeds max_distance {max}")]
    InvertedRange {
        block: BlockUri,
        index: usize,
        min: f32,
        max: f32,
    },
    #[error("{block} rule {index}: distances must be finite and not negative")]
    NegativeDistance { block: BlockUri, index: usize },
    #[error("{block} rule {index}: field_of_view must be finite and not negative")]
    NegativeFieldOfView { block: BlockUri, index: usize },
    #[error("{block} rule {index}: directed rules need a side")]
    MissingSide { block: BlockUri, index: usize },
    #[error("{block} rule {index}: {source}")]
    UnknownCategory {
        block: BlockUri,
        index: usize,
        source: ParseCategoryError,
    },
    #[error("{block}: stage sequence has no stages")]
    EmptySequence { block: BlockUri },
    #[error("{block}: stage {stage} appears more than once")]
    DuplicateStage { block: BlockUri, stage: BlockUri },
    #[error("session check_interval_ms must be positive")]
    ZeroCheckInterval,
}
