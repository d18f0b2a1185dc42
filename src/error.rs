use thiserror::Error;

/// Failures callers match on; everything else travels as `anyhow::Error`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FutureSightError {
    #[error("banner not found: {0}")]
    BannerNotFound(String),

    #[error("invalid value for setting '{key}': {value}")]
    InvalidSetting { key: String, value: String },

    #[error("unknown banner category: {0}")]
    UnknownCategory(String),
}
