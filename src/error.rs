//! Error types for loading inputs and configuring the loss engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LossError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Unknown month: {0}")]
    UnknownMonth(String),

    #[error("Invalid decade key: {0}")]
    InvalidDecadeKey(String),

    /// A line of a flow table file could not be interpreted. `row` is the
    /// 1-based data line; 0 is the header.
    #[error("Malformed flow table line {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// Decade values of a segment row do not fit the season calendar.
    #[error("Invalid decade series for row {number}: {reason}")]
    InvalidSeries { number: u32, reason: String },

    /// A reference row the topology draws from is not present in the table.
    #[error("Reference row {number} ({name}) missing from flow table")]
    MissingRow { number: u32, name: &'static str },

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LossError>;
