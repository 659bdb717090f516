use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Input contains no rows")]
    EmptyInput,

    #[error("Unusable input: {0}")]
    ParseError(String),

    #[error("Required column '{0}' not found in any row")]
    MissingColumn(String),

    #[error("Invalid exchange rate {value} for {code}: must be a positive number")]
    InvalidRate { code: String, value: f64 },

    #[error("Invalid target {value} for manager '{manager}': must be a non-negative number")]
    InvalidTarget { manager: String, value: f64 },

    #[error("Invalid page size {0}: must be at least 1")]
    InvalidPageSize(usize),

    #[error("Unknown month label: {0}")]
    UnknownMonthLabel(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
