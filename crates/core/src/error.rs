use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be parsed. `row` is the 1-based data row in the source table.
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("Feature error: {0}")]
    Feature(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Plot error: {0}")]
    Plot(String),
}

impl CallwatchError {
    pub fn parse(row: usize, message: impl Into<String>) -> Self {
        CallwatchError::Parse {
            row,
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CallwatchError::Io(_) => "io",
            CallwatchError::Parse { .. } => "parse",
            CallwatchError::Feature(_) => "feature",
            CallwatchError::Config(_) => "config",
            CallwatchError::Csv(_) => "csv",
            CallwatchError::Parquet(_) => "parquet",
            CallwatchError::Serialize(_) => "serialize",
            CallwatchError::Plot(_) => "plot",
        }
    }
}

pub type Result<T> = std::result::Result<T, CallwatchError>;
