use thiserror::Error;

#[derive(Error, Debug)]
pub enum TunerError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Lifecycle Error: {0}")]
    Lifecycle(String),
}

pub type TunerResult<T> = Result<T, TunerError>;
