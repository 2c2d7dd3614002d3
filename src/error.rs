use crate::structs::Season;
use arrow_schema::ArrowError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parquet Error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow Error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("Data Error: {0}")]
    Data(String),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),
    #[error("Undefined baseline for {city}/{season}: fewer than 2 observations")]
    UndefinedBaseline { city: String, season: Season },
    #[error("No historical baseline for {city}/{season}")]
    NotFound { city: String, season: Season },
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
    #[error("Provider Error: {message}")]
    Provider { code: Option<u16>, message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
