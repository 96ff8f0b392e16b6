use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data source error: {0}")]
    Source(String),

    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("State error: {0}")]
    State(#[from] state::StateError),
}
