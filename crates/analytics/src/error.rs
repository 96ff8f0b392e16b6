use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid analytics parameter: {0}")]
    InvalidParameter(String),
}
