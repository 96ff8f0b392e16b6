use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Failed to encode filter state as a query string: {0}")]
    QueryEncoding(String),

    #[error("The {0} store was dropped")]
    StoreClosed(&'static str),
}
