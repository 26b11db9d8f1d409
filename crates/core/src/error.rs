use thiserror::Error;

pub type OfferLinkResult<T> = Result<T, OfferLinkError>;

#[derive(Error, Debug)]
pub enum OfferLinkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Assignment executor error: {0}")]
    Executor(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
