use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiddlewareError {
    #[error("middleware '{name}' rejected the value: {reason}")]
    Rejected { name: String, reason: String },
    #[error("{0}")]
    Custom(String),
}
