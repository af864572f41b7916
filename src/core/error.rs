use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Missing template: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for DocumentError {
    fn from(error: lopdf::Error) -> Self {
        DocumentError::Pdf(error.to_string())
    }
}

impl From<tokio::task::JoinError> for DocumentError {
    fn from(error: tokio::task::JoinError) -> Self {
        DocumentError::Pdf(format!("blocking task failed: {}", error))
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
