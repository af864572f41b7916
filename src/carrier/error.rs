use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("carrier returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("carrier request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("carrier call timed out: {0}")]
    Timeout(String),

    #[error("unexpected carrier response: {0}")]
    Decode(String),

    #[error("carrier credentials are not configured")]
    MissingCredentials,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for CarrierError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            CarrierError::Timeout(error.to_string())
        } else if error.is_decode() {
            CarrierError::Decode(error.to_string())
        } else {
            CarrierError::Transport(error)
        }
    }
}

pub type CarrierResult<T> = Result<T, CarrierError>;
