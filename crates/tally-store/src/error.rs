/// Failures of the persistence side. The ledger itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("server rejected {url} ({status}): {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    #[error("cannot decode session record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid config: {reason}")]
    Config { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
