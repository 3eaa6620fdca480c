#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("ConfigError: {0}")]
    Config(String),

    #[error("ProviderError: {0}")]
    Provider(String),

    #[error("PollTimeoutError: gave up waiting for authorization after {0:?}")]
    PollTimeout(std::time::Duration),

    #[error("PollDeniedError: {0}")]
    PollDenied(String),

    #[error("EnumerationError: {0}")]
    Enumeration(String),

    /// Operator interrupted the run while polling
    #[error("Cancelled while waiting for authorization")]
    Cancelled,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Terminal outcomes of the token poller; everything else is a setup or listing failure.
    pub fn is_poll_failure(&self) -> bool {
        matches!(
            self,
            Error::PollTimeout(_) | Error::PollDenied(_) | Error::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
