use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} from {provider}")]
    Status { provider: &'static str, status: u16 },
    #[error("unexpected response from {provider}: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("no match for '{0}'")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Transport-level failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    pub(crate) fn decode(provider: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Decode {
            provider,
            message: message.into(),
        }
    }
}
