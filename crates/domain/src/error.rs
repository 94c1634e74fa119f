/// Shared error type used across all syncthing-kicker crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("config: {0}")]
    Config(String),

    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for deadline-exceeded transport failures. The dispatcher treats
    /// these as "the remote may still be processing" rather than failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_classification() {
        assert!(Error::Timeout("deadline".into()).is_timeout());
        assert!(!Error::Http("500".into()).is_timeout());
        assert!(!Error::Cancelled.is_timeout());
    }

    #[test]
    fn config_error_message_carries_detail() {
        let e = Error::Config("ST_API_KEY is required".into());
        assert_eq!(e.to_string(), "config: ST_API_KEY is required");
    }
}
