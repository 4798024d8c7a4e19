use ztool_common::FromMessage;

/// Crate-wide result type for member backend calls.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend answered with a non-success business code.
    #[error("{message} (code {code})")]
    Business { code: i64, message: String },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn business(code: i64, message: impl Into<String>) -> Self {
        Self::Business {
            code,
            message: message.into(),
        }
    }

    /// Business code of the error, if the backend reported one.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Business { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

ztool_common::impl_context!();
