use std::fmt;

pub type Result<T> = std::result::Result<T, KeyListError>;

/// Errors surfaced by [`crate::KeyListReader::read`]
#[derive(Debug, thiserror::Error)]
pub enum KeyListError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Mount resolution or backend communication failed
    #[error("{context}: {cause}")]
    Backend { context: String, cause: String },

    /// The listing call succeeded but nothing exists at the path
    #[error("no secrets found at {path:?}")]
    NotFound { path: String },
}

impl KeyListError {
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    /// Wraps an `anyhow` chain, keeping every cause in the message.
    pub fn backend<C: fmt::Display>(context: C, cause: &anyhow::Error) -> Self {
        Self::Backend {
            context: context.to_string(),
            cause: format!("{:#}", cause),
        }
    }

    pub fn not_found<T: Into<String>>(path: T) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
