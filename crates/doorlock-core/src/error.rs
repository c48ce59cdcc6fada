use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid card id: {0}")]
    InvalidCardId(String),

    #[error("Invalid rank code: {0}")]
    InvalidRank(i64),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
