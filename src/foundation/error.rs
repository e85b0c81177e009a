pub type LatexResult<T> = Result<T, LatexError>;

#[derive(thiserror::Error, Debug)]
pub enum LatexError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("typesetting engine error: {0}")]
    Engine(String),

    #[error("image decode error: {0}")]
    Decode(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("dependency cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LatexError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
