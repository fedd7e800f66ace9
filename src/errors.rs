use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScoutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status class a transport layer should map this error to.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Duplicate(_) => 400,
            Self::NotFound(_) => 404,
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Toml(_) => 500,
        }
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<std::io::Error> for ScoutError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
