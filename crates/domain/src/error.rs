/// Shared error type used across all memoir crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The provider asked us to slow down (HTTP 429). The only failure the
    /// retry engine backs off on.
    #[error("rate limited by {provider}: {message}")]
    RateLimited { provider: String, message: String },

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The model answered, but not with the structured fields we asked for.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedOutput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
