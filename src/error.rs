use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoetryError {
    /// The login form came back with one or more `.error` elements.
    #[error("Error logging in: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Required element not found: {0}")]
    MissingElement(&'static str),

    #[error("Invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    #[error("Reply at depth {depth} has no parent comment")]
    OrphanComment { depth: usize },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PoetryError>;
