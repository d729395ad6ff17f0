use thiserror::Error;

/// Result type alias used across the chatbot.
pub type Result<T> = std::result::Result<T, PoetryError>;

#[derive(Error, Debug)]
pub enum PoetryError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised by the embedded Python interpreter (tokenizer, model, torch).
    #[error("Python error: {0}")]
    Python(#[from] pyo3::PyErr),

    #[error("Tokenization error: {message}")]
    Tokenization { message: String },

    #[error("Model load error: {message}")]
    ModelLoad { message: String },

    #[error("Inference error: {message}")]
    Inference { message: String },
}

impl PoetryError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }
}

#[cfg(feature = "ggml")]
impl From<llm::InferenceError> for PoetryError {
    fn from(err: llm::InferenceError) -> Self {
        Self::inference(err.to_string())
    }
}

#[cfg(feature = "ggml")]
impl From<llm::LoadError> for PoetryError {
    fn from(err: llm::LoadError) -> Self {
        Self::ModelLoad {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "ggml")]
impl From<llm::TokenizationError> for PoetryError {
    fn from(err: llm::TokenizationError) -> Self {
        Self::Tokenization {
            message: err.to_string(),
        }
    }
}
