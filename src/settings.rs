//! Model selection, read from an optional `poetry_chatbot.*` file and
//! `POETRY_CHATBOT_*` environment variables. Decoding parameters are fixed and
//! deliberately absent here.
use serde::Deserialize;

use crate::error::{PoetryError, Result};

const CONFIG_FILE: &str = "poetry_chatbot";
const ENV_PREFIX: &str = "POETRY_CHATBOT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hugging Face `transformers` through the embedded Python interpreter.
    Transformers,
    /// Local GGML weights; needs the `ggml` cargo feature.
    Ggml,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    /// Hub name for `transformers`, file path for `ggml`.
    pub chat_model: String,
    pub poetry_model: String,
    pub use_gpu: bool,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            backend: Backend::Transformers,
            chat_model: "microsoft/DialoGPT-medium".to_string(),
            poetry_model: "gpt2-medium".to_string(),
            use_gpu: false,
            log_filter: "warn".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// `source` is a file name with or without extension; a missing file is fine.
    pub fn load_from(source: &str) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(source).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chat_model.trim().is_empty() {
            return Err(PoetryError::config("chat_model must not be empty"));
        }
        if self.poetry_model.trim().is_empty() {
            return Err(PoetryError::config("poetry_model must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn defaults_select_dialogpt_and_gpt2() {
        let settings = Settings::default();
        assert_eq!(settings.backend, Backend::Transformers);
        assert_eq!(settings.chat_model, "microsoft/DialoGPT-medium");
        assert_eq!(settings.poetry_model, "gpt2-medium");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.poetry_model, Settings::default().poetry_model);
    }

    #[test]
    fn file_overrides_selected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poetry_chatbot.toml");
        fs::write(
            &path,
            "backend = \"ggml\"\npoetry_model = \"models/gpt2-medium.bin\"\nuse_gpu = true\n",
        )
        .unwrap();

        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.backend, Backend::Ggml);
        assert_eq!(settings.poetry_model, "models/gpt2-medium.bin");
        assert!(settings.use_gpu);
        assert_eq!(settings.chat_model, "microsoft/DialoGPT-medium");
    }

    #[test]
    fn empty_model_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poetry_chatbot.toml");
        fs::write(&path, "chat_model = \"  \"\n").unwrap();

        let err = Settings::load_from(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PoetryError::Config { .. }));
    }
}
