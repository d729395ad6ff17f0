//! Concrete [`TextGenerator`](crate::generation::TextGenerator) implementations.

#[cfg(feature = "ggml")]
pub mod ggml;
pub mod transformers;

use tracing::info;

use transformers::TransformersGenerator;

use crate::chatbot::PoetryChatbot;
use crate::error::Result;
use crate::settings::{Backend, Settings};

/// Load both models for the configured backend. Runs once, at startup.
pub fn load(settings: &Settings) -> Result<PoetryChatbot> {
    info!(
        backend = ?settings.backend,
        chat = %settings.chat_model,
        poetry = %settings.poetry_model,
        "loading models"
    );
    match settings.backend {
        Backend::Transformers => {
            let chat = TransformersGenerator::new(&settings.chat_model, settings.use_gpu)?;
            let poetry = TransformersGenerator::new(&settings.poetry_model, settings.use_gpu)?;
            Ok(PoetryChatbot::new(Box::new(chat), Box::new(poetry)))
        }
        Backend::Ggml => load_ggml(settings),
    }
}

#[cfg(feature = "ggml")]
fn load_ggml(settings: &Settings) -> Result<PoetryChatbot> {
    use std::path::Path;

    use llm::models::Gpt2;

    use ggml::GgmlGenerator;

    // DialoGPT and GPT-2 share the GPT-2 architecture.
    let chat = GgmlGenerator::<Gpt2>::load(Path::new(&settings.chat_model), settings.use_gpu)?;
    let poetry = GgmlGenerator::<Gpt2>::load(Path::new(&settings.poetry_model), settings.use_gpu)?;
    Ok(PoetryChatbot::new(Box::new(chat), Box::new(poetry)))
}

#[cfg(not(feature = "ggml"))]
fn load_ggml(_settings: &Settings) -> Result<PoetryChatbot> {
    Err(crate::error::PoetryError::config(
        "backend \"ggml\" requires building with the `ggml` feature",
    ))
}
