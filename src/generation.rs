//! The capability every model backend provides: tokenize, generate, detokenize.
//!
//! The chatbot never talks to a model runtime directly. It only sees a
//! [`TextGenerator`] and a fixed [`GenerationParameters`] preset, so tests can
//! swap in a fake generator without loading any weights.

use crate::error::Result;

pub type TokenId = u32;

/// A loaded text-generation model.
pub trait TextGenerator {
    /// Tokenize `text` without adding any special tokens of its own.
    fn encode(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Continue `input`. The returned sequence starts with the input tokens.
    fn generate(&self, input: &[TokenId], parameters: &GenerationParameters)
        -> Result<Vec<TokenId>>;

    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String>;

    /// Textual end-of-sequence marker, used to close a conversational turn.
    fn eos_token(&self) -> Option<&str>;
}

/// Decoding knobs handed to a [`TextGenerator`].
///
/// Only the two presets below are used; nothing here is user configurable.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    /// Cap on the whole sequence, prompt included.
    pub max_length: Option<usize>,
    /// Cap on generated tokens. Takes precedence over `max_length`.
    pub max_new_tokens: Option<usize>,
    pub do_sample: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: Option<usize>,
    pub no_repeat_ngram_size: Option<usize>,
    pub repetition_penalty: Option<f32>,
    pub num_beams: usize,
    pub num_return_sequences: usize,
    pub early_stopping: bool,
}

impl GenerationParameters {
    /// Conversational decoding: plain nucleus + top-k sampling.
    pub fn chat(max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            max_new_tokens: None,
            do_sample: true,
            temperature: 0.8,
            top_p: 0.7,
            top_k: Some(100),
            no_repeat_ngram_size: Some(3),
            repetition_penalty: None,
            num_beams: 1,
            num_return_sequences: 1,
            early_stopping: false,
        }
    }

    /// Poem decoding: beam search combined with sampling, hard 60 token cap.
    pub fn poem(max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            max_new_tokens: Some(60),
            do_sample: true,
            temperature: 0.8,
            top_p: 0.92,
            top_k: None,
            no_repeat_ngram_size: Some(3),
            repetition_penalty: Some(1.5),
            num_beams: 5,
            num_return_sequences: 1,
            early_stopping: true,
        }
    }

    /// Number of tokens a backend may generate after a prompt of `prompt_len`.
    pub fn new_token_budget(&self, prompt_len: usize) -> usize {
        match (self.max_new_tokens, self.max_length) {
            (Some(new_tokens), _) => new_tokens,
            (None, Some(total)) => total.saturating_sub(prompt_len),
            (None, None) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_preset_samples_with_nucleus_and_top_k() {
        let params = GenerationParameters::chat(1000);
        assert!(params.do_sample);
        assert_eq!(params.max_length, Some(1000));
        assert_eq!(params.top_p, 0.7);
        assert_eq!(params.top_k, Some(100));
        assert_eq!(params.temperature, 0.8);
        assert_eq!(params.no_repeat_ngram_size, Some(3));
        assert_eq!(params.num_beams, 1);
    }

    #[test]
    fn poem_preset_caps_new_tokens_independently_of_max_length() {
        let params = GenerationParameters::poem(100);
        assert_eq!(params.max_length, Some(100));
        assert_eq!(params.max_new_tokens, Some(60));
        assert_eq!(params.num_beams, 5);
        assert_eq!(params.repetition_penalty, Some(1.5));
        assert!(params.early_stopping);
        assert_eq!(params.new_token_budget(80), 60);
        assert_eq!(params.new_token_budget(5), 60);
    }

    #[test]
    fn chat_budget_is_what_remains_of_max_length() {
        let params = GenerationParameters::chat(1000);
        assert_eq!(params.new_token_budget(10), 990);
        assert_eq!(params.new_token_budget(1200), 0);
    }
}
