use tracing::{debug, info};

use crate::error::Result;
use crate::generation::{GenerationParameters, TextGenerator};
use crate::prompts::build_prompt;

pub const DEFAULT_CHAT_MAX_LENGTH: usize = 1000;
pub const DEFAULT_POEM_MAX_LENGTH: usize = 100;

/// Shown instead of a poem that fails [`accept_poem`].
pub const APOLOGY: &str = "I apologize, but I couldn't generate a proper poem. \
Please try again with a different prompt or topic.";

const MIN_POEM_WORDS: usize = 15;
const RELEVANCE_MARKERS: [&str; 3] = ["it", "this", "that"];

/// Both models, loaded once at startup and kept for the whole session.
pub struct PoetryChatbot {
    chat: Box<dyn TextGenerator>,
    poetry: Box<dyn TextGenerator>,
}

impl PoetryChatbot {
    pub fn new(chat: Box<dyn TextGenerator>, poetry: Box<dyn TextGenerator>) -> Self {
        PoetryChatbot { chat, poetry }
    }

    /// Reply to one user turn. Only the continuation is returned, unvalidated.
    pub fn generate_chat_response(&self, user_input: &str, max_length: usize) -> Result<String> {
        let turn = match self.chat.eos_token() {
            Some(eos) => format!("{user_input}{eos}"),
            None => user_input.to_string(),
        };
        let input_ids = self.chat.encode(&turn)?;
        let parameters = GenerationParameters::chat(max_length);
        debug!(prompt_tokens = input_ids.len(), "generating chat response");

        let output = self.chat.generate(&input_ids, &parameters)?;
        let continuation = output.get(input_ids.len()..).unwrap_or_default();
        debug!(new_tokens = continuation.len(), "chat response generated");
        self.chat.decode(continuation, true)
    }

    /// Write a poem about `theme`, or return [`APOLOGY`] if the output is unusable.
    pub fn generate_poem(&self, theme: &str, max_length: usize) -> Result<String> {
        let prompt = build_prompt(theme);
        let input_ids = self.poetry.encode(&prompt)?;
        let parameters = GenerationParameters::poem(max_length);
        debug!(theme, prompt_tokens = input_ids.len(), "generating poem");

        let output = self.poetry.generate(&input_ids, &parameters)?;
        let decoded = self.poetry.decode(&output, true)?;
        let cleaned = strip_prompt_echo(&decoded, &prompt);
        Ok(accept_poem(cleaned, theme))
    }
}

/// Drop the first copy of `prompt` from the decoded output and trim.
pub fn strip_prompt_echo(decoded: &str, prompt: &str) -> String {
    decoded.replacen(prompt, "", 1).trim().to_string()
}

/// Pass `cleaned` through unchanged if it looks like a poem about `theme`.
pub fn accept_poem(cleaned: String, theme: &str) -> String {
    let words = cleaned.split_whitespace().count();
    let lowered = cleaned.to_lowercase();
    let theme = theme.to_lowercase();
    let relevant = lowered.contains(theme.as_str())
        || RELEVANCE_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker));

    if words < MIN_POEM_WORDS || !relevant {
        info!(words, relevant, "rejected generated poem");
        return APOLOGY.to_string();
    }
    cleaned
}
