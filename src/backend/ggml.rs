//! GGML weights run natively through rustformers `llm`.
use std::convert::Infallible;
use std::path::Path;

use llm::{
    samplers, InferenceFeedback, InferenceParameters, InferenceRequest, KnownModel,
    ModelParameters, OutputRequest, Prompt, TokenizerSource,
};
use tracing::{debug, info};

use crate::error::{PoetryError, Result};
use crate::generation::{GenerationParameters, TextGenerator, TokenId};

pub struct GgmlGenerator<M: KnownModel> {
    llm: M,
    eos_token: String,
}

impl<M: KnownModel> GgmlGenerator<M> {
    pub fn load(model_path: &Path, use_gpu: bool) -> Result<Self> {
        info!(path = %model_path.display(), use_gpu, "loading ggml model");
        let llm = llm::load::<M>(
            model_path,
            TokenizerSource::Embedded,
            ModelParameters {
                use_gpu,
                ..Default::default()
            },
            llm::load_progress_callback_stdout,
        )?;
        let eos = llm.tokenizer().token(llm.eot_token_id() as usize);
        let eos_token = String::from_utf8_lossy(&eos).into_owned();
        Ok(GgmlGenerator { llm, eos_token })
    }
}

impl<M: KnownModel> TextGenerator for GgmlGenerator<M> {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        let tokens = self.llm.tokenizer().tokenize(text, false)?;
        Ok(tokens.into_iter().map(|(_, id)| id).collect())
    }

    fn generate(
        &self,
        input: &[TokenId],
        parameters: &GenerationParameters,
    ) -> Result<Vec<TokenId>> {
        let ignored = unsupported_options(parameters);
        if !ignored.is_empty() {
            debug!(?ignored, "decoding options not supported by ggml");
        }
        let budget = parameters.new_token_budget(input.len());
        let sampler = samplers::build_sampler(
            self.llm.tokenizer().len(),
            &[],
            &sampler_args(parameters),
        )
        .map_err(|err| PoetryError::inference(err.to_string()))?;
        let inference_parameters = InferenceParameters {
            sampler,
            ..Default::default()
        };

        let mut session = self.llm.start_session(Default::default());
        let stats = session.infer::<Infallible>(
            &self.llm,
            &mut rand::thread_rng(),
            &InferenceRequest {
                prompt: Prompt::Tokens(input),
                parameters: &inference_parameters,
                play_back_previous_tokens: false,
                maximum_token_count: Some(budget),
            },
            &mut OutputRequest::default(),
            |_| Ok(InferenceFeedback::Continue),
        )?;
        debug!(budget, ?stats, "ggml inference finished");
        Ok(session.tokens().to_vec())
    }

    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String> {
        let bytes = self
            .llm
            .tokenizer()
            .decode(tokens.to_vec(), skip_special_tokens);
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn eos_token(&self) -> Option<&str> {
        Some(&self.eos_token)
    }
}

/// Knobs the `llm` sampler chain has no equivalent for.
fn unsupported_options(parameters: &GenerationParameters) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    if parameters.num_beams > 1 {
        ignored.push("num_beams");
    }
    if parameters.no_repeat_ngram_size.is_some() {
        ignored.push("no_repeat_ngram_size");
    }
    if parameters.early_stopping {
        ignored.push("early_stopping");
    }
    ignored
}

/// Sampler chain description in the `name:key=value` form `llm` parses.
fn sampler_args(parameters: &GenerationParameters) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(penalty) = parameters.repetition_penalty {
        args.push(format!("repetition:penalty={penalty}"));
    }
    if let Some(k) = parameters.top_k {
        args.push(format!("topk:k={k}"));
    }
    args.push(format!("topp:p={}", parameters.top_p));
    let temperature = if parameters.do_sample {
        parameters.temperature
    } else {
        0.0
    };
    args.push(format!("temperature:temperature={temperature}"));
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_options_per_preset() {
        assert_eq!(
            unsupported_options(&GenerationParameters::chat(1000)),
            ["no_repeat_ngram_size"]
        );
        assert_eq!(
            unsupported_options(&GenerationParameters::poem(100)),
            ["num_beams", "no_repeat_ngram_size", "early_stopping"]
        );
    }

    #[test]
    fn chat_sampler_chain() {
        let args = sampler_args(&GenerationParameters::chat(1000));
        assert_eq!(
            args,
            vec!["topk:k=100", "topp:p=0.7", "temperature:temperature=0.8"]
        );
    }

    #[test]
    fn poem_sampler_chain_penalizes_repetition() {
        let args = sampler_args(&GenerationParameters::poem(100));
        assert_eq!(
            args,
            vec![
                "repetition:penalty=1.5",
                "topp:p=0.92",
                "temperature:temperature=0.8",
            ]
        );
    }
}
