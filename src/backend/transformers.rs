//! Hugging Face `transformers` models driven through the embedded Python interpreter.
use pyo3::{
    exceptions::PyKeyError,
    prelude::*,
    types::PyDict,
};
use tracing::{debug, info};

use crate::error::{PoetryError, Result};
use crate::generation::{GenerationParameters, TextGenerator, TokenId};

/// Loads tokenizer and weights, and defines the `generate` helper used below.
const LOAD_SCRIPT: &str = r#"
import torch
from transformers import AutoModelForCausalLM, AutoTokenizer

tokenizer = AutoTokenizer.from_pretrained(model_name)
model = AutoModelForCausalLM.from_pretrained(model_name)
device = "cuda" if use_cuda and torch.cuda.is_available() else "cpu"
model.to(device)
model.eval()

def generate(input_ids, options):
    inputs = torch.tensor([input_ids], device=device)
    with torch.no_grad():
        outputs = model.generate(
            inputs,
            pad_token_id=tokenizer.eos_token_id,
            **options,
        )
    return outputs[0].tolist()
"#;

/// A causal language model plus its tokenizer, equivalent to
/// `AutoModelForCausalLM` / `AutoTokenizer` loaded from the same name.
#[derive(Debug)]
pub struct TransformersGenerator {
    model_name: String,
    namespace: Py<PyDict>,
    eos_token: Option<String>,
}

impl TransformersGenerator {
    /// Load `model_name` from the Hugging Face hub (or the local cache).
    ///
    /// This is NOT cheap: the first run downloads the weights, and every run
    /// keeps them resident until the generator is dropped.
    pub fn new(model_name: &str, use_cuda: bool) -> Result<Self> {
        info!(model = model_name, use_cuda, "loading transformers model");
        Python::with_gil(|py| -> Result<Self> {
            let globals = PyDict::new(py);
            globals.set_item("model_name", model_name)?;
            globals.set_item("use_cuda", use_cuda)?;
            py.run(LOAD_SCRIPT, Some(globals), Some(globals))
                .map_err(|err| PoetryError::ModelLoad {
                    message: format!("{model_name}: {}", describe(py, &err)),
                })?;

            let eos_token = namespace_item(globals, "tokenizer")?
                .getattr("eos_token")?
                .extract::<Option<String>>()?;

            Ok(TransformersGenerator {
                model_name: model_name.to_string(),
                namespace: globals.into(),
                eos_token,
            })
        })
    }

    fn lookup<'py>(&'py self, py: Python<'py>, name: &str) -> PyResult<&'py PyAny> {
        namespace_item(self.namespace.as_ref(py), name)
    }
}

impl TextGenerator for TransformersGenerator {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        with_traceback(
            |py| {
                self.lookup(py, "tokenizer")?
                    .call_method1("encode", (text,))?
                    .extract()
            },
            |message| PoetryError::Tokenization { message },
        )
    }

    fn generate(
        &self,
        input: &[TokenId],
        parameters: &GenerationParameters,
    ) -> Result<Vec<TokenId>> {
        debug!(model = %self.model_name, prompt_tokens = input.len(), "transformers generate");
        let output: Vec<TokenId> = with_traceback(
            |py| {
                let options = generate_options(py, parameters)?;
                self.lookup(py, "generate")?
                    .call1((input.to_vec(), options))?
                    .extract()
            },
            |message| PoetryError::inference(format!("{}: {message}", self.model_name)),
        )?;
        debug!(
            model = %self.model_name,
            new_tokens = output.len().saturating_sub(input.len()),
            "transformers generate finished"
        );
        Ok(output)
    }

    fn decode(&self, tokens: &[TokenId], skip_special_tokens: bool) -> Result<String> {
        with_traceback(
            |py| {
                let options = PyDict::new(py);
                options.set_item("skip_special_tokens", skip_special_tokens)?;
                self.lookup(py, "tokenizer")?
                    .call_method("decode", (tokens.to_vec(),), Some(options))?
                    .extract()
            },
            |message| PoetryError::Tokenization { message },
        )
    }

    fn eos_token(&self) -> Option<&str> {
        self.eos_token.as_deref()
    }
}

/// Keyword arguments for `model.generate`. Unset knobs are left out so the
/// model's own defaults apply.
fn generate_options<'py>(
    py: Python<'py>,
    parameters: &GenerationParameters,
) -> PyResult<&'py PyDict> {
    let options = PyDict::new(py);
    if let Some(max_length) = parameters.max_length {
        options.set_item("max_length", max_length)?;
    }
    if let Some(max_new_tokens) = parameters.max_new_tokens {
        options.set_item("max_new_tokens", max_new_tokens)?;
    }
    options.set_item("do_sample", parameters.do_sample)?;
    options.set_item("temperature", parameters.temperature)?;
    options.set_item("top_p", parameters.top_p)?;
    if let Some(top_k) = parameters.top_k {
        options.set_item("top_k", top_k)?;
    }
    if let Some(size) = parameters.no_repeat_ngram_size {
        options.set_item("no_repeat_ngram_size", size)?;
    }
    if let Some(penalty) = parameters.repetition_penalty {
        options.set_item("repetition_penalty", penalty)?;
    }
    options.set_item("num_beams", parameters.num_beams)?;
    options.set_item("num_return_sequences", parameters.num_return_sequences)?;
    options.set_item("early_stopping", parameters.early_stopping)?;
    Ok(options)
}

/// Run `call` under the GIL, turning a Python exception into a crate error
/// that carries the formatted traceback.
fn with_traceback<T>(
    call: impl FnOnce(Python<'_>) -> PyResult<T>,
    wrap: impl FnOnce(String) -> PoetryError,
) -> Result<T> {
    Python::with_gil(|py| call(py).map_err(|err| wrap(describe(py, &err))))
}

fn namespace_item<'py>(namespace: &'py PyDict, name: &str) -> PyResult<&'py PyAny> {
    namespace
        .get_item(name)?
        .ok_or_else(|| PyKeyError::new_err(name.to_string()))
}

/// Error text with the Python traceback attached, when there is one.
fn describe(py: Python<'_>, err: &PyErr) -> String {
    match err.traceback(py).and_then(|trace| trace.format().ok()) {
        Some(trace) => format!("{err}: {trace}"),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option<'py>(options: &'py PyDict, key: &str) -> Option<&'py PyAny> {
        options.get_item(key).unwrap()
    }

    #[test]
    fn chat_options_leave_unset_knobs_out() {
        Python::with_gil(|py| {
            let options = generate_options(py, &GenerationParameters::chat(1000)).unwrap();
            assert_eq!(option(options, "max_length").unwrap().extract::<usize>().unwrap(), 1000);
            assert_eq!(option(options, "top_k").unwrap().extract::<usize>().unwrap(), 100);
            assert_eq!(
                option(options, "no_repeat_ngram_size").unwrap().extract::<usize>().unwrap(),
                3
            );
            assert!(option(options, "do_sample").unwrap().extract::<bool>().unwrap());
            assert!(option(options, "repetition_penalty").is_none());
            assert!(option(options, "max_new_tokens").is_none());
        });
    }

    #[test]
    fn poem_options_enable_beam_search() {
        Python::with_gil(|py| {
            let options = generate_options(py, &GenerationParameters::poem(100)).unwrap();
            assert_eq!(option(options, "max_new_tokens").unwrap().extract::<usize>().unwrap(), 60);
            assert_eq!(option(options, "max_length").unwrap().extract::<usize>().unwrap(), 100);
            assert_eq!(option(options, "num_beams").unwrap().extract::<usize>().unwrap(), 5);
            assert!(option(options, "early_stopping").unwrap().extract::<bool>().unwrap());
            let penalty = option(options, "repetition_penalty").unwrap().extract::<f32>().unwrap();
            assert!((penalty - 1.5).abs() < 1e-6);
            let top_p = option(options, "top_p").unwrap().extract::<f32>().unwrap();
            assert!((top_p - 0.92).abs() < 1e-6);
            assert!(option(options, "top_k").is_none());
        });
    }

    #[test]
    fn options_use_generate_keyword_names() {
        Python::with_gil(|py| {
            let options = generate_options(py, &GenerationParameters::poem(100)).unwrap();
            let mut keys: Vec<String> = options
                .keys()
                .iter()
                .map(|key| key.extract::<String>().unwrap())
                .collect();
            keys.sort();
            assert_eq!(
                keys,
                [
                    "do_sample",
                    "early_stopping",
                    "max_length",
                    "max_new_tokens",
                    "no_repeat_ngram_size",
                    "num_beams",
                    "num_return_sequences",
                    "repetition_penalty",
                    "temperature",
                    "top_p",
                ]
            );
        });
    }

    #[test]
    fn python_failure_keeps_the_traceback() {
        let err = with_traceback(
            |py| -> PyResult<()> { py.run("raise ValueError('tokenizer exploded')", None, None) },
            |message| PoetryError::Tokenization { message },
        )
        .unwrap_err();
        match err {
            PoetryError::Tokenization { message } => {
                assert!(message.contains("tokenizer exploded"));
                assert!(message.contains("Traceback"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
