use std::num::NonZeroU32;
use std::sync::Mutex;

use llama_cpp_2::{
    context::params::LlamaContextParams,
    llama_backend::LlamaBackend,
    llama_batch::LlamaBatch,
    model::{params::LlamaModelParams, AddBos, LlamaModel, Special},
    sampling::LlamaSampler,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Generation cap applied to every request.
pub const MAX_GENERATION_TOKENS: usize = 150;

/// Seam between the request handler and the model: turns a prompt into
/// decoded text with special tokens stripped.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;
}

// The backend and model live behind one mutex: llama.cpp contexts are not
// shareable across threads, so a single generation holds the guard at a time.
struct LoadedModel {
    backend: LlamaBackend,
    model: LlamaModel,
}

pub struct LlamaGenerator {
    inner: Mutex<LoadedModel>,
    context_size: usize,
    batch_size: usize,
}

impl LlamaGenerator {
    /// Loads the GGUF model once; the handle is shared read-only afterwards.
    pub fn load(config: &Config) -> Result<Self> {
        let backend = LlamaBackend::init()
            .map_err(|e| AppError::ModelError(format!("Failed to initialize backend: {:?}", e)))?;

        let model_params = LlamaModelParams::default().with_n_gpu_layers(config.gpu_layers);

        let model = LlamaModel::load_from_file(&backend, &config.model_path, &model_params)
            .map_err(|e| AppError::ModelError(format!("Failed to load model: {:?}", e)))?;

        info!(path = %config.model_path.display(), "Model loaded");

        Ok(Self {
            inner: Mutex::new(LoadedModel { backend, model }),
            context_size: config.context_size,
            batch_size: config.batch_size,
        })
    }
}

/// Removes characters that break C string handling in the tokenizer.
/// Fetched web bodies can carry null bytes and stray control characters.
fn sanitize_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .filter(|c| *c != '\0' && (*c >= ' ' || *c == '\t' || *c == '\n' || *c == '\r'))
        .collect()
}

impl TextGenerator for LlamaGenerator {
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let guard = self.inner.lock().unwrap();

        let sanitized = sanitize_prompt(prompt);
        let prompt_tokens = guard
            .model
            .str_to_token(&sanitized, AddBos::Always)
            .map_err(|e| AppError::GenerationError(format!("Failed to tokenize: {:?}", e)))?;

        if prompt_tokens.len() + max_tokens > self.context_size {
            return Err(AppError::GenerationError(format!(
                "Prompt of {} tokens does not fit a context of {}",
                prompt_tokens.len(),
                self.context_size
            )));
        }

        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.context_size as u32))
            .with_n_batch(self.batch_size as u32);

        let mut context = guard
            .model
            .new_context(&guard.backend, ctx_params)
            .map_err(|e| AppError::GenerationError(format!("Failed to create context: {:?}", e)))?;

        // Feed the whole prompt in one batch; only the last token needs logits.
        let mut batch = LlamaBatch::new(self.batch_size, 1);
        for (i, &token) in prompt_tokens.iter().enumerate() {
            let is_last = i == prompt_tokens.len() - 1;
            batch
                .add(token, i as i32, &[0], is_last)
                .map_err(|e| AppError::GenerationError(format!("Failed to add token to batch: {:?}", e)))?;
        }
        context
            .decode(&mut batch)
            .map_err(|e| AppError::GenerationError(format!("Decode failed: {:?}", e)))?;

        let eos_token = guard.model.token_eos();
        let mut sampler = LlamaSampler::greedy();
        let mut output = String::new();
        let mut n_cur = prompt_tokens.len();

        while n_cur < prompt_tokens.len() + max_tokens {
            let new_token_id = sampler.sample(&context, -1);

            if new_token_id == eos_token {
                break;
            }

            // Pieces that are not valid UTF-8 are dropped from the output but
            // still fed back so the model state advances.
            if let Ok(piece) = guard.model.token_to_str(new_token_id, Special::Plaintext) {
                output.push_str(&piece);
            }

            batch.clear();
            batch
                .add(new_token_id, n_cur as i32, &[0], true)
                .map_err(|e| AppError::GenerationError(format!("Failed to add token: {:?}", e)))?;
            context
                .decode(&mut batch)
                .map_err(|e| AppError::GenerationError(format!("Decode failed: {:?}", e)))?;

            n_cur += 1;
        }

        debug!(
            tokens = n_cur - prompt_tokens.len(),
            chars = output.len(),
            "Generation finished"
        );

        Ok(output)
    }
}
