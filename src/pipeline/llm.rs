//! VLM interaction: send the diagnosis prompt plus the leaf photo.
//!
//! The request handler only sees the [`InferenceClient`] trait, so tests and
//! embedders can swap in their own implementation. The production client,
//! [`LlmInferenceClient`], drives any `edgequake-llm` provider (Gemini by
//! default).
//!
//! There is no retry loop here: one failed call fails the request, and the
//! HTTP caller decides whether to try again. Every call is bounded by
//! [`generate_with_timeout`].

use crate::config::ServiceConfig;
use crate::error::LeafScanError;
use crate::pipeline::decode::DecodedImage;
use crate::pipeline::encode::encode_blocking;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Anything that can answer a prompt about an image with free text.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run one prompt + image inference and return the model's raw text.
    async fn generate(&self, prompt: &str, image: &DecodedImage) -> Result<String, LeafScanError>;
}

/// [`InferenceClient`] backed by an `edgequake-llm` provider.
pub struct LlmInferenceClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmInferenceClient {
    /// Wrap a pre-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ServiceConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Create the configured provider.
    ///
    /// The provider factory reads the matching API key (`GEMINI_API_KEY`,
    /// `OPENAI_API_KEY`, …) from the environment.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, LeafScanError> {
        let provider = ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
            .map_err(|e| LeafScanError::ProviderNotConfigured {
                provider: config.provider_name.clone(),
                hint: format!(
                    "Set the API key for '{}' (e.g. GEMINI_API_KEY) in the environment or a .env file.\n\
                     Error: {e}",
                    config.provider_name
                ),
            })?;
        info!(
            "Using provider '{}' with model '{}'",
            config.provider_name, config.model
        );
        Ok(Self::new(provider, config))
    }
}

#[async_trait]
impl InferenceClient for LlmInferenceClient {
    async fn generate(&self, prompt: &str, image: &DecodedImage) -> Result<String, LeafScanError> {
        let image_data = encode_blocking(image).await?;

        let messages = vec![ChatMessage::user_with_images(prompt, vec![image_data])];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| LeafScanError::InferenceFailed {
                message: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Run `client.generate` with an upper bound on wall-clock time.
pub async fn generate_with_timeout(
    client: &dyn InferenceClient,
    prompt: &str,
    image: &DecodedImage,
    timeout: Duration,
) -> Result<String, LeafScanError> {
    let start = Instant::now();
    match tokio::time::timeout(timeout, client.generate(prompt, image)).await {
        Ok(result) => {
            debug!("Inference finished in {:?}", start.elapsed());
            result
        }
        Err(_) => Err(LeafScanError::InferenceTimeout {
            secs: timeout.as_secs(),
        }),
    }
}

/// Build `CompletionOptions` from the service config.
fn build_options(config: &ServiceConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
