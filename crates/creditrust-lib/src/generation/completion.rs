use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{Generate, GenerationFailure, GenerationOptions, SamplingMode};

/// Temperature sent for stochastic sampling.
const SAMPLING_TEMPERATURE: f32 = 1.0;

/// Client for an OpenAI-compatible text completions endpoint, such as a
/// llama.cpp or vLLM server hosting the generation model.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    endpoint: Url,
    api_key: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

impl CompletionClient {
    /// Create a client without a request timeout; a slow generation blocks
    /// the caller until it finishes or fails.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            api_key: None,
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build()
            .into();
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Generate for CompletionClient {
    fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationFailure> {
        let body = request_body(prompt, options)?;

        debug!(
            endpoint = %self.endpoint,
            model = %options.model,
            prompt_len = prompt.len(),
            max_new_tokens = options.max_new_tokens,
            sampling = ?options.sampling,
            "Requesting completion"
        );

        let mut request = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response_text = request
            .send(&body)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| GenerationFailure::new(format!("completion request failed: {e}")))?;

        parse_completion(&response_text)
    }
}

fn request_body(prompt: &str, options: &GenerationOptions) -> Result<String, GenerationFailure> {
    let temperature = match options.sampling {
        SamplingMode::Stochastic => SAMPLING_TEMPERATURE,
        SamplingMode::Deterministic => 0.0,
    };
    serde_json::to_string(&CompletionRequest {
        model: &options.model,
        prompt,
        max_tokens: options.max_new_tokens,
        temperature,
    })
    .map_err(|e| GenerationFailure::new(format!("failed to encode completion request: {e}")))
}

fn parse_completion(response_text: &str) -> Result<String, GenerationFailure> {
    let response: CompletionResponse = serde_json::from_str(response_text)
        .map_err(|e| GenerationFailure::new(format!("malformed completion response: {e}")))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| GenerationFailure::new("completion response contained no choices"))
}
