//! Shared scripted `LLMProvider` test double for the end-to-end scenarios.

use async_trait::async_trait;
use delegation_fabric::llm::{GenerationResult, LLMProvider, ProviderDescriptor, Usage};
use delegation_fabric::error::LlmError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns `responses[call_index % responses.len()]` on each `generate`
/// call, so a single provider can script a whole multi-call pipeline
/// (analyze_and_plan, delegate, assemble_and_polish, ...) without caring
/// which operation label is in flight.
pub struct ScriptedProvider {
    responses: Vec<String>,
    calls: AtomicUsize,
    pub prompts_seen: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            calls: AtomicUsize::new(0),
            prompts_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(response: &str) -> Self {
        Self::new(vec![response])
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _system: Option<&str>,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<GenerationResult, LlmError> {
        self.prompts_seen.lock().unwrap().push(prompt.to_string());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.responses[call % self.responses.len()].clone();
        Ok(GenerationResult { text, usage: Usage { input_tokens: 50, output_tokens: 50 } })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn priced_descriptor(name: &str) -> ProviderDescriptor {
    ProviderDescriptor {
        name: name.to_string(),
        default_model: "m".to_string(),
        input_price_per_token: 0.00001,
        output_price_per_token: 0.00002,
        max_output_tokens: 2048,
        auth_env_names: vec![],
    }
}
