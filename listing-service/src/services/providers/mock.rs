//! Scripted provider for unit tests.

use super::{ChatMessage, FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays a queue of canned outcomes and records the parameters of every
/// call it receives.
pub struct MockTextProvider {
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, GenerationParams)>>,
}

impl MockTextProvider {
    pub fn new(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, GenerationParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), *params));

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::NotConfigured("script exhausted".into())));

        outcome.map(|text| ProviderResponse {
            text,
            input_tokens: 12,
            output_tokens: 34,
            finish_reason: FinishReason::Complete,
        })
    }

    fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn model(&self) -> &str {
        "mock"
    }
}
