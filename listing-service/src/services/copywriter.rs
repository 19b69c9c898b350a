//! Listing copy generation: prompt assembly and the three-variation run.

use crate::dtos::{FieldValue, GenerationRequest};
use crate::services::providers::{ChatMessage, GenerationParams, ProviderError, TextProvider};
use metrics::counter;
use std::fmt::Write as _;
use std::sync::Arc;

/// Number of variations returned per request.
pub const VARIATION_COUNT: usize = 3;

const SYSTEM_INSTRUCTION: &str = "You are an expert real estate copywriter. \
You write engaging, accurate marketing copy for property listings, tailored to the \
requested platform and tone. Only use the facts you are given; never invent \
features, prices or locations. Return only the copy itself, with no preamble.";

/// Sampling temperature for the `index`-th variation: 0.7, 0.8, 0.9.
pub fn variation_temperature(index: usize) -> f64 {
    (7 + index) as f64 / 10.0
}

/// The two instructions sent with every variation.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPrompt {
    pub system: String,
    pub user: String,
}

impl ListingPrompt {
    pub fn from_request(req: &GenerationRequest) -> Self {
        let platform = text(&req.platform).unwrap_or("social media");
        let mut user = format!(
            "Write a compelling {} post for the following property listing.\n",
            platform
        );

        push_line(&mut user, "Tone", text(&req.tone));
        push_line(&mut user, "Property type", text(&req.property_type));
        push_line(&mut user, "Address", text(&req.address));
        push_value(&mut user, "Price", &req.price);
        push_value(&mut user, "Bedrooms", &req.bedrooms);
        push_value(&mut user, "Bathrooms", &req.bathrooms);
        push_value(&mut user, "Square feet", &req.square_feet);
        push_value(&mut user, "Lot size", &req.lot_size);
        push_value(&mut user, "Year built", &req.year_built);
        push_line(&mut user, "Key features", text(&req.features));
        push_line(&mut user, "Neighborhood", text(&req.neighborhood));
        push_line(&mut user, "Target audience", text(&req.target_audience));
        push_line(&mut user, "Call to action", text(&req.call_to_action));
        push_line(&mut user, "Additional details", text(&req.additional_details));

        match req.include_hashtags {
            Some(true) => user.push_str("Include relevant hashtags.\n"),
            Some(false) => user.push_str("Do not include hashtags.\n"),
            None => {}
        }
        match req.include_emojis {
            Some(true) => user.push_str("Use emojis where they fit naturally.\n"),
            Some(false) => user.push_str("Do not use emojis.\n"),
            None => {}
        }

        Self {
            system: SYSTEM_INSTRUCTION.to_string(),
            user: user.trim_end().to_string(),
        }
    }

    pub fn messages(&self) -> [ChatMessage; 2] {
        [
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

fn text(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn push_line(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = writeln!(out, "{}: {}", label, value);
    }
}

fn push_value(out: &mut String, label: &str, value: &Option<FieldValue>) {
    if let Some(value) = value.as_ref().filter(|v| !v.is_blank()) {
        let _ = writeln!(out, "{}: {}", label, value);
    }
}

/// Generates listing copy through a `TextProvider`.
#[derive(Clone)]
pub struct Copywriter {
    provider: Arc<dyn TextProvider>,
    max_tokens: u32,
}

impl Copywriter {
    pub fn new(provider: Arc<dyn TextProvider>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }

    pub fn provider(&self) -> &Arc<dyn TextProvider> {
        &self.provider
    }

    /// Produce `VARIATION_COUNT` variations, one call at a time with rising
    /// temperature. The first failed call aborts the run; nothing partial is
    /// returned and no later call is made.
    pub async fn generate_variations(
        &self,
        req: &GenerationRequest,
    ) -> Result<Vec<String>, ProviderError> {
        let prompt = ListingPrompt::from_request(req);
        let messages = prompt.messages();
        let mut variations = Vec::with_capacity(VARIATION_COUNT);

        for index in 0..VARIATION_COUNT {
            let params = GenerationParams {
                temperature: variation_temperature(index),
                max_tokens: self.max_tokens,
            };

            let outcome = self
                .provider
                .generate(&messages, &params)
                .await
                .and_then(|response| {
                    if response.text.trim().is_empty() {
                        Err(ProviderError::EmptyCompletion)
                    } else {
                        Ok(response)
                    }
                });

            let response = match outcome {
                Ok(response) => response,
                Err(e) => {
                    counter!("copy_generation_calls_total", "outcome" => "error").increment(1);
                    tracing::warn!(
                        variation = index,
                        temperature = params.temperature,
                        error = %e,
                        "Copy generation call failed, aborting"
                    );
                    return Err(e);
                }
            };

            counter!("copy_generation_calls_total", "outcome" => "success").increment(1);
            counter!("copy_generation_tokens_total", "type" => "input")
                .increment(u64::from(response.input_tokens));
            counter!("copy_generation_tokens_total", "type" => "output")
                .increment(u64::from(response.output_tokens));

            tracing::debug!(
                variation = index,
                temperature = params.temperature,
                finish_reason = ?response.finish_reason,
                "Variation generated"
            );
            variations.push(response.text.trim().to_string());
        }

        Ok(variations)
    }
}
