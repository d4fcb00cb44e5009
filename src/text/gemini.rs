//! Gemini (Google) structured text provider.

use crate::credentials::CredentialStore;
use crate::error::{OmniGenError, Result};
use crate::gemini::{GeminiClient, RequestContent};
use crate::social::{GeneratedContent, Platform, Tone};
use crate::text::provider::TextProvider;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

/// Token budget for the model's reasoning before it writes the copy.
const THINKING_BUDGET: u32 = 1024;

/// Gemini text model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiTextModel {
    /// Gemini 2.5 Flash.
    Flash,
    /// Gemini 3 Pro.
    #[default]
    Pro,
}

impl GeminiTextModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash",
            Self::Pro => "gemini-3-pro-preview",
        }
    }
}

/// Builder for GeminiTextProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiTextProviderBuilder {
    api_key: Option<String>,
    credentials: Option<CredentialStore>,
    model: GeminiTextModel,
    base_url: Option<String>,
}

impl GeminiTextProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fixed API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Shares a credential store; the key is read on every request.
    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiTextModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider. Key resolution matches
    /// [`GeminiImageProviderBuilder::build`](crate::image::GeminiImageProviderBuilder::build).
    pub fn build(self) -> Result<GeminiTextProvider> {
        let credentials = match (self.api_key, self.credentials) {
            (Some(key), _) => CredentialStore::with_key(key)?,
            (None, Some(store)) => store,
            (None, None) => CredentialStore::from_env(),
        };

        Ok(GeminiTextProvider {
            client: GeminiClient::new(self.base_url, credentials),
            model: self.model,
        })
    }
}

/// Gemini provider producing structured social copy.
#[derive(Debug, Clone)]
pub struct GeminiTextProvider {
    client: GeminiClient,
    model: GeminiTextModel,
}

impl GeminiTextProvider {
    /// Creates a new `GeminiTextProviderBuilder`.
    pub fn builder() -> GeminiTextProviderBuilder {
        GeminiTextProviderBuilder::new()
    }

    /// Returns the model this provider calls.
    pub fn model(&self) -> GeminiTextModel {
        self.model
    }

    /// Returns the credential store this provider reads from.
    pub fn credentials(&self) -> &CredentialStore {
        self.client.credentials()
    }

    async fn generate_impl(&self, idea: &str, tone: Tone) -> Result<GeneratedContent> {
        if idea.trim().is_empty() {
            return Err(OmniGenError::InvalidRequest("idea must not be empty".into()));
        }
        let start = Instant::now();

        let body = TextGenerationBody::new(idea, tone);
        let candidate = self.client.generate_content(self.model.as_str(), &body).await?;

        let text = candidate.text();
        if text.trim().is_empty() {
            return Err(OmniGenError::Parse("No text returned from Gemini".into()));
        }

        let content = GeneratedContent::from_json(&text)?;
        tracing::debug!(
            model = self.model.as_str(),
            %tone,
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini text generation complete"
        );
        Ok(content)
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(&self, idea: &str, tone: Tone) -> Result<GeneratedContent> {
        self.generate_impl(idea, tone).await
    }

    fn name(&self) -> &str {
        "Gemini Text (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        self.client.health_check(self.model.as_str()).await
    }
}

/// Builds the instruction sent to the text model.
fn build_prompt(idea: &str, tone: Tone) -> String {
    format!(
        "You are a world-class social media manager.\n\
         Generate 3 distinct social media posts based on the following idea: \"{idea}\".\n\
         \n\
         Tone: {tone}.\n\
         \n\
         1. LinkedIn: Long-form, professional, insightful.\n\
         2. Twitter/X: Short, punchy, under 280 chars, engaging.\n\
         3. Instagram: Visual-focused caption, engaging hook, 15-20 relevant hashtags.\n\
         \n\
         For each platform, also write a highly detailed, creative image generation prompt \
         that captures the essence of the post and fits the platform's aesthetic.",
        idea = idea.trim(),
        tone = tone,
    )
}

/// JSON schema the model's answer must follow.
fn response_schema() -> Value {
    let post = json!({
        "type": "OBJECT",
        "properties": {
            "text": {
                "type": "STRING",
                "description": "The post text content."
            },
            "imagePrompt": {
                "type": "STRING",
                "description": "A detailed visual description for an image generator."
            }
        },
        "required": ["text", "imagePrompt"]
    });

    let mut properties = serde_json::Map::new();
    for platform in Platform::ALL {
        properties.insert(platform.key().to_string(), post.clone());
    }
    let required: Vec<&str> = Platform::ALL.iter().map(|p| p.key()).collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required
    })
}

// Request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextGenerationBody {
    contents: Vec<RequestContent>,
    generation_config: TextGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextGenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl TextGenerationBody {
    fn new(idea: &str, tone: Tone) -> Self {
        Self {
            contents: vec![RequestContent::text(build_prompt(idea, tone))],
            generation_config: TextGenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
                thinking_config: ThinkingConfig {
                    thinking_budget: THINKING_BUDGET,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_text_model_as_str() {
        assert_eq!(GeminiTextModel::Flash.as_str(), "gemini-2.5-flash");
        assert_eq!(GeminiTextModel::Pro.as_str(), "gemini-3-pro-preview");
        assert_eq!(GeminiTextModel::default(), GeminiTextModel::Pro);
    }

    #[test]
    fn test_prompt_mentions_idea_tone_and_platforms() {
        let prompt = build_prompt("  launching bamboo coffee cups ", Tone::Witty);
        assert!(prompt.contains("\"launching bamboo coffee cups\""));
        assert!(prompt.contains("Tone: Witty."));
        assert!(prompt.contains("LinkedIn"));
        assert!(prompt.contains("under 280 chars"));
        assert!(prompt.contains("hashtags"));
    }

    #[test]
    fn test_schema_requires_every_platform_and_field() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["linkedin", "twitter", "instagram"]);

        for key in required {
            let fields = &schema["properties"][key]["required"];
            assert_eq!(fields, &json!(["text", "imagePrompt"]));
        }
    }

    #[test]
    fn test_request_body_shape() {
        let json = serde_json::to_value(TextGenerationBody::new("idea", Tone::Urgent)).unwrap();
        let config = &json["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["thinkingConfig"]["thinkingBudget"], 1024);
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        assert!(json["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Tone: Urgent."));
    }

    #[tokio::test]
    async fn test_empty_idea_rejected() {
        let provider = GeminiTextProvider::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let err = provider.generate("   ", Tone::Casual).await.unwrap_err();
        assert!(matches!(err, OmniGenError::InvalidRequest(_)));
    }
}
