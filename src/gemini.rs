//! Transport shared by the Gemini text and image providers.

use crate::credentials::CredentialStore;
use crate::error::{parse_retry_after, sanitize_error_message, OmniGenError, Result};
use serde::{Deserialize, Serialize};

/// Public endpoint of the Gemini Developer API.
pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Finish reasons that mean a safety filter withheld the output.
const BLOCKING_FINISH_REASONS: [&str; 7] = [
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

/// Low-level `generateContent` client.
#[derive(Debug, Clone)]
pub(crate) struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialStore,
}

impl GeminiClient {
    pub(crate) fn new(base_url: Option<String>, credentials: CredentialStore) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            credentials,
        }
    }

    pub(crate) fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}", self.base_url, model)
    }

    /// Posts `body` to `model:generateContent` and returns the first
    /// candidate, after rejecting blocked prompts and safety stops.
    pub(crate) async fn generate_content<B: Serialize + ?Sized>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<Candidate> {
        // Fails before any I/O when no key is selected.
        let api_key = self.credentials.current()?;
        let url = format!("{}:generateContent", self.model_url(model));

        tracing::debug!(model, "sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let response: GenerateContentResponse = response.json().await?;

        // Blocked prompts come back as HTTP 200 with prompt feedback.
        if let Some(ref feedback) = response.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(OmniGenError::ContentBlocked(msg));
            }
        }

        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            OmniGenError::UnexpectedResponse("No candidates in Gemini response".into())
        })?;

        if let Some(ref reason) = candidate.finish_reason {
            if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) {
                return Err(OmniGenError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    reason
                )));
            }
        }

        Ok(candidate)
    }

    /// Fetches model metadata to confirm the key and model name work.
    pub(crate) async fn health_check(&self, model: &str) -> Result<()> {
        let api_key = self.credentials.current()?;
        let response = self
            .http
            .get(self.model_url(model))
            .header("x-goog-api-key", api_key.expose())
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(OmniGenError::Auth("Invalid API key".into())),
            404 => Err(OmniGenError::InvalidRequest(format!(
                "Model '{}' not found",
                model
            ))),
            s if !(200..300).contains(&s) => Err(OmniGenError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Maps a non-success HTTP response onto an error variant.
pub(crate) fn parse_error(
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> OmniGenError {
    let text = sanitize_error_message(text);
    match status {
        402 => {
            return OmniGenError::Billing(
                "Gemini billing issue: enable billing at https://aistudio.google.com".into(),
            )
        }
        404 => {
            return OmniGenError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )
        }
        429 => {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            return OmniGenError::RateLimited { retry_after };
        }
        401 | 403 => return OmniGenError::Auth(text),
        _ => {}
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return OmniGenError::ContentBlocked(text);
    }
    OmniGenError::Api {
        status,
        message: text,
    }
}

// Request types

#[derive(Debug, Serialize)]
pub(crate) struct RequestContent {
    pub(crate) parts: Vec<TextPart>,
}

impl RequestContent {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TextPart {
    pub(crate) text: String,
}

// Response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<ResponseContent>,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

impl Candidate {
    /// Concatenated answer text, skipping thought summaries.
    pub(crate) fn text(&self) -> String {
        self.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
    #[serde(default)]
    pub(crate) block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseContent {
    #[serde(default)]
    pub(crate) parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponsePart {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) inline_data: Option<InlineData>,
    #[serde(default)]
    pub(crate) thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    #[serde(default)]
    pub(crate) mime_type: Option<String>,
    pub(crate) data: String,
}
