//! Gemini (Google) image generation provider.

use crate::credentials::CredentialStore;
use crate::error::{OmniGenError, Result};
use crate::gemini::{GeminiClient, RequestContent};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, ImageFormat, ImageRequest};
use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use std::time::Instant;

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiImageModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    Flash,
    /// Gemini 3 Pro Image (highest quality).
    #[default]
    Pro,
}

impl GeminiImageModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash-image",
            Self::Pro => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for GeminiImageProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiImageProviderBuilder {
    api_key: Option<String>,
    credentials: Option<CredentialStore>,
    model: GeminiImageModel,
    base_url: Option<String>,
}

impl GeminiImageProviderBuilder {
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
    pub fn model(mut self, model: GeminiImageModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider.
    ///
    /// Without an explicit key or store, the key is taken from
    /// `GOOGLE_API_KEY` or `API_KEY`; a missing key only fails once a
    /// request is made.
    pub fn build(self) -> Result<GeminiImageProvider> {
        let credentials = match (self.api_key, self.credentials) {
            (Some(key), _) => CredentialStore::with_key(key)?,
            (None, Some(store)) => store,
            (None, None) => CredentialStore::from_env(),
        };

        Ok(GeminiImageProvider {
            client: GeminiClient::new(self.base_url, credentials),
            model: self.model,
        })
    }
}

/// Gemini image generation provider.
#[derive(Debug, Clone)]
pub struct GeminiImageProvider {
    client: GeminiClient,
    model: GeminiImageModel,
}

impl GeminiImageProvider {
    /// Creates a new `GeminiImageProviderBuilder`.
    pub fn builder() -> GeminiImageProviderBuilder {
        GeminiImageProviderBuilder::new()
    }

    /// Returns the model this provider calls.
    pub fn model(&self) -> GeminiImageModel {
        self.model
    }

    /// Returns the credential store this provider reads from.
    pub fn credentials(&self) -> &CredentialStore {
        self.client.credentials()
    }

    async fn generate_impl(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        request.validate()?;
        let start = Instant::now();

        let body = ImageGenerationBody::from_request(request);
        let candidate = self.client.generate_content(self.model.as_str(), &body).await?;

        if let Some(ref reason) = candidate.finish_reason {
            if matches!(reason.as_str(), "IMAGE_OTHER" | "NO_IMAGE") {
                return Err(OmniGenError::NoImageData(format!(
                    "Generation failed: {}. Try a different prompt.",
                    reason
                )));
            }
        }

        let inline_data = candidate
            .content
            .into_iter()
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or_else(|| {
                OmniGenError::NoImageData("No image data in Gemini response".into())
            })?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(&inline_data.data)
            .map_err(|e| OmniGenError::Decode(e.to_string()))?;

        let format = inline_data
            .mime_type
            .as_deref()
            .and_then(ImageFormat::from_mime_type)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .unwrap_or_default();

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            model = self.model.as_str(),
            aspect_ratio = %request.aspect_ratio,
            resolution = %request.resolution,
            bytes = data.len(),
            duration_ms,
            "Gemini image generation complete"
        );

        let mut image = GeneratedImage::new(data, format);
        image.model = Some(self.model.as_str().to_string());
        image.duration_ms = Some(duration_ms);
        Ok(image)
    }
}

#[async_trait]
impl ImageProvider for GeminiImageProvider {
    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini Image (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        self.client.health_check(self.model.as_str()).await
    }
}

// Request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationBody {
    contents: Vec<RequestContent>,
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
    image_size: &'static str,
}

impl ImageGenerationBody {
    fn from_request(req: &ImageRequest) -> Self {
        Self {
            contents: vec![RequestContent::text(req.prompt.clone())],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: req.aspect_ratio.as_str(),
                    image_size: req.resolution.as_str(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::{AspectRatio, ImageResolution};

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiImageModel::Flash.as_str(), "gemini-2.5-flash-image");
        assert_eq!(GeminiImageModel::Pro.as_str(), "gemini-3-pro-image-preview");
        assert_eq!(GeminiImageModel::default(), GeminiImageModel::Pro);
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let provider = GeminiImageProviderBuilder::new()
            .api_key("test-key")
            .model(GeminiImageModel::Flash)
            .build()
            .unwrap();
        assert!(provider.credentials().has_selected_key());
        assert_eq!(provider.model(), GeminiImageModel::Flash);
    }

    #[test]
    fn test_builder_rejects_blank_key() {
        assert!(GeminiImageProviderBuilder::new().api_key("").build().is_err());
    }

    #[test]
    fn test_builder_shares_credentials() {
        let store = CredentialStore::new();
        let provider = GeminiImageProvider::builder()
            .credentials(store.clone())
            .build()
            .unwrap();
        assert!(!provider.credentials().has_selected_key());
        store.select_key("late-key").unwrap();
        assert!(provider.credentials().has_selected_key());
    }

    #[test]
    fn test_request_body_shape() {
        let req = ImageRequest::new("bamboo cups on a desk")
            .with_aspect_ratio(AspectRatio::Portrait3x4)
            .with_resolution(ImageResolution::FourK);
        let json = serde_json::to_value(ImageGenerationBody::from_request(&req)).unwrap();

        assert_eq!(
            json["contents"][0]["parts"][0]["text"],
            "bamboo cups on a desk"
        );
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "3:4");
        assert_eq!(json["generationConfig"]["imageConfig"]["imageSize"], "4K");
        assert!(json.get("generation_config").is_none());
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected_before_request() {
        let provider = GeminiImageProvider::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let err = provider.generate(&ImageRequest::new("")).await.unwrap_err();
        assert!(matches!(err, OmniGenError::InvalidRequest(_)));
    }
}
