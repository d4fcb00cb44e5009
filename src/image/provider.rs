//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, ImageRequest};
use async_trait::async_trait;

/// Trait for image generation services.
///
/// One call produces exactly one image. Implementations make a single
/// attempt; callers decide whether to try again.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates an image from the given request.
    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
