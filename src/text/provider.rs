//! Text provider trait.

use crate::error::Result;
use crate::social::{GeneratedContent, Tone};
use async_trait::async_trait;

/// Trait for services that turn one idea into copy for every platform.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generates a post and an image prompt per platform for `idea`.
    ///
    /// Malformed structured output is an error, never a default. One attempt
    /// per call.
    async fn generate(&self, idea: &str, tone: Tone) -> Result<GeneratedContent>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
