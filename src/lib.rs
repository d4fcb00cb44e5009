#![warn(missing_docs)]
//! OmniGen - one idea, three social posts, matching AI imagery.
//!
//! A text model turns a content idea into tailored copy for LinkedIn,
//! X/Twitter and Instagram, each with an image prompt; an image model then
//! renders one picture per post. The [`Orchestrator`] sequences both phases,
//! tracks per-post loading state, and regenerates single images on demand.
//!
//! # Quick Start
//!
//! ```no_run
//! use omnigen::{
//!     CredentialStore, GeminiImageProvider, GeminiTextProvider, GenerationSettings,
//!     Orchestrator, Tone,
//! };
//!
//! #[tokio::main]
//! async fn main() -> omnigen::Result<()> {
//!     let credentials = CredentialStore::from_env();
//!     let text = GeminiTextProvider::builder()
//!         .credentials(credentials.clone())
//!         .build()?;
//!     let images = GeminiImageProvider::builder()
//!         .credentials(credentials)
//!         .build()?;
//!
//!     let orchestrator = Orchestrator::new(text, images)
//!         .with_settings(GenerationSettings::default().with_tone(Tone::Witty));
//!
//!     let outcome = orchestrator.generate("launching bamboo coffee cups").await?;
//!     for post in outcome.posts() {
//!         println!("{} ({}): {}", post.platform, post.aspect_ratio, post.text_body);
//!     }
//!
//!     // Not happy with the Instagram picture? Try again.
//!     orchestrator.regenerate_image(2).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod gemini;

pub mod credentials;
pub mod image;
pub mod orchestrator;
pub mod social;
pub mod text;

// Re-export error types at crate root
pub use error::{ErrorKind, OmniGenError, Result, GENERIC_FAILURE_MESSAGE, MISSING_KEY_MESSAGE};

pub use credentials::{ApiKey, CredentialStore};
pub use image::{
    GeminiImageModel, GeminiImageProvider, GeminiImageProviderBuilder, GeneratedImage,
    ImageFormat, ImageProvider, ImageRequest,
};
pub use orchestrator::{AppState, GenerationOutcome, Orchestrator, SkipReason, StateEvent};
pub use social::{
    AspectRatio, AspectRatioOverride, GeneratedContent, GenerationSettings, ImageResolution,
    Platform, PlatformContent, PlatformPost, Tone,
};
pub use text::{GeminiTextModel, GeminiTextProvider, GeminiTextProviderBuilder, TextProvider};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{OmniGenError, Result};
    pub use crate::image::{GeminiImageProvider, ImageProvider, ImageRequest};
    pub use crate::orchestrator::{GenerationOutcome, Orchestrator};
    pub use crate::social::{GenerationSettings, Platform, PlatformPost, Tone};
    pub use crate::text::{GeminiTextProvider, TextProvider};
}
