//! Image generation module.

mod gemini;
mod provider;
mod types;

pub use gemini::{GeminiImageModel, GeminiImageProvider, GeminiImageProviderBuilder};
pub use provider::ImageProvider;
pub use types::{GeneratedImage, ImageFormat, ImageRequest};
