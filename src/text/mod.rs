//! Social copy generation module.

mod gemini;
mod provider;

pub use gemini::{GeminiTextModel, GeminiTextProvider, GeminiTextProviderBuilder};
pub use provider::TextProvider;
