//! Shared data model for social pack generation.

use crate::error::{OmniGenError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target social platforms, in the fixed order posts are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// LinkedIn.
    #[serde(rename = "LinkedIn")]
    LinkedIn,
    /// X, formerly Twitter.
    #[serde(rename = "Twitter/X")]
    Twitter,
    /// Instagram.
    #[serde(rename = "Instagram")]
    Instagram,
}

impl Platform {
    /// All platforms in their stable output order.
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::Twitter, Platform::Instagram];

    /// Returns the display name of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkedIn => "LinkedIn",
            Self::Twitter => "Twitter/X",
            Self::Instagram => "Instagram",
        }
    }

    /// Returns the key used for this platform in structured text output.
    pub fn key(&self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
        }
    }

    /// Aspect ratio used when the user has not forced one.
    pub fn default_aspect_ratio(&self) -> AspectRatio {
        match self {
            Self::LinkedIn => AspectRatio::Portrait3x4,
            Self::Twitter => AspectRatio::Landscape16x9,
            Self::Instagram => AspectRatio::Square,
        }
    }

    /// Maximum post length accepted by the platform, in characters.
    pub fn character_limit(&self) -> usize {
        match self {
            Self::LinkedIn => 3000,
            Self::Twitter => 280,
            Self::Instagram => 2200,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice the generated copy should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    /// Polished and businesslike.
    #[default]
    Professional,
    /// Playful and clever.
    Witty,
    /// Time-sensitive call to action.
    Urgent,
    /// Relaxed and conversational.
    Casual,
    /// Uplifting and motivational.
    Inspirational,
}

impl Tone {
    /// All tones, in display order.
    pub const ALL: [Tone; 5] = [
        Tone::Professional,
        Tone::Witty,
        Tone::Urgent,
        Tone::Casual,
        Tone::Inspirational,
    ];

    /// Returns the tone name as sent to the text model.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "Professional",
            Self::Witty => "Witty",
            Self::Urgent => "Urgent",
            Self::Casual => "Casual",
            Self::Inspirational => "Inspirational",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = OmniGenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OmniGenError::InvalidRequest(format!("unknown tone '{s}'")))
    }
}

/// Resolution tier requested from the image model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageResolution {
    /// 1K.
    #[default]
    #[serde(rename = "1K")]
    OneK,
    /// 2K.
    #[serde(rename = "2K")]
    TwoK,
    /// 4K. Slower to generate.
    #[serde(rename = "4K")]
    FourK,
}

impl ImageResolution {
    /// All resolution tiers, lowest first.
    pub const ALL: [ImageResolution; 3] = [
        ImageResolution::OneK,
        ImageResolution::TwoK,
        ImageResolution::FourK,
    ];

    /// Returns the tier as the API expects it (e.g., "2K").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl std::fmt::Display for ImageResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageResolution {
    type Err = OmniGenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OmniGenError::InvalidRequest(format!("unknown resolution '{s}'")))
    }
}

/// Aspect ratios supported for post imagery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
    /// 3:4 portrait.
    #[serde(rename = "3:4")]
    Portrait3x4,
    /// 4:3 landscape.
    #[serde(rename = "4:3")]
    Landscape4x3,
    /// 9:16 tall portrait (stories).
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// 16:9 widescreen.
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    /// All supported ratios.
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = OmniGenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| OmniGenError::InvalidRequest(format!("unknown aspect ratio '{s}'")))
    }
}

/// Either "Auto" (per-platform defaults) or a ratio forced onto every post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AspectRatioOverride {
    /// Use each platform's default ratio.
    #[default]
    Auto,
    /// Use this ratio for every platform.
    Fixed(AspectRatio),
}

impl std::fmt::Display for AspectRatioOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Fixed(ratio) => f.write_str(ratio.as_str()),
        }
    }
}

impl FromStr for AspectRatioOverride {
    type Err = OmniGenError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse().map(Self::Fixed)
    }
}

impl Serialize for AspectRatioOverride {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AspectRatioOverride {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// User-chosen generation parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Voice of the generated copy.
    pub tone: Tone,
    /// Resolution tier for every image request.
    pub image_resolution: ImageResolution,
    /// Ratio forced onto all posts, or `Auto`.
    pub aspect_ratio_override: AspectRatioOverride,
}

impl GenerationSettings {
    /// Sets the tone.
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Sets the image resolution tier.
    pub fn with_resolution(mut self, resolution: ImageResolution) -> Self {
        self.image_resolution = resolution;
        self
    }

    /// Sets the aspect ratio override.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatioOverride) -> Self {
        self.aspect_ratio_override = ratio;
        self
    }

    /// Resolves the concrete ratio a new post for `platform` should use.
    pub fn aspect_ratio_for(&self, platform: Platform) -> AspectRatio {
        match self.aspect_ratio_override {
            AspectRatioOverride::Fixed(ratio) => ratio,
            AspectRatioOverride::Auto => platform.default_aspect_ratio(),
        }
    }
}

/// Copy and image prompt generated for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlatformContent {
    /// The post body.
    pub text: String,
    /// Visual description for the image model.
    pub image_prompt: String,
}

/// Structured output of the text model: one entry per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedContent {
    /// LinkedIn copy.
    pub linkedin: PlatformContent,
    /// X/Twitter copy.
    pub twitter: PlatformContent,
    /// Instagram copy.
    pub instagram: PlatformContent,
}

impl GeneratedContent {
    /// Parses structured text output, rejecting any deviation from the
    /// expected shape, including blank fields.
    pub fn from_json(text: &str) -> Result<Self> {
        let content: Self =
            serde_json::from_str(text).map_err(|e| OmniGenError::Parse(e.to_string()))?;
        for platform in Platform::ALL {
            let entry = content.for_platform(platform);
            if entry.text.trim().is_empty() {
                return Err(OmniGenError::Parse(format!(
                    "{} text is empty",
                    platform.key()
                )));
            }
            if entry.image_prompt.trim().is_empty() {
                return Err(OmniGenError::Parse(format!(
                    "{} imagePrompt is empty",
                    platform.key()
                )));
            }
        }
        Ok(content)
    }

    /// Returns the content generated for `platform`.
    pub fn for_platform(&self, platform: Platform) -> &PlatformContent {
        match platform {
            Platform::LinkedIn => &self.linkedin,
            Platform::Twitter => &self.twitter,
            Platform::Instagram => &self.instagram,
        }
    }
}

/// One generated post and the state of its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPost {
    /// Which platform this post targets.
    pub platform: Platform,
    /// The generated copy.
    pub text_body: String,
    /// The visual description used to request an image.
    pub image_prompt: String,
    /// Data URI of the image, once an image request succeeded.
    pub image_data: Option<String>,
    /// True while an image request for this post is outstanding.
    pub image_loading: bool,
    /// Ratio resolved when the post was created.
    pub aspect_ratio: AspectRatio,
    /// Identifies the most recent image request issued for this post.
    #[serde(skip)]
    pub(crate) ticket: u64,
}

impl PlatformPost {
    /// Creates a post whose image has been requested but not yet resolved.
    pub fn placeholder(
        platform: Platform,
        content: &PlatformContent,
        aspect_ratio: AspectRatio,
    ) -> Self {
        Self {
            platform,
            text_body: content.text.clone(),
            image_prompt: content.image_prompt.clone(),
            image_data: None,
            image_loading: true,
            aspect_ratio,
            ticket: 0,
        }
    }

    /// Builds the three placeholders for a cycle, in platform order.
    pub fn placeholders(content: &GeneratedContent, settings: &GenerationSettings) -> Vec<Self> {
        Platform::ALL
            .into_iter()
            .map(|platform| {
                Self::placeholder(
                    platform,
                    content.for_platform(platform),
                    settings.aspect_ratio_for(platform),
                )
            })
            .collect()
    }

    /// Number of characters in the post body.
    pub fn character_count(&self) -> usize {
        self.text_body.chars().count()
    }

    /// Returns true if the copy is longer than the platform allows.
    pub fn exceeds_character_limit(&self) -> bool {
        self.character_count() > self.platform.character_limit()
    }

    /// Returns true if the image request settled without producing an image.
    pub fn image_failed(&self) -> bool {
        !self.image_loading && self.image_data.is_none()
    }
}
