//! Scripted providers for orchestration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use omnigen::{
    GeneratedContent, GeneratedImage, ImageFormat, ImageProvider, ImageRequest, OmniGenError,
    PlatformContent, Result, TextProvider, Tone,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Image prompts produced by [`FakeText`] for `idea`.
pub fn prompts_for(idea: &str) -> [String; 3] {
    [
        format!("linkedin visual for {idea}"),
        format!("twitter visual for {idea}"),
        format!("instagram visual for {idea}"),
    ]
}

/// Text provider that derives deterministic copy from the idea.
#[derive(Default)]
pub struct FakeText {
    calls: AtomicUsize,
    failure: Mutex<Option<fn() -> OmniGenError>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with the error built by `make`.
    pub fn failing(make: fn() -> OmniGenError) -> Self {
        let fake = Self::default();
        *fake.failure.lock().unwrap() = Some(make);
        fake
    }

    /// Holds the next call until the returned handle is notified.
    pub fn gate(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for FakeText {
    async fn generate(&self, idea: &str, tone: Tone) -> Result<GeneratedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(make) = *self.failure.lock().unwrap() {
            return Err(make());
        }
        let [linkedin, twitter, instagram] = prompts_for(idea);
        let entry = |name: &str, image_prompt: String| PlatformContent {
            text: format!("{tone} {name} post about {idea}"),
            image_prompt,
        };
        Ok(GeneratedContent {
            linkedin: entry("linkedin", linkedin),
            twitter: entry("twitter", twitter),
            instagram: entry("instagram", instagram),
        })
    }

    fn name(&self) -> &str {
        "fake text"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Image provider whose answers are scripted per prompt.
///
/// Each successful image's bytes are `"<prompt>#<call number>"`, so tests
/// can tell which call produced the image they see.
#[derive(Default)]
pub struct FakeImages {
    calls: AtomicUsize,
    requests: Mutex<Vec<ImageRequest>>,
    failing: Mutex<HashSet<String>>,
    no_data: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests for `prompt` fail with an upstream error.
    pub fn fail(&self, prompt: &str) {
        self.failing.lock().unwrap().insert(prompt.to_string());
    }

    /// Requests for `prompt` answer without image data.
    pub fn answer_without_image(&self, prompt: &str) {
        self.no_data.lock().unwrap().insert(prompt.to_string());
    }

    /// Requests for `prompt` succeed again.
    pub fn heal(&self, prompt: &str) {
        self.failing.lock().unwrap().remove(prompt);
        self.no_data.lock().unwrap().remove(prompt);
    }

    /// The next request for `prompt` waits until the returned handle is
    /// notified.
    pub fn gate(&self, prompt: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(prompt.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for FakeImages {
    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        let gate = self.gates.lock().unwrap().remove(&request.prompt);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().unwrap().contains(&request.prompt) {
            return Err(OmniGenError::Api {
                status: 503,
                message: "overloaded".into(),
            });
        }
        if self.no_data.lock().unwrap().contains(&request.prompt) {
            return Err(OmniGenError::NoImageData("text only".into()));
        }

        let bytes = format!("{}#{}", request.prompt, call).into_bytes();
        Ok(GeneratedImage::new(bytes, ImageFormat::Png))
    }

    fn name(&self) -> &str {
        "fake images"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Decodes a data URI produced by [`FakeImages`] back into its label.
pub fn image_label(data_url: &str) -> String {
    let image = GeneratedImage::from_data_url(data_url).unwrap();
    String::from_utf8(image.data).unwrap()
}
