//! Generation orchestration.
//!
//! One cycle runs the text provider once, publishes three placeholders, then
//! fans out one image request per post. Each image lands in its own slot as
//! soon as it settles; a failed image only affects its own post.

mod state;

pub use state::{AppState, StateEvent};

use crate::error::{OmniGenError, Result};
use crate::image::{ImageProvider, ImageRequest};
use crate::social::{GenerationSettings, Platform, PlatformPost};
use crate::text::TextProvider;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::watch;

/// Why [`Orchestrator::generate`] did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The idea was empty or whitespace.
    EmptyIdea,
    /// Another cycle is still in flight.
    InFlight,
}

/// Result of a call to [`Orchestrator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// No cycle was started.
    Skipped(SkipReason),
    /// The cycle ran to completion; these are the settled posts.
    Completed(Vec<PlatformPost>),
}

impl GenerationOutcome {
    /// Returns the settled posts, empty if the cycle was skipped.
    pub fn posts(&self) -> &[PlatformPost] {
        match self {
            Self::Skipped(_) => &[],
            Self::Completed(posts) => posts,
        }
    }
}

/// Drives generation cycles and owns the post collection.
pub struct Orchestrator {
    text: Arc<dyn TextProvider>,
    images: Arc<dyn ImageProvider>,
    state: watch::Sender<AppState>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("text", &self.text.name())
            .field("images", &self.images.name())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with default settings.
    pub fn new(
        text: impl TextProvider + 'static,
        images: impl ImageProvider + 'static,
    ) -> Self {
        Self::from_shared(Arc::new(text), Arc::new(images))
    }

    /// Creates an orchestrator from already shared providers.
    pub fn from_shared(text: Arc<dyn TextProvider>, images: Arc<dyn ImageProvider>) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            text,
            images,
            state,
        }
    }

    /// Sets the initial settings.
    pub fn with_settings(self, settings: GenerationSettings) -> Self {
        self.state.send_replace(AppState::with_settings(settings));
        self
    }

    /// Returns a receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Returns the current settings.
    pub fn settings(&self) -> GenerationSettings {
        self.state.borrow().settings
    }

    /// Replaces the settings. Existing posts keep their resolved ratios;
    /// the new resolution applies to the next image request.
    pub fn update_settings(&self, settings: GenerationSettings) {
        self.dispatch(StateEvent::SettingsChanged(settings));
    }

    /// Runs a full generation cycle for `idea`.
    ///
    /// Returns `Skipped` when the idea is blank or a cycle is already
    /// running. A text-phase failure is recorded in the state and returned;
    /// no placeholders are created and no image is requested. Image failures
    /// never fail the cycle.
    pub async fn generate(&self, idea: &str) -> Result<GenerationOutcome> {
        if idea.trim().is_empty() {
            return Ok(GenerationOutcome::Skipped(SkipReason::EmptyIdea));
        }

        let Some((cycle, settings)) = self.begin_cycle() else {
            tracing::debug!("generation already in flight, ignoring request");
            return Ok(GenerationOutcome::Skipped(SkipReason::InFlight));
        };

        tracing::info!(cycle, tone = %settings.tone, "starting generation cycle");
        let settle = Settle::new(&self.state, StateEvent::CycleSettled { cycle });

        let content = match self.text.generate(idea, settings.tone).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(cycle, "text generation failed: {e}");
                settle.disarm();
                self.dispatch(StateEvent::TextFailed {
                    cycle,
                    message: e.user_message().to_string(),
                });
                return Err(e);
            }
        };

        let posts = PlatformPost::placeholders(&content, &settings);
        self.dispatch(StateEvent::PlaceholdersReady {
            cycle,
            posts: posts.clone(),
        });

        let requests = posts.iter().enumerate().map(|(index, post)| {
            let request = ImageRequest::new(post.image_prompt.clone())
                .with_aspect_ratio(post.aspect_ratio)
                .with_resolution(settings.image_resolution);
            self.resolve_image(cycle, index, post.ticket, post.platform, request)
        });
        let settled = join_all(requests).await;

        let failed = settled.iter().filter(|r| r.is_err()).count();
        settle.fire();
        tracing::info!(cycle, failed, "generation cycle settled");

        Ok(GenerationOutcome::Completed(self.snapshot().posts))
    }

    /// Requests a new image for the post at `index`, reusing its prompt and
    /// aspect ratio with the current resolution setting.
    ///
    /// The previous image stays in place while the request runs and is kept
    /// if it fails. Returns the updated post, or `None` when the result was
    /// superseded by a newer request or a new cycle.
    pub async fn regenerate_image(&self, index: usize) -> Result<Option<PlatformPost>> {
        let (cycle, ticket, platform, request) = self.issue_regeneration(index).ok_or_else(|| {
            OmniGenError::InvalidRequest(format!("no post at index {index}"))
        })?;

        tracing::info!(cycle, index, %platform, "regenerating image");

        let applied = self
            .resolve_image(cycle, index, ticket, platform, request)
            .await?;
        if !applied {
            return Ok(None);
        }

        let state = self.snapshot();
        if state.cycle != cycle {
            return Ok(None);
        }
        Ok(state.posts.into_iter().nth(index))
    }

    /// Issues one image request and writes its outcome into slot `index`.
    /// Returns whether the outcome was applied.
    async fn resolve_image(
        &self,
        cycle: u64,
        index: usize,
        ticket: u64,
        platform: Platform,
        request: ImageRequest,
    ) -> Result<bool> {
        tracing::debug!(
            cycle,
            index,
            %platform,
            aspect_ratio = %request.aspect_ratio,
            resolution = %request.resolution,
            "requesting image"
        );

        let settle = Settle::new(
            &self.state,
            StateEvent::ImageSettled {
                cycle,
                index,
                ticket,
                image: None,
            },
        );
        let outcome = self.images.generate(&request).await;
        settle.disarm();

        let image = match &outcome {
            Ok(image) => Some(image.to_data_url()),
            Err(e) => {
                tracing::warn!(cycle, %platform, "image generation failed: {e}");
                None
            }
        };

        let applied = self.dispatch(StateEvent::ImageSettled {
            cycle,
            index,
            ticket,
            image,
        });
        if !applied {
            tracing::debug!(cycle, index, %platform, "discarding superseded image result");
        }

        outcome.map(|_| applied)
    }

    /// Atomically starts a cycle unless one is running.
    fn begin_cycle(&self) -> Option<(u64, GenerationSettings)> {
        let mut started = None;
        self.state.send_if_modified(|state| {
            match state.reduce(StateEvent::CycleStarted) {
                Some(next) => {
                    started = Some((next.cycle, next.settings));
                    *state = next;
                    true
                }
                None => false,
            }
        });
        started
    }

    /// Atomically marks post `index` as loading and builds its request.
    fn issue_regeneration(&self, index: usize) -> Option<(u64, u64, Platform, ImageRequest)> {
        let mut issued = None;
        self.state.send_if_modified(|state| {
            let event = StateEvent::ImageRequested {
                cycle: state.cycle,
                index,
            };
            let Some(next) = state.reduce(event) else {
                return false;
            };
            let post = &next.posts[index];
            let request = ImageRequest::new(post.image_prompt.clone())
                .with_aspect_ratio(post.aspect_ratio)
                .with_resolution(next.settings.image_resolution);
            issued = Some((next.cycle, post.ticket, post.platform, request));
            *state = next;
            true
        });
        issued
    }

    /// Applies `event`; returns false if it was discarded.
    fn dispatch(&self, event: StateEvent) -> bool {
        apply(&self.state, event)
    }
}

fn apply(state: &watch::Sender<AppState>, event: StateEvent) -> bool {
    state.send_if_modified(|current| match current.reduce(event) {
        Some(next) => {
            *current = next;
            true
        }
        None => false,
    })
}

/// Settling event owed for a started cycle or image request.
///
/// If the future driving the work is dropped before it settles, the event is
/// applied on drop so the state never stays busy or loading.
struct Settle<'a> {
    state: &'a watch::Sender<AppState>,
    event: Option<StateEvent>,
}

impl<'a> Settle<'a> {
    fn new(state: &'a watch::Sender<AppState>, event: StateEvent) -> Self {
        Self {
            state,
            event: Some(event),
        }
    }

    /// Applies the event now.
    fn fire(mut self) -> bool {
        self.event
            .take()
            .is_some_and(|event| apply(self.state, event))
    }

    /// The caller settles the work itself.
    fn disarm(mut self) {
        self.event = None;
    }
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            tracing::debug!(?event, "settling abandoned request");
            apply(self.state, event);
        }
    }
}
