//! Application state and its pure transitions.
//!
//! Every change to the state is expressed as a [`StateEvent`] and applied by
//! [`AppState::reduce`], which returns a new value instead of mutating in
//! place. Image completions carry the cycle and per-post ticket they were
//! issued under; a completion that no longer matches is discarded, so a
//! late answer can never overwrite a replaced collection or a newer request.

use crate::social::{GenerationSettings, PlatformPost};
use serde::Serialize;

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Current user settings.
    pub settings: GenerationSettings,
    /// Posts of the current cycle, in platform order. Empty before the
    /// first successful text phase.
    pub posts: Vec<PlatformPost>,
    /// True from the start of a cycle until all of its image requests settle.
    pub is_generating: bool,
    /// Blocking, user-facing error of the last cycle.
    pub error: Option<String>,
    /// Identifier of the current cycle; bumped when a cycle starts.
    pub cycle: u64,
}

/// A change to apply to [`AppState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// The user changed settings.
    SettingsChanged(GenerationSettings),
    /// A new cycle begins: previous posts and error are cleared.
    CycleStarted,
    /// The text phase of `cycle` failed.
    TextFailed {
        /// Cycle the failure belongs to.
        cycle: u64,
        /// Message to show the user.
        message: String,
    },
    /// Placeholders for `cycle` are ready to display.
    PlaceholdersReady {
        /// Cycle the posts belong to.
        cycle: u64,
        /// One placeholder per platform.
        posts: Vec<PlatformPost>,
    },
    /// A fresh image request was issued for one post.
    ImageRequested {
        /// Cycle the post belongs to.
        cycle: u64,
        /// Index of the post.
        index: usize,
    },
    /// An image request settled.
    ImageSettled {
        /// Cycle the request was issued under.
        cycle: u64,
        /// Index of the post.
        index: usize,
        /// Ticket the request was issued with.
        ticket: u64,
        /// Data URI on success, `None` on failure.
        image: Option<String>,
    },
    /// All initial image requests of `cycle` settled.
    CycleSettled {
        /// Cycle that finished.
        cycle: u64,
    },
}

impl AppState {
    /// Creates an empty state with the given settings.
    pub fn with_settings(settings: GenerationSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Applies `event`, returning the next state, or `None` if the event is
    /// stale or not applicable and the state stays as it is.
    pub fn reduce(&self, event: StateEvent) -> Option<AppState> {
        match event {
            StateEvent::SettingsChanged(settings) => Some(Self {
                settings,
                ..self.clone()
            }),
            StateEvent::CycleStarted => {
                if self.is_generating {
                    return None;
                }
                Some(Self {
                    settings: self.settings,
                    posts: Vec::new(),
                    is_generating: true,
                    error: None,
                    cycle: self.cycle + 1,
                })
            }
            StateEvent::TextFailed { cycle, message } => {
                if cycle != self.cycle {
                    return None;
                }
                Some(Self {
                    posts: Vec::new(),
                    is_generating: false,
                    error: Some(message),
                    ..self.clone()
                })
            }
            StateEvent::PlaceholdersReady { cycle, posts } => {
                if cycle != self.cycle {
                    return None;
                }
                Some(Self {
                    posts,
                    ..self.clone()
                })
            }
            StateEvent::ImageRequested { cycle, index } => {
                self.patch_post(cycle, index, |post| {
                    post.ticket += 1;
                    post.image_loading = true;
                })
            }
            StateEvent::ImageSettled {
                cycle,
                index,
                ticket,
                image,
            } => {
                let current = self.posts.get(index)?;
                if current.ticket != ticket {
                    return None;
                }
                self.patch_post(cycle, index, |post| {
                    post.image_loading = false;
                    if image.is_some() {
                        post.image_data = image;
                    }
                })
            }
            StateEvent::CycleSettled { cycle } => {
                if cycle != self.cycle {
                    return None;
                }
                Some(Self {
                    is_generating: false,
                    ..self.clone()
                })
            }
        }
    }

    /// Copies the collection and changes the single entry at `index`.
    fn patch_post(
        &self,
        cycle: u64,
        index: usize,
        patch: impl FnOnce(&mut PlatformPost),
    ) -> Option<AppState> {
        if cycle != self.cycle || index >= self.posts.len() {
            return None;
        }
        let mut posts = self.posts.clone();
        patch(&mut posts[index]);
        Some(Self {
            posts,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::{GeneratedContent, PlatformContent};

    fn content() -> GeneratedContent {
        let entry = |n: &str| PlatformContent {
            text: format!("{n} text"),
            image_prompt: format!("{n} prompt"),
        };
        GeneratedContent {
            linkedin: entry("linkedin"),
            twitter: entry("twitter"),
            instagram: entry("instagram"),
        }
    }

    fn with_placeholders() -> AppState {
        let state = AppState::default().reduce(StateEvent::CycleStarted).unwrap();
        let posts = PlatformPost::placeholders(&content(), &state.settings);
        state
            .reduce(StateEvent::PlaceholdersReady {
                cycle: state.cycle,
                posts,
            })
            .unwrap()
    }

    #[test]
    fn test_cycle_start_clears_previous_results() {
        let mut state = with_placeholders();
        state.error = Some("old".into());
        state.is_generating = false;

        let next = state.reduce(StateEvent::CycleStarted).unwrap();
        assert!(next.posts.is_empty());
        assert!(next.error.is_none());
        assert!(next.is_generating);
        assert_eq!(next.cycle, state.cycle + 1);
    }

    #[test]
    fn test_cycle_start_ignored_while_generating() {
        let state = with_placeholders();
        assert!(state.is_generating);
        assert!(state.reduce(StateEvent::CycleStarted).is_none());
    }

    #[test]
    fn test_text_failure_records_message() {
        let state = AppState::default().reduce(StateEvent::CycleStarted).unwrap();
        let next = state
            .reduce(StateEvent::TextFailed {
                cycle: state.cycle,
                message: "nope".into(),
            })
            .unwrap();
        assert!(!next.is_generating);
        assert!(next.posts.is_empty());
        assert_eq!(next.error.as_deref(), Some("nope"));
    }

    #[test]
    fn test_image_settled_patches_only_target() {
        let state = with_placeholders();
        let next = state
            .reduce(StateEvent::ImageSettled {
                cycle: state.cycle,
                index: 1,
                ticket: 0,
                image: Some("data:image/png;base64,AA==".into()),
            })
            .unwrap();

        assert_eq!(
            next.posts[1].image_data.as_deref(),
            Some("data:image/png;base64,AA==")
        );
        assert!(!next.posts[1].image_loading);
        assert_eq!(next.posts[0], state.posts[0]);
        assert_eq!(next.posts[2], state.posts[2]);
        // The previous value is untouched.
        assert!(state.posts[1].image_loading);
    }

    #[test]
    fn test_failed_image_clears_loading_without_data() {
        let state = with_placeholders();
        let next = state
            .reduce(StateEvent::ImageSettled {
                cycle: state.cycle,
                index: 2,
                ticket: 0,
                image: None,
            })
            .unwrap();
        assert!(next.posts[2].image_failed());
    }

    #[test]
    fn test_stale_cycle_completion_discarded() {
        let state = with_placeholders();
        let event = StateEvent::ImageSettled {
            cycle: state.cycle - 1,
            index: 0,
            ticket: 0,
            image: Some("old".into()),
        };
        assert!(state.reduce(event).is_none());
    }

    #[test]
    fn test_out_of_range_index_discarded() {
        let state = with_placeholders();
        assert!(state
            .reduce(StateEvent::ImageRequested {
                cycle: state.cycle,
                index: 3,
            })
            .is_none());
    }

    #[test]
    fn test_superseded_ticket_discarded() {
        let state = with_placeholders();
        let requested = state
            .reduce(StateEvent::ImageRequested {
                cycle: state.cycle,
                index: 0,
            })
            .unwrap();
        assert_eq!(requested.posts[0].ticket, 1);

        // The initial request (ticket 0) answers late.
        assert!(requested
            .reduce(StateEvent::ImageSettled {
                cycle: state.cycle,
                index: 0,
                ticket: 0,
                image: Some("late".into()),
            })
            .is_none());

        let settled = requested
            .reduce(StateEvent::ImageSettled {
                cycle: state.cycle,
                index: 0,
                ticket: 1,
                image: Some("fresh".into()),
            })
            .unwrap();
        assert_eq!(settled.posts[0].image_data.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_regeneration_failure_keeps_previous_image() {
        let state = with_placeholders();
        let cycle = state.cycle;
        let state = state
            .reduce(StateEvent::ImageSettled {
                cycle,
                index: 0,
                ticket: 0,
                image: Some("first".into()),
            })
            .unwrap()
            .reduce(StateEvent::ImageRequested { cycle, index: 0 })
            .unwrap();
        assert!(state.posts[0].image_loading);
        assert_eq!(state.posts[0].image_data.as_deref(), Some("first"));

        let state = state
            .reduce(StateEvent::ImageSettled {
                cycle,
                index: 0,
                ticket: 1,
                image: None,
            })
            .unwrap();
        assert!(!state.posts[0].image_loading);
        assert_eq!(state.posts[0].image_data.as_deref(), Some("first"));
    }

    #[test]
    fn test_cycle_settled_clears_busy_flag() {
        let state = with_placeholders();
        let next = state
            .reduce(StateEvent::CycleSettled { cycle: state.cycle })
            .unwrap();
        assert!(!next.is_generating);
        assert!(state
            .reduce(StateEvent::CycleSettled {
                cycle: state.cycle + 1
            })
            .is_none());
    }

    #[test]
    fn test_settings_change_keeps_posts() {
        let state = with_placeholders();
        let settings = state
            .settings
            .with_aspect_ratio(crate::social::AspectRatioOverride::Fixed(
                crate::social::AspectRatio::Square,
            ));
        let next = state.reduce(StateEvent::SettingsChanged(settings)).unwrap();
        assert_eq!(next.settings, settings);
        assert_eq!(next.posts, state.posts);
    }
}
