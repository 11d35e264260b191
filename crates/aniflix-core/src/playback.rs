//! Client-side choice between a native player, an embed, and an error view.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::models::{EpisodeResponse, ResolvedSource};
use crate::policy::{is_local_media, looks_like_direct_video, DenylistPolicy};

pub const BLOCKED_MESSAGE: &str =
    "Video source is not available. The streaming provider blocks embedding. Please try a different episode.";
pub const UNAVAILABLE_MESSAGE: &str = "Episode found but video streaming is not available yet.";

/// Console messages that mean the frame refused to render.
const EMBED_REFUSAL_MARKERS: &[&str] = &["x-frame-options", "refused to display"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockReason {
    /// Every candidate URL hit the denylist.
    Denylisted,
    /// The embed loaded but refused to render in a frame.
    EmbedRejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum PlaybackState {
    Loading,
    PlayableDirect(String),
    PlayableEmbed(String),
    Blocked(BlockReason),
    Unavailable,
}

/// Signals observed from an embedded player frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedSignal {
    ConsoleError(String),
    /// The frame's content window could not be reached after load.
    ContentWindowUnavailable,
}

impl PlaybackState {
    /// Apply an embed signal. Only `PlayableEmbed` reacts.
    pub fn on_embed_signal(self, signal: &EmbedSignal, policy: &DenylistPolicy) -> Self {
        match self {
            Self::PlayableEmbed(url) => {
                if embed_rejected(signal, policy) {
                    Self::Blocked(BlockReason::EmbedRejected)
                } else {
                    Self::PlayableEmbed(url)
                }
            }
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Blocked(_) | Self::Unavailable)
    }

    /// URL to hand to the player, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::PlayableDirect(url) | Self::PlayableEmbed(url) => Some(url),
            _ => None,
        }
    }

    /// Text shown in place of the player.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::Blocked(_) => Some(BLOCKED_MESSAGE),
            Self::Unavailable => Some(UNAVAILABLE_MESSAGE),
            _ => None,
        }
    }
}

fn embed_rejected(signal: &EmbedSignal, policy: &DenylistPolicy) -> bool {
    match signal {
        EmbedSignal::ContentWindowUnavailable => true,
        EmbedSignal::ConsoleError(msg) => {
            let lower = msg.to_lowercase();
            EMBED_REFUSAL_MARKERS.iter().any(|m| lower.contains(m)) || policy.is_denied(msg)
        }
    }
}

fn accepted(url: &str, policy: &DenylistPolicy) -> bool {
    is_local_media(url) || policy.is_allowed(url)
}

fn is_direct(url: &str) -> bool {
    is_local_media(url) || looks_like_direct_video(url)
}

/// Pick the URL the player should load.
///
/// Among accepted `sources`, direct media wins, then the first non-HLS entry,
/// then the first entry. Without an accepted source, `iframe` is used if it
/// is accepted.
pub fn choose_url(response: &EpisodeResponse, policy: &DenylistPolicy) -> Option<String> {
    let accepted_sources: Vec<&ResolvedSource> = response
        .sources
        .iter()
        .filter(|s| accepted(&s.url, policy))
        .collect();

    let from_sources = accepted_sources
        .iter()
        .find(|s| is_direct(&s.url))
        .or_else(|| accepted_sources.iter().find(|s| !s.is_m3u8))
        .or_else(|| accepted_sources.first());
    if let Some(source) = from_sources {
        return Some(source.url.clone());
    }

    let iframe = response.iframe.as_str();
    (!iframe.is_empty() && accepted(iframe, policy)).then(|| iframe.to_string())
}

/// Decide how a resolved episode is played.
pub fn select_playback(response: &EpisodeResponse, policy: &DenylistPolicy) -> PlaybackState {
    if response.sources.is_empty() && response.iframe.is_empty() {
        return PlaybackState::Unavailable;
    }
    match choose_url(response, policy) {
        Some(url) if is_direct(&url) => PlaybackState::PlayableDirect(url),
        Some(url) => PlaybackState::PlayableEmbed(url),
        None => PlaybackState::Blocked(BlockReason::Denylisted),
    }
}

// ── Watch session ─────────────────────────────────────────────────────

/// Why an episode load produced no response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    Cancelled,
    NotFound,
    Failed(String),
}

/// Handle for one episode load started by [`WatchSession::begin`].
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    token: CancellationToken,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token the fetch must observe.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Ties the in-flight episode load to the lifetime of a watch view.
///
/// At most one load is current. Starting a new one cancels the previous
/// load, and results from stale or cancelled loads are dropped.
#[derive(Debug)]
pub struct WatchSession {
    root: CancellationToken,
    current: Option<LoadTicket>,
    generation: u64,
    state: PlaybackState,
    error: Option<String>,
    policy: DenylistPolicy,
}

impl WatchSession {
    pub fn new(policy: DenylistPolicy) -> Self {
        Self {
            root: CancellationToken::new(),
            current: None,
            generation: 0,
            state: PlaybackState::Loading,
            error: None,
            policy,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Message of the last failed load, if the view should show one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        !self.root.is_cancelled()
    }

    /// Start loading an episode, cancelling any load still in flight.
    pub fn begin(&mut self) -> LoadTicket {
        if let Some(previous) = self.current.take() {
            previous.token.cancel();
        }
        self.generation += 1;
        self.state = PlaybackState::Loading;
        self.error = None;
        let ticket = LoadTicket {
            generation: self.generation,
            token: self.root.child_token(),
        };
        self.current = Some(ticket.clone());
        ticket
    }

    /// Apply the outcome of a load. Returns whether the state changed.
    pub fn complete(
        &mut self,
        ticket: &LoadTicket,
        outcome: Result<EpisodeResponse, LoadFailure>,
    ) -> bool {
        if ticket.generation != self.generation || ticket.token.is_cancelled() {
            return false;
        }
        self.current = None;
        match outcome {
            Ok(response) => {
                self.state = select_playback(&response, &self.policy);
            }
            Err(LoadFailure::Cancelled) => return false,
            Err(LoadFailure::NotFound) => {
                self.state = PlaybackState::Unavailable;
                self.error = Some("Episode not found".to_string());
            }
            Err(LoadFailure::Failed(message)) => {
                self.state = PlaybackState::Unavailable;
                self.error = Some(message);
            }
        }
        true
    }

    /// Feed a signal from the embedded frame into the current state.
    pub fn embed_signal(&mut self, signal: &EmbedSignal) {
        let state = std::mem::replace(&mut self.state, PlaybackState::Loading);
        self.state = state.on_embed_signal(signal, &self.policy);
    }

    /// Tear down the view. Every pending and future load is cancelled.
    pub fn unmount(&mut self) {
        self.root.cancel();
        self.current = None;
    }
}
