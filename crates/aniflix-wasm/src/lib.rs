use aniflix_core::models::EpisodeResponse;
use aniflix_core::playback::{self, EmbedSignal, PlaybackState};
use aniflix_core::policy::{self, DenylistPolicy};
use aniflix_core::progress;
use wasm_bindgen::prelude::*;

fn to_json(state: &PlaybackState) -> String {
    serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string())
}

/// Built-in denylist extended with the fragments in `denylist_json`, a JSON
/// array of strings as served by `GET /policy`. An empty or malformed value
/// leaves only the built-in entries.
fn policy_from(denylist_json: &str) -> DenylistPolicy {
    let extra: Vec<String> = serde_json::from_str(denylist_json).unwrap_or_default();
    DenylistPolicy::default().extended(&extra)
}

#[wasm_bindgen]
pub fn is_allowed(url: &str, denylist_json: &str) -> bool {
    policy_from(denylist_json).is_allowed(url)
}

#[wasm_bindgen]
pub fn looks_like_direct_video(url: &str) -> bool {
    policy::looks_like_direct_video(url) || policy::is_local_media(url)
}

/// Playback decision for an `/episode` response body.
#[wasm_bindgen]
pub fn select_playback(response_json: &str, denylist_json: &str) -> String {
    match serde_json::from_str::<EpisodeResponse>(response_json) {
        Ok(response) => to_json(&playback::select_playback(
            &response,
            &policy_from(denylist_json),
        )),
        Err(_) => to_json(&PlaybackState::Unavailable),
    }
}

/// Apply a console error from the embedded frame to a state from
/// [`select_playback`]. An empty message means the frame's content window
/// was unreachable.
#[wasm_bindgen]
pub fn embed_signal(state_json: &str, message: &str, denylist_json: &str) -> String {
    let Ok(state) = serde_json::from_str::<PlaybackState>(state_json) else {
        return state_json.to_string();
    };
    let signal = if message.is_empty() {
        EmbedSignal::ContentWindowUnavailable
    } else {
        EmbedSignal::ConsoleError(message.to_string())
    };
    to_json(&state.on_embed_signal(&signal, &policy_from(denylist_json)))
}

#[wasm_bindgen]
pub fn progress_key(anime_id: &str, episode_id: &str) -> String {
    progress::progress_key(anime_id, episode_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRA: &str = r#"["badmirror.test"]"#;

    #[test]
    fn test_select_playback_json() {
        let body = r#"{"id":"21-1","title":"Episode 1","episodeTitle":"Episode 1",
            "iframe":"https://player.test/e/1","sources":[]}"#;
        assert_eq!(
            select_playback(body, "[]"),
            r#"{"state":"playableEmbed","value":"https://player.test/e/1"}"#
        );
        assert_eq!(select_playback("not json", ""), r#"{"state":"unavailable"}"#);
    }

    #[test]
    fn test_configured_fragment_blocks() {
        let body = r#"{"id":"21-1","title":"Episode 1","episodeTitle":"Episode 1",
            "iframe":"https://player.badmirror.test/e/1","sources":[]}"#;
        assert_eq!(
            select_playback(body, ""),
            r#"{"state":"playableEmbed","value":"https://player.badmirror.test/e/1"}"#
        );
        assert_eq!(
            select_playback(body, EXTRA),
            r#"{"state":"blocked","value":"denylisted"}"#
        );
        assert!(is_allowed("https://player.badmirror.test/e/1", ""));
        assert!(!is_allowed("https://player.badmirror.test/e/1", EXTRA));
    }

    #[test]
    fn test_embed_signal_json() {
        let state = r#"{"state":"playableEmbed","value":"https://player.test/e/1"}"#;
        assert_eq!(
            embed_signal(state, "Refused to display in a frame", ""),
            r#"{"state":"blocked","value":"embedRejected"}"#
        );
        assert_eq!(embed_signal(state, "unrelated", ""), state);
        assert_eq!(
            embed_signal(state, "", ""),
            r#"{"state":"blocked","value":"embedRejected"}"#
        );
        assert_eq!(
            embed_signal(state, "blocked by badmirror.test", EXTRA),
            r#"{"state":"blocked","value":"embedRejected"}"#
        );
    }

    #[test]
    fn test_filters() {
        assert!(is_allowed("https://cdn.test/a.mp4", "[]"));
        assert!(!is_allowed("https://familynonstop.com/a.mp4", "[]"));
        assert!(!is_allowed("https://familynonstop.com/a.mp4", "not json"));
        assert!(looks_like_direct_video("blob:https://app.test/1"));
        assert_eq!(progress_key("a", "b"), "progress-a-b");
    }
}
