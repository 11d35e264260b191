//! Per-episode watch progress, persisted on the client.

use std::collections::HashMap;

/// Minimum position change between two saves.
pub const SAVE_INTERVAL_SECS: u64 = 10;

/// Storage key for an episode's saved position.
pub fn progress_key(anime_id: &str, episode_id: &str) -> String {
    format!("progress-{anime_id}-{episode_id}")
}

/// Key-value persistence for playback positions, in whole seconds.
pub trait ProgressStore {
    fn load(&self, key: &str) -> Option<u64>;
    fn save(&mut self, key: &str, seconds: u64);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    entries: HashMap<String, u64>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, key: &str) -> Option<u64> {
        self.entries.get(key).copied()
    }

    fn save(&mut self, key: &str, seconds: u64) {
        self.entries.insert(key.to_string(), seconds);
    }
}

/// Saves the playback position of one episode as it advances.
#[derive(Debug)]
pub struct ProgressTracker<S> {
    store: S,
    key: String,
    last_saved: Option<u64>,
}

impl<S: ProgressStore> ProgressTracker<S> {
    pub fn new(store: S, anime_id: &str, episode_id: &str) -> Self {
        Self {
            store,
            key: progress_key(anime_id, episode_id),
            last_saved: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Report the current position. Returns whether it was persisted.
    pub fn tick(&mut self, current_secs: f64) -> bool {
        if !current_secs.is_finite() || current_secs < 0.0 {
            return false;
        }
        let position = current_secs.floor() as u64;
        let due = match self.last_saved {
            None => position >= SAVE_INTERVAL_SECS,
            Some(last) => position.abs_diff(last) >= SAVE_INTERVAL_SECS,
        };
        if due {
            self.store.save(&self.key, position);
            self.last_saved = Some(position);
        }
        due
    }

    /// Saved position to seek to, if it lies strictly inside the video.
    pub fn resume_position(&self, duration_secs: f64) -> Option<u64> {
        let saved = self.store.load(&self.key)?;
        (saved > 0 && (saved as f64) < duration_secs).then_some(saved)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
