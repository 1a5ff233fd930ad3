//! Best score persistence
//!
//! The host picks the storage key; the engine only records. Persisted to
//! LocalStorage on the web, kept in memory on native.

use serde::{Deserialize, Serialize};

/// Best score under a host-defined key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestScore {
    #[serde(skip)]
    key: String,
    pub score: u64,
    /// Level reached alongside the best score
    #[serde(default)]
    pub level: u32,
}

impl BestScore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            score: 0,
            level: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check if a score would replace the stored one
    pub fn qualifies(&self, score: u64) -> bool {
        score > 0 && score > self.score
    }

    /// Record a finished run. Returns true if it became the new best.
    pub fn record(&mut self, score: u64, level: u32) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        self.score = score;
        self.level = level;
        true
    }

    /// Decode a stored value; accepts the JSON envelope or a bare integer
    pub fn decode(key: &str, raw: &str) -> Self {
        let mut best = serde_json::from_str::<BestScore>(raw)
            .ok()
            .or_else(|| {
                raw.trim().parse::<u64>().ok().map(|score| BestScore {
                    score,
                    ..Default::default()
                })
            })
            .unwrap_or_default();
        best.key = key.to_string();
        best
    }

    /// Load the best score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load(key: &str) -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(raw)) = storage.get_item(key) {
                let best = Self::decode(key, &raw);
                log::info!("Loaded best score {} from '{}'", best.score, key);
                return best;
            }
        }

        log::info!("No best score under '{}', starting fresh", key);
        Self::new(key)
    }

    /// Save the best score to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(&self.key, &json);
                log::info!("Best score saved ({})", self.score);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(key: &str) -> Self {
        Self::new(key)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("Best score for '{}' kept in memory ({})", self.key, self.score);
    }
}
