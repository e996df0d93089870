//! Per-game high score tracking
//!
//! One integer per game, persisted through the key-value collaborator under
//! the game's storage key. Writes happen only on improvement: the stored
//! value never decreases except by clearing storage externally.

use crate::persistence::KvStore;

pub const ASTEROIDS_KEY: &str = "asteroids-high-score";
pub const INVADERS_KEY: &str = "invaders-high-score";
pub const PACMAN_KEY: &str = "pacman-high-score";
pub const PONG_KEY: &str = "pong-high-score";
pub const SNAKE_KEY: &str = "snake-high-score";
pub const TETRIS_KEY: &str = "tetris-high-score";

/// High score for one game.
#[derive(Debug, Clone)]
pub struct HighScore {
    key: &'static str,
    best: u64,
}

impl HighScore {
    /// Load the stored value; absence or garbage reads as zero.
    pub fn load(store: &dyn KvStore, key: &'static str) -> Self {
        let best = store.get(key).and_then(|v| v.parse().ok()).unwrap_or(0);
        Self { key, best }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Record a finished run. Writes through to the store only when the
    /// score strictly beats the current best; returns whether it did.
    pub fn record(&mut self, store: &mut dyn KvStore, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            store.set(self.key, &score.to_string());
            log::info!("new high score {} for {}", score, self.key);
            true
        } else {
            false
        }
    }
}
