//! Game settings and preferences
//!
//! Currently only Pong has a tunable: its AI difficulty preset. The chosen
//! preset is persisted through the key-value collaborator so it survives
//! reloads, the same way high scores do.

use serde::{Deserialize, Serialize};

use crate::persistence::KvStore;

/// Pong AI difficulty preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Maximum vertical speed of the AI paddle (units/sec).
    pub fn ai_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 190.0,
            Difficulty::Normal => 216.0,
            Difficulty::Hard => 260.0,
        }
    }

    /// How often the AI re-reads the ball position (seconds). A larger
    /// delay means the paddle chases stale information.
    pub fn ai_reaction(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.28,
            Difficulty::Normal => 0.16,
            Difficulty::Hard => 0.05,
        }
    }

    /// Cap on ball speed after repeated paddle bounces (units/sec).
    pub fn ball_speed_cap(&self) -> f32 {
        match self {
            Difficulty::Easy => 420.0,
            Difficulty::Normal => 480.0,
            Difficulty::Hard => 540.0,
        }
    }
}

/// Persisted Pong preferences.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PongSettings {
    pub difficulty: Difficulty,
}

impl PongSettings {
    const STORAGE_KEY: &'static str = "pong-difficulty";

    pub fn load(store: &dyn KvStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            if let Ok(settings) = serde_json::from_str(&json) {
                return settings;
            }
            log::warn!("unreadable pong settings, using defaults");
        }
        Self::default()
    }

    pub fn save(&self, store: &mut dyn KvStore) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(Self::STORAGE_KEY, &json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_difficulty_str_roundtrip() {
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_settings_persist() {
        let mut store = MemoryStore::new();
        assert_eq!(PongSettings::load(&store).difficulty, Difficulty::Normal);

        let settings = PongSettings {
            difficulty: Difficulty::Hard,
        };
        settings.save(&mut store);
        assert_eq!(PongSettings::load(&store).difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let mut store = MemoryStore::new();
        store.set("pong-difficulty", "{nope");
        assert_eq!(PongSettings::load(&store).difficulty, Difficulty::Normal);
    }

    #[test]
    fn test_harder_presets_react_faster() {
        assert!(Difficulty::Hard.ai_reaction() < Difficulty::Easy.ai_reaction());
        assert!(Difficulty::Hard.ai_speed() > Difficulty::Easy.ai_speed());
    }
}
