//! Engine configuration
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{EngineError, InvalidStatePolicy};
use crate::input::KeyMap;

/// Player tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Hit-circle radius
    pub hitbox_radius: f32,
    /// Movement per frame at normal speed
    pub high_speed: f32,
    /// Movement per frame while the slow key is held
    pub slow_speed: f32,
    /// Frames between a hit and the miss
    pub dying_bomb_time: f32,
    pub spawn: Vec2,
    /// Invincibility when the player first appears
    pub initial_invincible: f32,
    pub key_map: KeyMap,

    /// Register the per-frame player update loop
    pub auto_update: bool,
    /// Register the danmaku collision pass against this player
    pub auto_collide: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            hitbox_radius: PLAYER_HITBOX_RADIUS,
            high_speed: PLAYER_HIGH_SPEED,
            slow_speed: PLAYER_SLOW_SPEED,
            dying_bomb_time: PLAYER_DYING_BOMB_TIME,
            spawn: Vec2::new(PLAYER_SPAWN_X, PLAYER_SPAWN_Y),
            initial_invincible: PLAYER_INITIAL_INVINCIBLE,
            key_map: KeyMap::default(),
            auto_update: true,
            auto_collide: true,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Stage ===
    pub stage_width: f32,
    pub stage_height: f32,
    /// Board half extents
    pub board_width: f32,
    pub board_height: f32,

    // === Timing ===
    pub target_fps: f32,
    /// Gameplay RNG seed; random when absent
    pub seed: Option<u64>,

    // === Behaviour ===
    /// Refresh input automatically at the start of every tick
    pub auto_update_input: bool,
    /// Hits are never lethal; deaths are counted instead
    pub god_mode: bool,
    pub invalid_state_policy: InvalidStatePolicy,

    pub player: PlayerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stage_width: STAGE_WIDTH,
            stage_height: STAGE_HEIGHT,
            board_width: BOARD_HALF_WIDTH,
            board_height: BOARD_HALF_HEIGHT,

            target_fps: TARGET_FPS,
            seed: None,

            auto_update_input: true,
            god_mode: false,
            invalid_state_policy: InvalidStatePolicy::Error,

            player: PlayerConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.board_width, 200.0);
        assert_eq!(config.board_height, 240.0);
        assert_eq!(config.player.spawn, Vec2::new(0.0, 185.0));
        assert_eq!(config.invalid_state_policy, InvalidStatePolicy::Error);
        assert!(config.auto_update_input);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(
            r#"{
                "seed": 42,
                "god_mode": true,
                "invalid_state_policy": "Warn",
                "player": { "high_speed": 5.0, "key_map": { "up": ["KeyW", "ArrowUp"] } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(config.god_mode);
        assert_eq!(config.invalid_state_policy, InvalidStatePolicy::Warn);
        assert_eq!(config.player.high_speed, 5.0);
        assert_eq!(config.player.slow_speed, PLAYER_SLOW_SPEED);
        assert_eq!(config.player.key_map.up.keys(), &[Key::ArrowUp, Key::KeyW]);
        assert_eq!(config.player.key_map.down.keys(), &[Key::ArrowDown]);
    }

    #[test]
    fn test_empty_binding_rejected() {
        let result = EngineConfig::from_json(r#"{ "player": { "key_map": { "slow": [] } } }"#);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = EngineConfig::default();
        config.seed = Some(7);
        config.player.spawn = Vec2::new(10.0, 150.0);
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load("/nonexistent/danmaku.json");
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
