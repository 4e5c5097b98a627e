//! Danmaku Engine - frame scheduling and entity lifecycle for bullet-hell games
//!
//! Core modules:
//! - `sched`: Priority-ordered tick scheduler, cooperative tasks, destroy ownership
//! - `sim`: Danmaku and player entities, pools, swept collision, game session
//! - `input`: Per-key frame-counter input tracking
//! - `rng`: Seeded deterministic RNG for gameplay decisions
//! - `platform`: Rendering/audio collaborator traits with headless implementations
//! - `settings`: Data-driven engine configuration

pub mod error;
pub mod input;
pub mod platform;
pub mod rng;
pub mod sched;
pub mod settings;
pub mod sim;

pub use error::{EngineError, InvalidStatePolicy};
pub use input::{Input, Key, KeyBinding, KeyMap};
pub use rng::Rng;
pub use sched::{Destroyable, LoopController, LoopOptions, Scheduler, Sleep, Step, Task};
pub use settings::{EngineConfig, PlayerConfig};
pub use sim::{Danmaku, DanmakuKind, DanmakuPool, Game, Player, PlayerState};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Nominal host frame rate
    pub const TARGET_FPS: f32 = 60.0;
    /// Maximum ticks the frame driver runs for one host frame
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Stage dimensions (pixels)
    pub const STAGE_WIDTH: f32 = 640.0;
    pub const STAGE_HEIGHT: f32 = 480.0;

    /// Board half extents - the play-field spans [-w, w] x [-h, h]
    pub const BOARD_HALF_WIDTH: f32 = 200.0;
    pub const BOARD_HALF_HEIGHT: f32 = 240.0;
    /// Extra room outside the board before a danmaku is deleted
    pub const BOUNDARY_MARGIN: f32 = 5.0;
    /// Boundary margin multiplier applied to the danmaku hit radius
    pub const BOUNDARY_RADIUS_FACTOR: f32 = 1.5;

    /// Cheap-rejection box half-size for the collision pass
    pub const COLLISION_PREFILTER: f32 = 30.0;

    /// Scheduler priorities (higher runs earlier in the frame)
    pub const PRIORITY_INPUT: i32 = 30_000;
    pub const PRIORITY_PLAYER: i32 = 29_900;
    pub const PRIORITY_DEFAULT: i32 = 0;
    pub const PRIORITY_COLLISION: i32 = -30_000;

    /// Entity pool compaction floor
    pub const POOL_MIN_BASELINE: usize = 60;

    /// Player defaults
    pub const PLAYER_HITBOX_RADIUS: f32 = 3.0;
    pub const PLAYER_HIGH_SPEED: f32 = 4.0;
    pub const PLAYER_SLOW_SPEED: f32 = 1.6;
    pub const PLAYER_DYING_BOMB_TIME: f32 = 12.0;
    pub const PLAYER_SPAWN_X: f32 = 0.0;
    pub const PLAYER_SPAWN_Y: f32 = 185.0;
    /// Distance kept between the player and the board edge
    pub const PLAYER_EDGE_MARGIN: f32 = 16.0;
    /// Invincibility granted when the player first appears
    pub const PLAYER_INITIAL_INVINCIBLE: f32 = 90.0;
    /// Invincibility granted after a full respawn
    pub const PLAYER_RESPAWN_INVINCIBLE: f32 = 120.0;
    /// God mode: invincibility after a non-lethal hit
    pub const GOD_MODE_HIT_INVINCIBLE: f32 = 30.0;
    /// God mode: invincibility after bouncing back from a miss
    pub const GOD_MODE_MISS_INVINCIBLE: f32 = 60.0;
    /// Miss sequence timings (frames)
    pub const MISS_WAIT_FRAMES: f32 = 30.0;
    pub const RESPAWN_DELAY_FRAMES: f32 = 30.0;
    pub const RESPAWN_SLIDE_FRAMES: f32 = 30.0;
    /// Respawn entry point sits this far below the bottom edge
    pub const RESPAWN_ENTRY_OFFSET: f32 = 32.0;

    /// Alpha change per frame for fades
    pub const FADE_STEP: f32 = 0.1;
}

/// Clamp `n` into [a, b]
#[inline]
pub fn clamp(n: f32, a: f32, b: f32) -> f32 {
    n.max(a).min(b)
}

/// Degrees to radians
#[inline]
pub fn deg(n: f32) -> f32 {
    n.to_radians()
}

/// Move `value` toward `target` by at most `step`, landing exactly on it
#[inline]
pub fn approach(value: f32, target: f32, step: f32) -> f32 {
    if (value - target).abs() <= step {
        target
    } else if target > value {
        value + step
    } else {
        value - step
    }
}

/// Unit vector for a heading in radians
#[inline]
pub fn heading_to_vec(rotation: f32) -> Vec2 {
    Vec2::new(rotation.cos(), rotation.sin())
}
