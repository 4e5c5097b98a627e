//! Platform abstraction layer
//!
//! The engine only talks to rendering and audio through these traits:
//! - `Stage` spawns positioned sprites on a layer
//! - `Sprite` is one visual node (position, rotation, scale, alpha, visibility)
//! - `Sound` is a playable sound handle
//! - `SoundBank` resolves sounds by logical name
//!
//! `headless` provides no-op implementations for tests and the demo binary.

pub mod headless;

use std::rc::Rc;

use glam::Vec2;

use crate::error::EngineError;

pub use headless::{HeadlessSprite, HeadlessStage, SilentSound, SilentSoundBank};

/// Draw layer on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Player parts drawn under danmaku (avatar, slow ring)
    PlayerBack,
    /// Ordinary danmaku
    Danmaku,
    /// Erase effects, drawn under ordinary danmaku
    EraseEffects,
    /// Player parts drawn over danmaku (hitbox point)
    PlayerFront,
}

/// Everything a stage needs to create a sprite
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDesc {
    /// Logical texture name resolved by the host's asset loader
    pub texture: String,
    pub pos: Vec2,
    pub rotation: f32,
    pub scale: f32,
    pub alpha: f32,
    /// Hue shift in degrees applied by a shared, immutable style
    pub hue: f32,
}

impl SpriteDesc {
    pub fn new(texture: impl Into<String>, pos: Vec2) -> Self {
        Self {
            texture: texture.into(),
            pos,
            rotation: 0.0,
            scale: 1.0,
            alpha: 1.0,
            hue: 0.0,
        }
    }
}

/// One visual node owned by an entity
pub trait Sprite {
    fn set_position(&mut self, pos: Vec2);
    fn set_rotation(&mut self, rotation: f32);
    fn set_scale(&mut self, scale: f32);
    fn set_alpha(&mut self, alpha: f32);
    fn alpha(&self) -> f32;
    fn set_visible(&mut self, visible: bool);
    fn visible(&self) -> bool;
    /// Remove the node from the scene; later calls are no-ops
    fn destroy(&mut self);
    fn destroyed(&self) -> bool;
}

/// Sprite factory for the board
pub trait Stage {
    fn spawn(&self, layer: Layer, desc: &SpriteDesc) -> Box<dyn Sprite>;
}

/// A playable sound
pub trait Sound {
    fn play(&self);
    fn stop(&self);
    fn set_volume(&self, volume: f32);
}

/// Logical-name sound lookup
pub trait SoundBank {
    fn get(&self, name: &str) -> Result<Rc<dyn Sound>, EngineError>;
}
