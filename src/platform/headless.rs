//! Headless platform: sprites that only remember their state, sounds that
//! only count how often they were played

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;

use super::{Layer, Sound, SoundBank, Sprite, SpriteDesc, Stage};
use crate::error::EngineError;

/// Sprite that records what it was told
#[derive(Debug, Clone)]
pub struct HeadlessSprite {
    pub pos: Vec2,
    pub rotation: f32,
    pub scale: f32,
    pub alpha: f32,
    pub visible: bool,
    pub destroyed: bool,
}

impl Sprite for HeadlessSprite {
    fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }

    fn destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Stage that hands out `HeadlessSprite`s and counts them per layer
#[derive(Debug, Default)]
pub struct HeadlessStage {
    spawned: RefCell<HashMap<Layer, usize>>,
}

impl HeadlessStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sprites created so far
    pub fn spawned(&self) -> usize {
        self.spawned.borrow().values().sum()
    }

    /// Sprites created on `layer` so far
    pub fn spawned_on(&self, layer: Layer) -> usize {
        self.spawned.borrow().get(&layer).copied().unwrap_or(0)
    }
}

impl Stage for HeadlessStage {
    fn spawn(&self, layer: Layer, desc: &SpriteDesc) -> Box<dyn Sprite> {
        *self.spawned.borrow_mut().entry(layer).or_insert(0) += 1;
        Box::new(HeadlessSprite {
            pos: desc.pos,
            rotation: desc.rotation,
            scale: desc.scale,
            alpha: desc.alpha,
            visible: true,
            destroyed: false,
        })
    }
}

/// Sound that does nothing but count plays
#[derive(Debug)]
pub struct SilentSound {
    plays: Cell<u32>,
    volume: Cell<f32>,
}

impl Default for SilentSound {
    fn default() -> Self {
        Self {
            plays: Cell::new(0),
            volume: Cell::new(1.0),
        }
    }
}

impl SilentSound {
    pub fn plays(&self) -> u32 {
        self.plays.get()
    }

    /// Last volume set, 1.0 until changed
    pub fn volume(&self) -> f32 {
        self.volume.get()
    }
}

impl Sound for SilentSound {
    fn play(&self) {
        self.plays.set(self.plays.get() + 1);
    }

    fn stop(&self) {}

    fn set_volume(&self, volume: f32) {
        self.volume.set(volume);
    }
}

/// Sound bank that resolves every name to one shared silent sound
#[derive(Debug, Default)]
pub struct SilentSoundBank {
    sound: Rc<SilentSound>,
}

impl SilentSoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared sound, for inspecting play counts
    pub fn sound(&self) -> Rc<SilentSound> {
        self.sound.clone()
    }
}

impl SoundBank for SilentSoundBank {
    fn get(&self, name: &str) -> Result<Rc<dyn Sound>, EngineError> {
        if name.is_empty() {
            return Err(EngineError::AssetNotFound {
                name: name.to_string(),
            });
        }
        Ok(self.sound.clone())
    }
}
