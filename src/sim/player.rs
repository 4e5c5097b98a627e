//! Player entity and its hit/death/respawn state machine
//!
//! ```text
//! Common{invincible} --hit--> Dying{t} --t >= bomb time--> Miss{elapsed} --respawn--> Common{120}
//!        ^                       |                             |
//!        +---apply_invincible----+          god mode ----------+--> Common{60}
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;

use super::board::Board;
use super::collision::Motion;
use super::danmaku::Danmaku;
use super::game::DebugTools;
use crate::consts::*;
use crate::error::{EngineError, InvalidStatePolicy};
use crate::input::{Input, KeyBinding};
use crate::platform::{Layer, Sound, SoundBank, Sprite, SpriteDesc, Stage};
use crate::sched::{Destroyable, Scheduler};
use crate::settings::PlayerConfig;
use crate::{approach, clamp, deg};

/// Sound played when the player is hit
pub const HIT_SOUND: &str = "pldead00";

const AVATAR_TEXTURE: &str = "player";
const HITBOX_TEXTURE: &str = "hitbox";
const SLOW_RING_TEXTURE: &str = "slow_ring";

/// Where the player is in the hit/death/respawn cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerState {
    /// Alive and controllable
    Common,
    /// Hit; a bomb inside `dying_bomb_time` frames would save it
    Dying { time_since_dying: f32 },
    /// Dead; `elapsed` frames into the respawn sequence
    Miss { elapsed: f32 },
}

impl PlayerState {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerState::Common => "common",
            PlayerState::Dying { .. } => "dying",
            PlayerState::Miss { .. } => "miss",
        }
    }
}

/// Session services the player talks to
pub struct PlayerContext {
    pub scheduler: Scheduler,
    pub input: Rc<Input>,
    pub board: Rc<Board>,
    pub stage: Rc<dyn Stage>,
    pub sounds: Rc<dyn SoundBank>,
    pub debug: Rc<DebugTools>,
    pub policy: InvalidStatePolicy,
}

struct PlayerSprites {
    avatar: Box<dyn Sprite>,
    slow_ring: Box<dyn Sprite>,
    hitbox: Box<dyn Sprite>,
}

impl PlayerSprites {
    fn each(&mut self, mut f: impl FnMut(&mut dyn Sprite)) {
        f(self.avatar.as_mut());
        f(self.slow_ring.as_mut());
        f(self.hitbox.as_mut());
    }
}

/// The controlled entity
pub struct Player {
    config: PlayerConfig,
    ctx: PlayerContext,
    hit_sound: Rc<dyn Sound>,
    pos: Cell<Vec2>,
    /// Position at the last collision pass
    last_pos: Cell<Vec2>,
    state: Cell<PlayerState>,
    invincible_time: Cell<f32>,
    is_slow: Cell<bool>,
    ring_rotation: Cell<f32>,
    destroyed: Cell<bool>,
    sprites: RefCell<PlayerSprites>,
}

impl Player {
    /// Create a player at its spawn point
    ///
    /// Fails if the hit sound cannot be resolved.
    pub fn new(config: PlayerConfig, ctx: PlayerContext) -> Result<Rc<Self>, EngineError> {
        let hit_sound = ctx.sounds.get(HIT_SOUND)?;
        let spawn = config.spawn;

        let avatar = ctx.stage.spawn(Layer::PlayerBack, &SpriteDesc::new(AVATAR_TEXTURE, spawn));
        let mut ring_desc = SpriteDesc::new(SLOW_RING_TEXTURE, spawn);
        ring_desc.alpha = 0.0;
        let slow_ring = ctx.stage.spawn(Layer::PlayerBack, &ring_desc);
        let mut hitbox_desc = SpriteDesc::new(HITBOX_TEXTURE, spawn);
        hitbox_desc.alpha = 0.0;
        hitbox_desc.scale = config.hitbox_radius * 0.04 + 0.12;
        let hitbox = ctx.stage.spawn(Layer::PlayerFront, &hitbox_desc);

        Ok(Rc::new(Self {
            invincible_time: Cell::new(config.initial_invincible),
            config,
            ctx,
            hit_sound,
            pos: Cell::new(spawn),
            last_pos: Cell::new(spawn),
            state: Cell::new(PlayerState::Common),
            is_slow: Cell::new(false),
            ring_rotation: Cell::new(0.0),
            destroyed: Cell::new(false),
            sprites: RefCell::new(PlayerSprites {
                avatar,
                slow_ring,
                hitbox,
            }),
        }))
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn pos(&self) -> Vec2 {
        self.pos.get()
    }

    pub fn set_pos(&self, pos: Vec2) {
        self.pos.set(pos);
        self.sprites.borrow_mut().each(|s| s.set_position(pos));
    }

    pub fn last_pos(&self) -> Vec2 {
        self.last_pos.get()
    }

    pub fn hitbox_radius(&self) -> f32 {
        self.config.hitbox_radius
    }

    pub fn state(&self) -> PlayerState {
        self.state.get()
    }

    pub fn invincible_time(&self) -> f32 {
        self.invincible_time.get()
    }

    pub fn is_slow(&self) -> bool {
        self.is_slow.get()
    }

    /// Swept-collision geometry for this frame
    pub(crate) fn motion(&self) -> Motion {
        Motion {
            last: self.last_pos.get(),
            current: self.pos.get(),
            radius: self.config.hitbox_radius,
        }
    }

    pub(crate) fn commit_last_pos(&self) {
        self.last_pos.set(self.pos.get());
    }

    fn set_state(&self, next: PlayerState) {
        let prev = self.state.replace(next);
        if prev.name() != next.name() {
            log::debug!("player {} -> {}", prev.name(), next.name());
        }
    }

    /// Advance one frame: state machine, then movement while alive
    pub fn update(&self) {
        self.update_state();
        if self.state() == PlayerState::Common {
            self.move_by_input();
        }
    }

    /// Step the state machine once
    pub fn update_state(&self) {
        let ts = self.ctx.scheduler.time_scale();
        match self.state() {
            PlayerState::Common => {
                let inv = self.invincible_time.get();
                self.invincible_time.set(if inv <= ts { 0.0 } else { inv - ts });
            }
            PlayerState::Dying { time_since_dying } => {
                if time_since_dying >= self.config.dying_bomb_time {
                    self.sprites.borrow_mut().each(|s| s.set_visible(false));
                    self.set_state(PlayerState::Miss { elapsed: 0.0 });
                } else {
                    let t = time_since_dying + ts;
                    self.sprites.borrow_mut().avatar.set_alpha(1.0 - t / self.config.dying_bomb_time.max(1.0));
                    self.set_state(PlayerState::Dying { time_since_dying: t });
                }
            }
            PlayerState::Miss { elapsed } => self.step_miss(elapsed, ts),
        }
    }

    fn step_miss(&self, elapsed: f32, ts: f32) {
        if self.ctx.debug.god_mode() {
            let deaths = self.ctx.debug.record_death();
            log::info!("god mode: player died ({} total)", deaths);
            self.respawn(GOD_MODE_MISS_INVINCIBLE);
            return;
        }

        let wait = MISS_WAIT_FRAMES + RESPAWN_DELAY_FRAMES;
        if elapsed >= wait + RESPAWN_SLIDE_FRAMES {
            self.set_pos(self.config.spawn);
            self.respawn(PLAYER_RESPAWN_INVINCIBLE);
            return;
        }
        if elapsed >= wait {
            let entry = Vec2::new(self.config.spawn.x, self.ctx.board.height() + RESPAWN_ENTRY_OFFSET);
            if elapsed - ts < wait {
                self.sprites.borrow_mut().each(|s| s.set_visible(true));
                self.sprites.borrow_mut().avatar.set_alpha(1.0);
            }
            let t = (elapsed - wait) / RESPAWN_SLIDE_FRAMES;
            self.set_pos(entry.lerp(self.config.spawn, t));
        }
        self.set_state(PlayerState::Miss { elapsed: elapsed + ts });
    }

    fn respawn(&self, invincible: f32) {
        self.invincible_time.set(invincible);
        self.commit_last_pos();
        let mut sprites = self.sprites.borrow_mut();
        sprites.each(|s| s.set_visible(true));
        sprites.avatar.set_alpha(1.0);
        drop(sprites);
        self.set_state(PlayerState::Common);
    }

    /// Read the key map and move, clamped to the board
    pub fn move_by_input(&self) {
        let ts = self.ctx.scheduler.time_scale();
        let input = &self.ctx.input;
        let keys = &self.config.key_map;
        let axis = |plus: &KeyBinding, minus: &KeyBinding| {
            input.is_binding_hold(plus) as i32 as f32 - input.is_binding_hold(minus) as i32 as f32
        };
        let dir = Vec2::new(axis(&keys.right, &keys.left), axis(&keys.down, &keys.up));
        let slow = input.is_binding_hold(&keys.slow);
        self.is_slow.set(slow);
        self.update_cosmetics(slow, ts);

        if dir != Vec2::ZERO {
            let speed = if slow { self.config.slow_speed } else { self.config.high_speed };
            let step = dir.normalize() * speed * ts;
            let w = self.ctx.board.width() - PLAYER_EDGE_MARGIN;
            let h = self.ctx.board.height() - PLAYER_EDGE_MARGIN;
            let next = self.pos() + step;
            self.set_pos(Vec2::new(clamp(next.x, -w, w), clamp(next.y, -h, h)));
        }
    }

    fn update_cosmetics(&self, slow: bool, ts: f32) {
        let (avatar, marks) = if slow { (0.5, 1.0) } else { (1.0, 0.0) };
        let step = FADE_STEP * ts;
        let rotation = self.ring_rotation.get() + deg(2.0 * ts);
        self.ring_rotation.set(rotation);

        let mut sprites = self.sprites.borrow_mut();
        let a = approach(sprites.avatar.alpha(), avatar, step);
        sprites.avatar.set_alpha(a);
        let a = approach(sprites.hitbox.alpha(), marks, step);
        sprites.hitbox.set_alpha(a);
        let a = approach(sprites.slow_ring.alpha(), marks, step);
        sprites.slow_ring.set_alpha(a);
        sprites.slow_ring.set_rotation(rotation);
    }

    /// Collision entry point, called by the danmaku pool on a hit
    pub fn hit_by_danmaku(&self, danmaku: &Danmaku) {
        if self.state() != PlayerState::Common || self.invincible_time.get() > 0.0 {
            return;
        }
        self.hit_sound.stop();
        self.hit_sound.play();
        if self.ctx.debug.god_mode() {
            self.invincible_time.set(GOD_MODE_HIT_INVINCIBLE);
            danmaku.erase();
        } else {
            self.set_state(PlayerState::Dying { time_since_dying: 0.0 });
        }
    }

    /// Grant at least `duration` frames of invincibility
    ///
    /// While dying this cancels the death. A dead player cannot be made
    /// invincible; what happens then depends on the configured policy.
    pub fn apply_invincible(&self, duration: f32) -> Result<(), EngineError> {
        match self.state() {
            PlayerState::Common => {
                self.invincible_time.set(self.invincible_time.get().max(duration));
                Ok(())
            }
            PlayerState::Dying { .. } => {
                self.invincible_time.set(duration);
                self.sprites.borrow_mut().avatar.set_alpha(1.0);
                self.set_state(PlayerState::Common);
                Ok(())
            }
            state @ PlayerState::Miss { .. } => self.ctx.policy.reject("apply invincibility", state.name()),
        }
    }
}

impl Destroyable for Player {
    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.sprites.borrow_mut().each(|s| s.destroy());
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("pos", &self.pos.get())
            .field("state", &self.state.get())
            .field("invincible_time", &self.invincible_time.get())
            .finish()
    }
}
