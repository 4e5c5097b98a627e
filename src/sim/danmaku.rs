//! Danmaku (projectile) entities and their pool
//!
//! A danmaku owns its sprite and its authoritative position. Gameplay
//! scripts move it from scheduler loops; the pool's collision pass tests
//! every live danmaku against the player once per frame using the swept
//! test in `collision`.

use std::cell::{Cell, RefCell};
use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng as _;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::collision::{Motion, swept_hit};
use super::player::Player;
use super::pool::EntityPool;
use crate::consts::FADE_STEP;
use crate::platform::{Layer, Sprite, SpriteDesc, Stage};
use crate::sched::{Destroyable, LoopController, LoopOptions, Scheduler, Step, Task};
use crate::{approach, heading_to_vec};

/// Prefab danmaku shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanmakuKind {
    Dot,
    SmallBall,
    Ball,
    RingBall,
    GlowBall,
    BigBall,
    Bubble,
    Nuclear,
    Rice,
    Chain,
    Needle,
    Amulet,
    Scale,
    Kunai,
    Arrow,
    Bullet,
    Star,
    SmallStar,
    BigStar,
    Heart,
    Butterfly,
    Knife,
    Oval,
    Coin,
    Fire,
    Drop,
    Crystal,
    Gem,
    Spark,
}

/// How a danmaku looks when erased
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseFlavour {
    /// Grows and fades into fog
    Fog,
    /// Shrinks and fades (large shots)
    Shrink,
}

impl DanmakuKind {
    /// Hit radius at scale 1
    pub fn base_radius(self) -> f32 {
        use DanmakuKind::*;
        match self {
            Dot | Needle | Spark => 1.5,
            Rice | Chain | Arrow => 2.0,
            SmallBall | Amulet | Scale | Kunai | Bullet | SmallStar | Drop | Crystal => 2.5,
            Knife | Coin | Gem => 3.0,
            Star | Fire => 3.5,
            Ball | RingBall | Oval => 4.0,
            GlowBall => 4.5,
            Butterfly => 5.0,
            BigStar | Heart => 6.0,
            BigBall => 8.0,
            Bubble => 12.0,
            Nuclear => 24.0,
        }
    }

    pub fn erase_flavour(self) -> EraseFlavour {
        match self {
            DanmakuKind::Bubble | DanmakuKind::Nuclear => EraseFlavour::Shrink,
            _ => EraseFlavour::Fog,
        }
    }

    /// Logical texture name for the asset loader
    pub fn texture(self) -> &'static str {
        use DanmakuKind::*;
        match self {
            Dot => "dot",
            SmallBall => "smallball",
            Ball => "ball",
            RingBall => "ringball",
            GlowBall => "glowball",
            BigBall => "bigball",
            Bubble => "bubble",
            Nuclear => "nuclear",
            Rice => "rice",
            Chain => "chain",
            Needle => "needle",
            Amulet => "amulet",
            Scale => "scale",
            Kunai => "kunai",
            Arrow => "arrow",
            Bullet => "bullet",
            Star => "star",
            SmallStar => "smallstar",
            BigStar => "bigstar",
            Heart => "heart",
            Butterfly => "butterfly",
            Knife => "knife",
            Oval => "oval",
            Coin => "coin",
            Fire => "fire",
            Drop => "drop",
            Crystal => "crystal",
            Gem => "gem",
            Spark => "spark",
        }
    }
}

/// Texture used by the fog erase effect
pub const ERASE_FOG_TEXTURE: &str = "particle_fog";

/// Immutable look shared by many danmaku
#[derive(Debug, Clone, PartialEq)]
pub struct DanmakuStyle {
    texture: String,
    hue: f32,
}

impl DanmakuStyle {
    pub fn new(texture: impl Into<String>, hue: f32) -> Rc<Self> {
        Rc::new(Self {
            texture: texture.into(),
            hue,
        })
    }

    /// Default look for a prefab kind
    pub fn for_kind(kind: DanmakuKind) -> Rc<Self> {
        Self::new(kind.texture(), 0.0)
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }
}

/// Initial placement and motion for a new danmaku
#[derive(Debug, Clone)]
pub struct SpawnParams {
    pub pos: Vec2,
    /// Heading in radians
    pub rotation: f32,
    /// Distance per frame along the heading
    pub speed: f32,
    pub scale: f32,
    pub style: Option<Rc<DanmakuStyle>>,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            rotation: 0.0,
            speed: 0.0,
            scale: 1.0,
            style: None,
        }
    }
}

impl SpawnParams {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }

    pub fn heading(mut self, rotation: f32, speed: f32) -> Self {
        self.rotation = rotation;
        self.speed = speed;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn style(mut self, style: Rc<DanmakuStyle>) -> Self {
        self.style = Some(style);
        self
    }
}

/// What danmaku need from the session: board bounds, the scheduler for
/// erase effects, the stage for sprites, and a cosmetic RNG
pub struct DanmakuEnv {
    pub board: Rc<Board>,
    pub scheduler: Scheduler,
    pub stage: Rc<dyn Stage>,
    fx_rng: RefCell<Pcg32>,
}

impl DanmakuEnv {
    pub fn new(board: Rc<Board>, scheduler: Scheduler, stage: Rc<dyn Stage>, fx_seed: u64) -> Rc<Self> {
        Rc::new(Self {
            board,
            scheduler,
            stage,
            fx_rng: RefCell::new(Pcg32::seed_from_u64(fx_seed)),
        })
    }

    fn random_angle(&self) -> f32 {
        self.fx_rng.borrow_mut().random_range(0.0..TAU)
    }
}

/// A projectile
pub struct Danmaku {
    kind: DanmakuKind,
    style: Rc<DanmakuStyle>,
    scale: f32,
    radius: f32,
    pos: Cell<Vec2>,
    /// Position at the last collision test
    last_pos: Cell<Vec2>,
    rotation: Cell<f32>,
    speed: Cell<f32>,
    damage_to_player: Cell<bool>,
    can_be_erase: Cell<bool>,
    destroyed: Cell<bool>,
    sprite: RefCell<Box<dyn Sprite>>,
    env: Rc<DanmakuEnv>,
}

impl Danmaku {
    fn new(kind: DanmakuKind, params: SpawnParams, env: Rc<DanmakuEnv>) -> Self {
        let style = params.style.unwrap_or_else(|| DanmakuStyle::for_kind(kind));
        let mut desc = SpriteDesc::new(style.texture(), params.pos);
        desc.rotation = params.rotation;
        desc.scale = params.scale;
        desc.hue = style.hue();
        let sprite = env.stage.spawn(Layer::Danmaku, &desc);

        Self {
            kind,
            style,
            scale: params.scale,
            radius: kind.base_radius() * params.scale,
            pos: Cell::new(params.pos),
            last_pos: Cell::new(params.pos),
            rotation: Cell::new(params.rotation),
            speed: Cell::new(params.speed),
            damage_to_player: Cell::new(true),
            can_be_erase: Cell::new(true),
            destroyed: Cell::new(false),
            sprite: RefCell::new(sprite),
            env,
        }
    }

    pub fn kind(&self) -> DanmakuKind {
        self.kind
    }

    pub fn style(&self) -> &Rc<DanmakuStyle> {
        &self.style
    }

    /// Hit-circle radius (base radius x scale)
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn pos(&self) -> Vec2 {
        self.pos.get()
    }

    pub fn set_pos(&self, pos: Vec2) {
        self.pos.set(pos);
        self.sprite.borrow_mut().set_position(pos);
    }

    pub fn last_pos(&self) -> Vec2 {
        self.last_pos.get()
    }

    pub fn rotation(&self) -> f32 {
        self.rotation.get()
    }

    pub fn set_rotation(&self, rotation: f32) {
        self.rotation.set(rotation);
        self.sprite.borrow_mut().set_rotation(rotation);
    }

    pub fn speed(&self) -> f32 {
        self.speed.get()
    }

    pub fn set_speed(&self, speed: f32) {
        self.speed.set(speed);
    }

    pub fn is_damage_to_player(&self) -> bool {
        self.damage_to_player.get()
    }

    pub fn set_damage_to_player(&self, on: bool) {
        self.damage_to_player.set(on);
    }

    pub fn can_be_erase(&self) -> bool {
        self.can_be_erase.get()
    }

    pub fn set_can_be_erase(&self, on: bool) {
        self.can_be_erase.set(on);
    }

    pub fn set_visible(&self, visible: bool) {
        self.sprite.borrow_mut().set_visible(visible);
    }

    pub fn set_alpha(&self, alpha: f32) {
        self.sprite.borrow_mut().set_alpha(alpha);
    }

    /// Point the heading at `target`
    pub fn aim_at(&self, target: Vec2) {
        let d = target - self.pos();
        if d != Vec2::ZERO {
            self.set_rotation(d.y.atan2(d.x));
        }
    }

    /// Move `distance` along the heading
    pub fn move_by(&self, distance: f32) {
        self.set_pos(self.pos() + heading_to_vec(self.rotation()) * distance);
    }

    /// Move one frame's worth of `speed`, scaled by the time-scale
    pub fn advance(&self) {
        self.move_by(self.speed() * self.env.scheduler.time_scale());
    }

    /// Whether the danmaku is still inside the board plus its margin
    pub fn in_boundary(&self) -> bool {
        self.env.board.contains_danmaku(self.pos(), self.radius)
    }

    /// Destroy the danmaku if it has left the board; returns true if it did
    pub fn boundary_delete(&self) -> bool {
        if self.in_boundary() {
            return false;
        }
        self.destroy();
        true
    }

    /// Like `boundary_delete`, also stopping the loop that drives it
    pub fn boundary_delete_with(&self, lp: &LoopController) -> bool {
        let deleted = self.boundary_delete();
        if deleted {
            lp.stop();
        }
        deleted
    }

    /// Destroy now, leaving a short cosmetic effect behind when on screen
    ///
    /// Does nothing when `can_be_erase` is off. Returns whether the danmaku
    /// was erased.
    pub fn erase(&self) -> bool {
        if !self.can_be_erase() || self.is_destroyed() {
            return false;
        }
        let shown = {
            let sprite = self.sprite.borrow();
            sprite.visible() && sprite.alpha() > 0.0
        };
        if shown && self.in_boundary() {
            self.spawn_erase_effect();
        }
        self.destroy();
        true
    }

    fn spawn_erase_effect(&self) {
        let flavour = self.kind.erase_flavour();
        let (texture, scale, rotation) = match flavour {
            EraseFlavour::Fog => (ERASE_FOG_TEXTURE, self.scale, self.env.random_angle()),
            EraseFlavour::Shrink => (self.style.texture(), 0.5, 0.0),
        };
        let mut desc = SpriteDesc::new(texture, self.pos());
        desc.scale = scale;
        desc.rotation = rotation;
        desc.hue = self.style.hue();
        let sprite = self.env.stage.spawn(Layer::EraseEffects, &desc);
        // Detached: the effect holds no reference back to this danmaku
        self.env.scheduler.co_do(
            EraseEffect {
                sprite,
                flavour,
                scale,
                alpha: 1.0,
            },
            LoopOptions::new(),
        );
    }

    /// Swept test against the player, then commit this frame's position
    fn test_hit(&self, player: &Player) -> bool {
        let current = self.pos();
        let hit = self.is_damage_to_player()
            && swept_hit(
                Motion {
                    last: self.last_pos.get(),
                    current,
                    radius: self.radius,
                },
                player.motion(),
            );
        self.last_pos.set(current);
        hit
    }
}

impl Destroyable for Danmaku {
    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.sprite.borrow_mut().destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

impl std::fmt::Debug for Danmaku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Danmaku")
            .field("kind", &self.kind)
            .field("pos", &self.pos.get())
            .field("rotation", &self.rotation.get())
            .field("speed", &self.speed.get())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

/// Cosmetic fade left behind by an erased danmaku
struct EraseEffect {
    sprite: Box<dyn Sprite>,
    flavour: EraseFlavour,
    scale: f32,
    alpha: f32,
}

impl Task for EraseEffect {
    fn resume(&mut self, lp: &LoopController) -> Step {
        if self.alpha <= 0.0 {
            self.sprite.destroy();
            return Step::Done;
        }
        let ts = lp.time_scale();
        self.scale = match self.flavour {
            EraseFlavour::Fog => self.scale + 0.2 * ts,
            EraseFlavour::Shrink => (self.scale - 0.1 * ts).max(0.0),
        };
        self.alpha = approach(self.alpha, 0.0, FADE_STEP * ts);
        self.sprite.set_scale(self.scale);
        self.sprite.set_alpha(self.alpha);
        Step::Suspend
    }
}

/// Every danmaku that takes part in collision
pub struct DanmakuPool {
    env: Rc<DanmakuEnv>,
    pool: RefCell<EntityPool<Danmaku>>,
}

impl DanmakuPool {
    pub fn new(env: Rc<DanmakuEnv>) -> Self {
        Self {
            env,
            pool: RefCell::new(EntityPool::new()),
        }
    }

    /// Create a danmaku and enter it into the collision pass
    pub fn spawn(&self, kind: DanmakuKind, params: SpawnParams) -> Rc<Danmaku> {
        let danmaku = Rc::new(Danmaku::new(kind, params, self.env.clone()));
        self.pool.borrow_mut().push(danmaku.clone());
        danmaku
    }

    /// Test every live danmaku against the player once
    ///
    /// Hits are reported to `Player::hit_by_danmaku`. Afterwards the player
    /// commits its position for next frame's sweep.
    pub fn update(&self, player: &Player) {
        let mut i = 0;
        loop {
            let danmaku = match self.pool.borrow().get(i) {
                Some(d) => d.clone(),
                None => break,
            };
            i += 1;
            if danmaku.is_destroyed() {
                continue;
            }
            if danmaku.test_hit(player) {
                player.hit_by_danmaku(&danmaku);
            }
        }
        player.commit_last_pos();
    }

    /// Sweep destroyed entries out now
    pub fn compact(&self) {
        self.pool.borrow_mut().compact();
    }

    /// Erase every live danmaku that allows it; returns how many went
    pub fn erase_all(&self) -> usize {
        self.live().iter().filter(|d| d.erase()).count()
    }

    /// Snapshot of live danmaku
    pub fn live(&self) -> Vec<Rc<Danmaku>> {
        self.pool.borrow().live().cloned().collect()
    }

    pub fn live_count(&self) -> usize {
        self.pool.borrow().live_count()
    }

    /// Stored entries, destroyed ones included
    pub fn len(&self) -> usize {
        self.pool.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.borrow().is_empty()
    }
}
