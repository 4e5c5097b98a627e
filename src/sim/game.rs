//! Game session: owns the scheduler, input, board, danmaku pool and RNG
//!
//! One `Game` is one isolated session. Nothing here is global, so several
//! sessions (or tests) can run side by side.

use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;

use super::board::Board;
use super::danmaku::{Danmaku, DanmakuEnv, DanmakuKind, DanmakuPool, SpawnParams};
use super::driver::FrameDriver;
use super::fps::FpsMeter;
use super::player::{Player, PlayerContext};
use crate::consts::{PRIORITY_COLLISION, PRIORITY_INPUT, PRIORITY_PLAYER};
use crate::error::EngineError;
use crate::input::Input;
use crate::platform::{HeadlessStage, SilentSoundBank, SoundBank, Stage};
use crate::rng::Rng;
use crate::sched::{LoopController, LoopOptions, Scheduler, Sleep, Task};
use crate::settings::EngineConfig;

/// Debug switches shared with the player
#[derive(Debug, Default)]
pub struct DebugTools {
    god_mode: Cell<bool>,
    die_count: Cell<u32>,
}

impl DebugTools {
    pub fn god_mode(&self) -> bool {
        self.god_mode.get()
    }

    pub fn set_god_mode(&self, on: bool) {
        self.god_mode.set(on);
    }

    /// Deaths absorbed by god mode
    pub fn die_count(&self) -> u32 {
        self.die_count.get()
    }

    /// Count one absorbed death, returning the new total
    pub(crate) fn record_death(&self) -> u32 {
        let n = self.die_count.get() + 1;
        self.die_count.set(n);
        n
    }
}

/// One running session
pub struct Game {
    config: EngineConfig,
    scheduler: Scheduler,
    input: Rc<Input>,
    board: Rc<Board>,
    stage: Rc<dyn Stage>,
    sounds: Rc<dyn SoundBank>,
    rng: RefCell<Rng>,
    debug: Rc<DebugTools>,
    danmaku_pool: Rc<DanmakuPool>,
    fps: RefCell<FpsMeter>,
    driver: RefCell<FrameDriver>,
}

impl Game {
    /// Start a session on the given stage and sound bank
    pub fn launch(config: EngineConfig, stage: Rc<dyn Stage>, sounds: Rc<dyn SoundBank>) -> Self {
        let scheduler = Scheduler::new();
        let input = Rc::new(Input::new());
        let board = Rc::new(Board::new(config.board_width, config.board_height));
        let rng = match config.seed {
            Some(seed) => Rng::new(seed),
            None => Rng::from_entropy(),
        };
        let debug = Rc::new(DebugTools::default());
        debug.set_god_mode(config.god_mode);

        let env = DanmakuEnv::new(board.clone(), scheduler.clone(), stage.clone(), rand::random());
        let danmaku_pool = Rc::new(DanmakuPool::new(env));

        if config.auto_update_input {
            let input = input.clone();
            scheduler.forever(move |_| input.update(1.0), LoopOptions::new().priority(PRIORITY_INPUT));
        }

        log::info!(
            "Game launched: seed={}, board={}x{}, fps={}",
            rng.seed(),
            config.board_width,
            config.board_height,
            config.target_fps
        );

        Self {
            driver: RefCell::new(FrameDriver::new(config.target_fps)),
            config,
            scheduler,
            input,
            board,
            stage,
            sounds,
            rng: RefCell::new(rng),
            debug,
            danmaku_pool,
            fps: RefCell::new(FpsMeter::new()),
        }
    }

    /// Session with no rendering or audio
    pub fn headless(config: EngineConfig) -> Self {
        Self::launch(config, Rc::new(HeadlessStage::new()), Rc::new(SilentSoundBank::new()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn input(&self) -> &Rc<Input> {
        &self.input
    }

    pub fn board(&self) -> &Rc<Board> {
        &self.board
    }

    pub fn danmaku_pool(&self) -> &Rc<DanmakuPool> {
        &self.danmaku_pool
    }

    pub fn debug(&self) -> &Rc<DebugTools> {
        &self.debug
    }

    /// Gameplay RNG
    pub fn rng(&self) -> RefMut<'_, Rng> {
        self.rng.borrow_mut()
    }

    /// Run `callback` every tick until stopped
    pub fn forever(&self, callback: impl FnMut(&LoopController) + 'static, options: LoopOptions) -> LoopController {
        self.scheduler.forever(callback, options)
    }

    /// Resume `task` every tick until it finishes
    pub fn co_do(&self, task: impl Task + 'static, options: LoopOptions) -> LoopController {
        self.scheduler.co_do(task, options)
    }

    /// Task that waits `frames` frames of scaled time
    pub fn sleep(&self, frames: f32) -> Sleep {
        Sleep::new(frames)
    }

    /// Create a danmaku and enter it into the collision pass
    pub fn make_danmaku(&self, kind: DanmakuKind, params: SpawnParams) -> Rc<Danmaku> {
        self.danmaku_pool.spawn(kind, params)
    }

    /// Create the player and register its update and collision loops
    pub fn spawn_player(&self) -> Result<Rc<Player>, EngineError> {
        let config = self.config.player.clone();
        let auto_update = config.auto_update;
        let auto_collide = config.auto_collide;
        let player = Player::new(
            config,
            PlayerContext {
                scheduler: self.scheduler.clone(),
                input: self.input.clone(),
                board: self.board.clone(),
                stage: self.stage.clone(),
                sounds: self.sounds.clone(),
                debug: self.debug.clone(),
                policy: self.config.invalid_state_policy,
            },
        )?;

        if auto_update {
            let p = player.clone();
            self.scheduler.forever(
                move |_| p.update(),
                LoopOptions::new().priority(PRIORITY_PLAYER).refs(player.clone()),
            );
        }
        if auto_collide {
            let p = player.clone();
            let pool = self.danmaku_pool.clone();
            self.scheduler.forever(
                move |_| pool.update(&p),
                LoopOptions::new().priority(PRIORITY_COLLISION).refs(player.clone()),
            );
        }
        Ok(player)
    }

    /// Run exactly one tick
    pub fn tick(&self) -> Result<(), EngineError> {
        self.scheduler.tick()
    }

    /// Host frame: record the timestamp for the FPS readout, then run as
    /// many fixed ticks as `dt` seconds cover
    pub fn frame(&self, dt: f32, now_ms: f64) -> Result<u32, EngineError> {
        self.fps.borrow_mut().record(now_ms);
        self.driver.borrow_mut().advance(dt, || self.scheduler.tick())
    }

    pub fn time_scale(&self) -> f32 {
        self.scheduler.time_scale()
    }

    pub fn set_time_scale(&self, time_scale: f32) -> Result<(), EngineError> {
        self.scheduler.set_time_scale(time_scale)
    }

    pub fn fps(&self) -> f32 {
        self.fps.borrow().fps()
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        // Loops hold entity handles and entities hold the scheduler
        self.scheduler.stop_all();
    }
}
