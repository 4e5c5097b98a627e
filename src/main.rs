//! Danmaku Engine entry point
//!
//! Runs a short headless session: a rotating spiral and aimed rings of
//! danmaku against a player that dodges along a scripted path.
//! Pass a JSON config path as the first argument to override defaults.

use std::f32::consts::TAU;
use std::rc::Rc;

use danmaku_engine::sched::{Sequence, frames};
use danmaku_engine::sim::{Danmaku, DanmakuPool, DanmakuStyle, SpawnParams};
use danmaku_engine::{DanmakuKind, EngineConfig, EngineError, Game, Key, LoopOptions, Player, Scheduler};

/// Demo length in host frames
const DEMO_FRAMES: u32 = 900;

fn main() {
    env_logger::init();
    log::info!("Danmaku Engine (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EngineConfig {
            seed: Some(20_240_101),
            god_mode: true,
            ..EngineConfig::default()
        },
    };

    if let Err(e) = run(config) {
        log::error!("Demo aborted: {}", e);
        std::process::exit(1);
    }
}

fn run(config: EngineConfig) -> Result<(), EngineError> {
    let game = Game::headless(config);
    let player = game.spawn_player()?;

    spiral(&game);
    aimed_rings(&game, &player);
    scripted_dodge(&game);

    let dt = 1.0 / game.config().target_fps;
    let mut ticks = 0;
    for frame in 0..DEMO_FRAMES {
        ticks += game.frame(dt, frame as f64 * 1000.0 * dt as f64)?;
        if frame % 180 == 0 {
            log::info!(
                "frame {}: {} danmaku live, player {} at ({:.1}, {:.1})",
                frame,
                game.danmaku_pool().live_count(),
                player.state().name(),
                player.pos().x,
                player.pos().y
            );
        }
    }

    log::info!(
        "Done: {} ticks, {:.2} fps, {} deaths absorbed, {} danmaku still live",
        ticks,
        game.fps(),
        game.debug().die_count(),
        game.danmaku_pool().live_count()
    );
    Ok(())
}

/// Move a danmaku every tick until it leaves the board
fn drive(scheduler: &Scheduler, danmaku: Rc<Danmaku>) {
    let d = danmaku.clone();
    scheduler.forever(
        move |lp| {
            d.advance();
            d.boundary_delete_with(lp);
        },
        LoopOptions::new().owns(danmaku),
    );
}

/// Four arms rotating a few degrees per frame
fn spiral(game: &Game) {
    let pool: Rc<DanmakuPool> = game.danmaku_pool().clone();
    let scheduler = game.scheduler().clone();
    let style = DanmakuStyle::new("rice", 200.0);
    game.co_do(
        Sequence::new().wait(30.0).then(frames(600, move |_, i| {
            for arm in 0..4 {
                let rotation = i as f32 * 0.07 + arm as f32 * TAU / 4.0;
                let d = pool.spawn(
                    DanmakuKind::Rice,
                    SpawnParams::at(glam::Vec2::new(0.0, -120.0))
                        .heading(rotation, 2.5)
                        .style(style.clone()),
                );
                drive(&scheduler, d);
            }
        })),
        LoopOptions::new(),
    );
}

/// A ring aimed at the player every second, while the player lives
fn aimed_rings(game: &Game, player: &Rc<Player>) {
    let pool = game.danmaku_pool().clone();
    let scheduler = game.scheduler().clone();
    let target = player.clone();
    let mut rng = game.rng().clone();
    game.forever(
        move |lp| {
            if lp.clock() as u32 % 60 != 0 {
                return;
            }
            let origin = glam::Vec2::new(rng.float(-150.0, 150.0), -180.0);
            let count = rng.int(8, 16);
            let aim = (target.pos() - origin).to_angle();
            for k in 0..count {
                let d = pool.spawn(
                    DanmakuKind::Ball,
                    SpawnParams::at(origin).heading(aim + k as f32 * TAU / count as f32, 3.0),
                );
                drive(&scheduler, d);
            }
        },
        LoopOptions::new().refs(player.clone()),
    );
}

/// Hold left, then right, then let go
fn scripted_dodge(game: &Game) {
    let input = game.input().clone();
    let (a, b, c) = (input.clone(), input.clone(), input);
    game.co_do(
        Sequence::new()
            .wait(120.0)
            .then_do(move |_| a.press(Key::ArrowLeft))
            .wait(60.0)
            .then_do(move |_| {
                b.release(Key::ArrowLeft);
                b.press(Key::ArrowRight);
                b.press(Key::ShiftLeft);
            })
            .wait(120.0)
            .then_do(move |_| {
                c.release(Key::ArrowRight);
                c.release(Key::ShiftLeft);
            }),
        LoopOptions::new(),
    );
}
