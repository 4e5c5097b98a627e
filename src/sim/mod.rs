//! Simulation module
//!
//! Everything that happens inside a frame lives here:
//! - Entity pools with amortized compaction
//! - The board and its boundary rules
//! - Danmaku entities, their pool and the swept collision pass
//! - The player state machine
//! - The `Game` session that wires them to the scheduler

pub mod board;
pub mod collision;
pub mod danmaku;
pub mod driver;
pub mod fps;
pub mod game;
pub mod player;
pub mod pool;

pub use board::Board;
pub use collision::{Motion, point_segment_dist2, swept_hit};
pub use danmaku::{Danmaku, DanmakuEnv, DanmakuKind, DanmakuPool, DanmakuStyle, EraseFlavour, SpawnParams};
pub use driver::FrameDriver;
pub use fps::FpsMeter;
pub use game::{DebugTools, Game};
pub use player::{Player, PlayerContext, PlayerState};
pub use pool::EntityPool;
