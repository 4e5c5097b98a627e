//! Fixed-timestep frame driver
//!
//! Hosts call `FrameDriver::advance` with the wall-clock time since their
//! last frame; the driver turns it into a whole number of scheduler ticks.

use crate::consts::{MAX_SUBSTEPS, TARGET_FPS};

/// Longest host frame considered, in seconds
const MAX_FRAME_TIME: f32 = 0.1;

/// Accumulator that converts host time into fixed ticks
#[derive(Debug, Clone)]
pub struct FrameDriver {
    step: f32,
    accumulator: f32,
    max_substeps: u32,
    dropped: u32,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(TARGET_FPS)
    }
}

impl FrameDriver {
    pub fn new(target_fps: f32) -> Self {
        Self {
            step: 1.0 / target_fps.max(1.0),
            accumulator: 0.0,
            max_substeps: MAX_SUBSTEPS,
            dropped: 0,
        }
    }

    /// Seconds per tick
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Ticks skipped so far because the host fell behind
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Run as many ticks as `dt` seconds cover, at most `MAX_SUBSTEPS`
    ///
    /// Returns the number of ticks run. A backlog beyond the cap is dropped
    /// rather than carried, so a stalled host does not fast-forward later.
    pub fn advance<E>(&mut self, dt: f32, mut tick: impl FnMut() -> Result<(), E>) -> Result<u32, E> {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_TIME);

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            tick()?;
            self.accumulator -= self.step;
            substeps += 1;
        }

        if self.accumulator >= self.step {
            let behind = (self.accumulator / self.step) as u32;
            log::warn!("frame driver fell behind, dropping {} ticks", behind);
            self.dropped += behind;
            self.accumulator %= self.step;
        }
        Ok(substeps)
    }
}
