//! The play-field
//!
//! Centered on the origin, spanning [-width, width] x [-height, height]
//! where width/height are half extents. Resizable at runtime.

use std::cell::Cell;

use glam::Vec2;

use crate::consts::{BOUNDARY_MARGIN, BOUNDARY_RADIUS_FACTOR};

/// Bounded rectangular play-field
#[derive(Debug)]
pub struct Board {
    width: Cell<f32>,
    height: Cell<f32>,
}

impl Board {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            width: Cell::new(half_width),
            height: Cell::new(half_height),
        }
    }

    /// Half width
    pub fn width(&self) -> f32 {
        self.width.get()
    }

    /// Half height
    pub fn height(&self) -> f32 {
        self.height.get()
    }

    pub fn resize(&self, half_width: f32, half_height: f32) {
        self.width.set(half_width);
        self.height.set(half_height);
    }

    /// Whether a point lies on the board
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x.abs() <= self.width() && pos.y.abs() <= self.height()
    }

    /// Whether a danmaku at `pos` with hit radius `radius` is still in play
    ///
    /// Shots get a margin of 5 plus 1.5 hit radii past the edge so large
    /// sprites leave the screen before they vanish.
    pub fn contains_danmaku(&self, pos: Vec2, radius: f32) -> bool {
        let margin = BOUNDARY_MARGIN + radius * BOUNDARY_RADIUS_FACTOR;
        pos.x.abs() <= self.width() + margin && pos.y.abs() <= self.height() + margin
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(crate::consts::BOARD_HALF_WIDTH, crate::consts::BOARD_HALF_HEIGHT)
    }
}
