//! Frame-rate readout from recent frame timestamps

use std::collections::VecDeque;

use crate::consts::TARGET_FPS;

/// Frames averaged over
const WINDOW: usize = 10;

/// Rolling FPS estimate
#[derive(Debug, Clone, Default)]
pub struct FpsMeter {
    /// Host timestamps in milliseconds, oldest first
    stamps: VecDeque<f64>,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one rendered frame at `now_ms`
    pub fn record(&mut self, now_ms: f64) {
        self.stamps.push_back(now_ms);
        while self.stamps.len() > WINDOW + 1 {
            self.stamps.pop_front();
        }
    }

    /// Frames per second over the last 10 frames, to two decimals
    ///
    /// Reports the target rate until enough frames have been seen.
    pub fn fps(&self) -> f32 {
        let (Some(first), Some(last)) = (self.stamps.front(), self.stamps.back()) else {
            return TARGET_FPS;
        };
        let span = last - first;
        if self.stamps.len() <= WINDOW || span <= 0.0 {
            return TARGET_FPS;
        }
        ((1000.0 * WINDOW as f64 / span * 100.0).round() / 100.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_until_window_full() {
        let mut meter = FpsMeter::new();
        assert_eq!(meter.fps(), 60.0);
        for i in 0..10 {
            meter.record(i as f64 * 20.0);
        }
        assert_eq!(meter.fps(), 60.0);
    }

    #[test]
    fn test_steady_rate() {
        let mut meter = FpsMeter::new();
        for i in 0..30 {
            meter.record(i as f64 * 20.0);
        }
        assert_eq!(meter.fps(), 50.0);
    }

    #[test]
    fn test_rounds_to_hundredths() {
        let mut meter = FpsMeter::new();
        for i in 0..11 {
            meter.record(i as f64 * 1000.0 / 60.0);
        }
        assert!((meter.fps() - 60.0).abs() < 0.011);
        meter.record(10.0 * 1000.0 / 60.0 + 30.0);
        assert!(meter.fps() < 60.0);
    }
}
