//! Frame clock feeding the stepper
//!
//! Converts display-refresh timestamps into bounded step deltas.

use crate::consts::MAX_FRAME_DT;

/// Turns animation timestamps (milliseconds) into step deltas (seconds)
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous timestamp so the next tick yields 0
    pub fn start(&mut self) {
        self.last_ms = None;
    }

    /// Delta since the previous tick, clamped to `[0, MAX_FRAME_DT]`
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => {
                ((now_ms - last).clamp(0.0, f64::from(MAX_FRAME_DT) * 1000.0) / 1000.0) as f32
            }
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }
}
