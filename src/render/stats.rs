//! Frame rate sampling for the metrics report.

use std::collections::VecDeque;

use crate::constants::FPS_SAMPLE_WINDOW_MS;

/// Rolling frames-per-second over the last sample window
#[derive(Debug, Default)]
pub struct FpsCounter {
    frames: VecDeque<f64>,
}

impl FpsCounter {
    pub fn record(&mut self, now_ms: f64) {
        self.frames.push_back(now_ms);
        while self
            .frames
            .front()
            .is_some_and(|&t| now_ms - t > FPS_SAMPLE_WINDOW_MS)
        {
            self.frames.pop_front();
        }
    }

    /// Frames recorded within the window ending at the most recent frame
    pub fn fps(&self) -> f32 {
        (self.frames.len() as f64 * 1000.0 / FPS_SAMPLE_WINDOW_MS) as f32
    }

    pub fn reset(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_frames_per_second() {
        let mut counter = FpsCounter::default();
        for i in 0..120 {
            counter.record(i as f64 * 1000.0 / 60.0);
        }
        assert!((counter.fps() - 60.0).abs() <= 1.0);
    }

    #[test]
    fn test_old_frames_fall_out_of_window() {
        let mut counter = FpsCounter::default();
        for i in 0..10 {
            counter.record(i as f64);
        }
        counter.record(5000.0);
        assert_eq!(counter.fps(), 1.0);
    }
}
