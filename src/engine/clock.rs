//! Frame clock
//!
//! Animation frames arrive at display rate (60-144 Hz); logic ticks are
//! capped to a target interval. The clock owns no platform resources itself,
//! the engine holds the single frame registration through the lifecycle.

use crate::consts::MAX_DT;

#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Minimum time between logic ticks (ms); 0 = every frame
    interval_ms: f64,
    /// Cadence anchor; None until the first frame after start/resume
    last: Option<f64>,
    running: bool,
    paused: bool,
}

impl FrameClock {
    /// Clock capped at `target_fps` logic ticks per second
    pub fn new(target_fps: f32) -> Self {
        let interval_ms = if target_fps > 0.0 {
            1000.0 / target_fps as f64
        } else {
            0.0
        };
        Self {
            interval_ms,
            last: None,
            running: false,
            paused: false,
        }
    }

    /// Clock that ticks on every animation frame
    pub fn uncapped() -> Self {
        Self::new(0.0)
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Begin ticking. Returns false if already running (caller must not
    /// register a second frame callback).
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last = None;
        true
    }

    /// Stop ticking. Idempotent; returns true only on the running -> stopped edge.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.last = None;
        was_running
    }

    /// Short-circuit ticks without giving up the frame registration.
    /// Resuming re-anchors the cadence so the paused span is not reported as dt.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused && !paused {
            self.last = None;
        }
        self.paused = paused;
    }

    /// Feed an animation-frame timestamp (ms). Returns the clamped dt in
    /// seconds when a logic tick is due.
    pub fn on_frame(&mut self, timestamp: f64) -> Option<f32> {
        if !self.running || self.paused {
            return None;
        }

        let Some(last) = self.last else {
            self.last = Some(timestamp);
            return None;
        };

        let elapsed = timestamp - last;
        if elapsed <= self.interval_ms || elapsed <= 0.0 {
            return None;
        }

        // Keep the remainder so the cadence does not drift
        self.last = Some(if self.interval_ms > 0.0 {
            timestamp - elapsed % self.interval_ms
        } else {
            timestamp
        });

        Some(((elapsed / 1000.0) as f32).min(MAX_DT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frames(clock: &mut FrameClock, hz: f64, seconds: f64) -> usize {
        let step = 1000.0 / hz;
        let frames = (seconds * hz) as usize;
        (0..=frames)
            .filter(|i| clock.on_frame(*i as f64 * step).is_some())
            .count()
    }

    #[test]
    fn test_cap_on_high_refresh_display() {
        let mut clock = FrameClock::new(30.0);
        clock.start();
        let ticks = run_frames(&mut clock, 144.0, 1.0);
        assert!((28..=31).contains(&ticks), "got {ticks} ticks");
    }

    #[test]
    fn test_uncapped_ticks_every_frame() {
        let mut clock = FrameClock::uncapped();
        clock.start();
        // First frame only anchors
        assert_eq!(run_frames(&mut clock, 60.0, 1.0), 60);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut clock = FrameClock::new(12.0);
        assert!(!clock.stop());
        assert!(clock.start());
        assert!(!clock.start());
        assert!(clock.stop());
        assert!(!clock.stop());
        assert!(!clock.is_running());
        assert_eq!(clock.on_frame(1000.0), None);
    }

    #[test]
    fn test_pause_skips_and_resume_reanchors() {
        let mut clock = FrameClock::new(30.0);
        clock.start();
        clock.on_frame(0.0);
        assert!(clock.on_frame(40.0).is_some());

        clock.set_paused(true);
        assert_eq!(clock.on_frame(80.0), None);
        assert_eq!(clock.on_frame(5000.0), None);

        clock.set_paused(false);
        // Re-anchor frame, then a normal-sized dt
        assert_eq!(clock.on_frame(5010.0), None);
        let dt = clock.on_frame(5050.0).unwrap();
        assert!((dt - 0.04).abs() < 1e-4);
    }

    #[test]
    fn test_dt_is_clamped_after_backgrounding() {
        let mut clock = FrameClock::uncapped();
        clock.start();
        clock.on_frame(0.0);
        let dt = clock.on_frame(30_000.0).unwrap();
        assert_eq!(dt, MAX_DT);
    }
}
