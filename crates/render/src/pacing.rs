use std::time::{Duration, Instant};

/// Per-frame timing against a nominal target interval.
///
/// The loop free-runs: the leftover budget is reported for telemetry but
/// never slept away.
#[derive(Debug)]
pub struct FramePacer {
    target: Duration,
    last: Option<Instant>,
}

/// Timing for one completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    /// Wall time since the previous frame.
    pub delta: Duration,
    /// Unused share of the target interval (zero when over budget).
    pub leftover: Duration,
}

impl FramePacer {
    /// Nominal 60 Hz target.
    pub fn new() -> Self {
        Self::with_target(Duration::from_secs_f64(1.0 / 60.0))
    }

    pub fn with_target(target: Duration) -> Self {
        Self { target, last: None }
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    /// Record a frame boundary. The first call only arms the pacer and
    /// reports a zero delta.
    pub fn frame(&mut self, now: Instant) -> FrameBudget {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        FrameBudget {
            delta,
            leftover: self.target.saturating_sub(delta),
        }
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames-per-second readout integrated over one-second windows.
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            window_start: None,
            frames: 0,
            fps: 0,
        }
    }

    /// Count one frame; returns the most recent completed-window reading.
    pub fn tick(&mut self, now: Instant) -> u32 {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = (self.frames as f64 / elapsed.as_secs_f64()).round() as u32;
            self.frames = 0;
            self.window_start = Some(now);
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leftover_shrinks_with_frame_cost() {
        let mut pacer = FramePacer::with_target(Duration::from_millis(16));
        let t0 = Instant::now();
        pacer.frame(t0);
        let budget = pacer.frame(t0 + Duration::from_millis(10));
        assert_eq!(budget.delta, Duration::from_millis(10));
        assert_eq!(budget.leftover, Duration::from_millis(6));
    }

    #[test]
    fn over_budget_frame_reports_zero_leftover() {
        let mut pacer = FramePacer::with_target(Duration::from_millis(16));
        let t0 = Instant::now();
        pacer.frame(t0);
        let budget = pacer.frame(t0 + Duration::from_millis(40));
        assert_eq!(budget.leftover, Duration::ZERO);
    }

    #[test]
    fn first_frame_arms_without_a_delta() {
        let mut pacer = FramePacer::new();
        let budget = pacer.frame(Instant::now());
        assert_eq!(budget.delta, Duration::ZERO);
    }

    #[test]
    fn fps_reads_zero_until_a_window_completes() {
        let mut counter = FpsCounter::new();
        let t0 = Instant::now();
        for i in 0..30 {
            assert_eq!(counter.tick(t0 + Duration::from_millis(i * 10)), 0);
        }
    }

    #[test]
    fn fps_integrates_over_one_second() {
        let mut counter = FpsCounter::new();
        let t0 = Instant::now();
        let mut fps = 0;
        for i in 0..=60 {
            fps = counter.tick(t0 + Duration::from_millis(i * 1000 / 60));
        }
        assert!((59..=61).contains(&fps), "unexpected fps {fps}");
    }
}
