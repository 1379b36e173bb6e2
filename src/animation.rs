//! Frame-driven property animation used when native transitions are unavailable.

use std::f32::consts::PI;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Half-cosine ease-in-out.
    #[default]
    Swing,
}

impl Easing {
    pub fn apply(self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => p,
            Self::Swing => 0.5 - (p * PI).cos() / 2.0,
        }
    }
}

/// Interpolates a single value from `from` to `to` over `duration`.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f32,
    to: f32,
    started_at: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, started_at: Instant, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            started_at,
            duration,
            easing,
        }
    }

    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Value at `now`; exactly `to` once the tween has finished.
    pub fn sample(&self, now: Instant) -> f32 {
        if self.is_complete(now) {
            return self.to;
        }
        let eased = self.easing.apply(self.progress(now));
        self.from + (self.to - self.from) * eased
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }
}
