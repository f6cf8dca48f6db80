//! Per-ability cooldown tracker.

/// Counts down the cooldown of one ability.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkillCd {
    duration: f32,
    remaining: f32,
}

impl SkillCd {
    /// A ready tracker for a cooldown of `duration` seconds. Negative
    /// durations are clamped to zero.
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            remaining: 0.0,
        }
    }

    /// Enters cooldown for the full duration.
    pub fn start(&mut self) {
        self.remaining = self.duration;
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
    }

    pub fn is_cooling(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }
}
