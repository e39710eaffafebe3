//! Debounced posture classifier.
//!
//! The first sample after [`PostureClassifier::activate`] becomes the
//! baseline.  Every later sample is compared against it per axis pair:
//! roll for left/right, pitch for front/hind.  A lean is only reported
//! after `min_samples` consecutive samples deviate by strictly more than
//! the axis threshold.  When both axes qualify the left/right axis wins
//! ties.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// Discrete posture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureState {
    #[default]
    Balanced,
    Left,
    Right,
    Front,
    Hind,
}

/// One fused orientation reading (degrees).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationSample {
    pub heading_deg: f32,
    pub roll_deg: f32,
    pub pitch_deg: f32,
}

/// Reference orientation captured at window activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureBaseline {
    pub roll0: f32,
    pub pitch0: f32,
}

/// Result of classifying one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureOutput {
    pub state: PostureState,
    /// True only when `state` differs from the previous sample's result.
    pub changed: bool,
    pub roll_delta: f32,
    pub pitch_delta: f32,
}

/// Last posture plus the raw angles it was derived from.  This is what
/// the status composer sees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureSnapshot {
    pub state: PostureState,
    pub roll_deg: f32,
    pub pitch_deg: f32,
}

impl PostureSnapshot {
    pub const EMPTY: Self = Self {
        state: PostureState::Balanced,
        roll_deg: 0.0,
        pitch_deg: 0.0,
    };
}

impl Default for PostureSnapshot {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Run-length of consecutive deviating samples on one axis pair.
#[derive(Debug, Clone, Copy, Default)]
struct AxisRun {
    count: u8,
    negative: bool,
}

impl AxisRun {
    fn observe(&mut self, delta: f32, threshold: f32) {
        if delta.abs() > threshold {
            self.count = self.count.saturating_add(1);
            self.negative = delta < 0.0;
        } else {
            self.count = 0;
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

pub struct PostureClassifier {
    lr_threshold_deg: f32,
    fh_threshold_deg: f32,
    min_samples: u8,
    baseline: Option<PostureBaseline>,
    lr: AxisRun,
    fh: AxisRun,
    state: PostureState,
}

impl PostureClassifier {
    pub fn new(lr_threshold_deg: f32, fh_threshold_deg: f32, min_samples: u8) -> Self {
        Self {
            lr_threshold_deg,
            fh_threshold_deg,
            min_samples,
            baseline: None,
            lr: AxisRun::default(),
            fh: AxisRun::default(),
            state: PostureState::Balanced,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.lr_threshold_deg,
            config.fh_threshold_deg,
            config.posture_min_samples,
        )
    }

    /// Start a new sampling window: the next sample re-baselines.
    pub fn activate(&mut self) {
        self.baseline = None;
        self.lr.reset();
        self.fh.reset();
    }

    pub fn classify(&mut self, sample: &OrientationSample) -> PostureOutput {
        let Some(baseline) = self.baseline else {
            self.baseline = Some(PostureBaseline {
                roll0: sample.roll_deg,
                pitch0: sample.pitch_deg,
            });
            self.lr.reset();
            self.fh.reset();
            return self.settle(PostureState::Balanced, 0.0, 0.0);
        };

        let roll_delta = sample.roll_deg - baseline.roll0;
        let pitch_delta = sample.pitch_deg - baseline.pitch0;
        self.lr.observe(roll_delta, self.lr_threshold_deg);
        self.fh.observe(pitch_delta, self.fh_threshold_deg);

        let next = if self.lr.count >= self.min_samples && self.lr.count >= self.fh.count {
            if self.lr.negative {
                PostureState::Left
            } else {
                PostureState::Right
            }
        } else if self.fh.count >= self.min_samples {
            if self.fh.negative {
                PostureState::Front
            } else {
                PostureState::Hind
            }
        } else {
            PostureState::Balanced
        };

        self.settle(next, roll_delta, pitch_delta)
    }

    fn settle(&mut self, next: PostureState, roll_delta: f32, pitch_delta: f32) -> PostureOutput {
        let changed = next != self.state;
        self.state = next;
        PostureOutput {
            state: next,
            changed,
            roll_delta,
            pitch_delta,
        }
    }

    pub fn state(&self) -> PostureState {
        self.state
    }

    pub fn baseline(&self) -> Option<PostureBaseline> {
        self.baseline
    }

    /// (left/right, front/hind) run lengths.
    pub fn counters(&self) -> (u8, u8) {
        (self.lr.count, self.fh.count)
    }
}
