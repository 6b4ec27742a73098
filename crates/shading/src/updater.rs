//! Frame-driven phase accumulators that animate float uniforms.
use crate::error::ShadingError;
use crate::uniforms::{Uniform, UniformKind, UniformSet, UniformValue};

/// What happens when the phase reaches the upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Jump straight back to the lower bound, dropping any overshoot.
    #[default]
    Reset,
    /// Keep the overshoot: `lower + (phase - lower) mod (upper - lower)`.
    Modulo,
}

/// Advances `phase += rate * dt` every tick and wraps it into
/// `[lower, upper)`, writing the result into a float uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseUpdater {
    target: Uniform,
    rate: f32,
    lower: f32,
    upper: f32,
    phase: f32,
    wrap: WrapMode,
    wraps: u64,
}

impl PhaseUpdater {
    /// Creates an updater starting at `lower`.
    pub fn new(target: Uniform, rate: f32, lower: f32, upper: f32) -> Result<Self, ShadingError> {
        if target.kind() != UniformKind::Float {
            return Err(ShadingError::UniformType {
                uniform: target,
                expected: UniformKind::Float,
                found: target.kind(),
            });
        }
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(ShadingError::InvalidUpdater(format!(
                "bounds must be finite with lower < upper, got [{lower}, {upper})"
            )));
        }
        if !rate.is_finite() || rate < 0.0 {
            return Err(ShadingError::InvalidUpdater(format!(
                "rate must be finite and non-negative, got {rate}"
            )));
        }
        Ok(Self {
            target,
            rate,
            lower,
            upper,
            phase: lower,
            wrap: WrapMode::default(),
            wraps: 0,
        })
    }

    /// Starts the phase somewhere other than the lower bound.
    pub fn with_initial(mut self, phase: f32) -> Result<Self, ShadingError> {
        if !(phase >= self.lower && phase < self.upper) {
            return Err(ShadingError::InvalidUpdater(format!(
                "initial phase {phase} lies outside [{}, {})",
                self.lower, self.upper
            )));
        }
        self.phase = phase;
        Ok(self)
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn target(&self) -> Uniform {
        self.target
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.lower, self.upper)
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap
    }

    /// Number of wrap corrections applied so far.
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    /// Advances by `dt` seconds and returns the new phase. Large steps are not
    /// clamped; a long pause simply lands wherever the wrap rule puts it.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let next = self.phase + self.rate * dt;
        self.phase = if next >= self.upper {
            self.wraps += 1;
            match self.wrap {
                WrapMode::Reset => self.lower,
                WrapMode::Modulo => self.fold(next),
            }
        } else {
            next
        };
        self.phase
    }

    /// Moves the phase to `value`, folded into `[lower, upper)`, and keeps
    /// advancing from there. Non-finite values restart at the lower bound.
    pub fn reseed(&mut self, value: f32) -> f32 {
        self.phase = if value >= self.lower && value < self.upper {
            value
        } else {
            self.fold(value)
        };
        self.phase
    }

    fn fold(&self, value: f32) -> f32 {
        let span = self.upper - self.lower;
        let wrapped = self.lower + (value - self.lower).rem_euclid(span);
        // overflowed steps give NaN; rounding can land on the excluded bound
        if !wrapped.is_finite() || wrapped >= self.upper {
            self.lower
        } else {
            wrapped
        }
    }

    /// Writes the current phase into the target slot.
    pub(crate) fn write(&self, uniforms: &mut UniformSet) -> Result<(), ShadingError> {
        uniforms.set(self.target, UniformValue::Float(self.phase))
    }
}
