//! Fragment color policies.
//!
//! Both policies are pure functions of the interpolated varying and the
//! committed [`FrameUniforms`]; evaluating the same fragment twice within a
//! frame always yields the same color.
use glam::{Vec3, Vec4};

use crate::error::ShadingError;
use crate::uniforms::{FrameUniforms, Uniform};
use crate::vertex::VertexProgram;

/// Screen-forward reference axis in view space.
pub const SCREEN_FORWARD: Vec3 = Vec3::Z;

/// Exponent of the curve that fades the highlight into the gradient.
const BAND_CURVE: f32 = 0.5;

/// Vertical red/green gradient with a moving highlight band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandHighlight {
    /// Added to the world-space y before normalising into the gradient.
    pub gradient_offset: f32,
    /// Distance over which the gradient runs from green to red.
    pub gradient_extent: f32,
}

impl Default for BandHighlight {
    fn default() -> Self {
        Self {
            gradient_offset: 25.0,
            gradient_extent: 50.0,
        }
    }
}

impl BandHighlight {
    pub const REQUIRED: &'static [Uniform] =
        &[Uniform::BandY, Uniform::BandWidth, Uniform::Highlight];

    /// `(t, 1 - t, 0, 1)` with `t` the normalised height. Not clamped.
    pub fn baseline(&self, height: f32) -> Vec4 {
        let t = (height + self.gradient_offset) / self.gradient_extent;
        Vec4::new(t, 1.0 - t, 0.0, 1.0)
    }

    /// Mixing weight of the gradient inside `[band_y, band_y + band_width)`,
    /// `None` outside. A non-positive width describes an empty band.
    pub fn blend_factor(height: f32, band_y: f32, band_width: f32) -> Option<f32> {
        if band_width > 0.0 && height >= band_y && height < band_y + band_width {
            Some(((height - band_y) / band_width).powf(BAND_CURVE))
        } else {
            None
        }
    }

    pub fn shade(&self, world_position: Vec3, uniforms: &FrameUniforms) -> Vec4 {
        let baseline = self.baseline(world_position.y);
        match Self::blend_factor(world_position.y, uniforms.band_y(), uniforms.band_width()) {
            Some(per) => uniforms
                .highlight()
                .lerp(baseline.truncate(), per)
                .extend(baseline.w),
            None => baseline,
        }
    }

    fn validate(&self) -> Result<(), ShadingError> {
        if !self.gradient_offset.is_finite()
            || !self.gradient_extent.is_finite()
            || self.gradient_extent == 0.0
        {
            return Err(ShadingError::InvalidProgram(format!(
                "band gradient needs a finite offset and non-zero extent, got offset {} extent {}",
                self.gradient_offset, self.gradient_extent
            )));
        }
        Ok(())
    }
}

/// Rim transparency driven by the angle between the normal and a fixed axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFalloff {
    pub view_axis: Vec3,
}

impl Default for ViewFalloff {
    fn default() -> Self {
        Self {
            view_axis: SCREEN_FORWARD,
        }
    }
}

impl ViewFalloff {
    pub const REQUIRED: &'static [Uniform] = &[Uniform::Color, Uniform::FalloffPower];

    /// `(1 - |n · axis|)^power`, saturated into `[0, 1]` like a unorm target.
    /// The exponent itself is never clamped, so `power <= 0` keeps every
    /// fragment that is not exactly aligned fully opaque.
    pub fn alpha(&self, normal: Vec3, power: f32) -> f32 {
        let normal = normal.normalize_or_zero();
        if normal == Vec3::ZERO {
            return 0.0;
        }
        let alignment = normal.dot(self.view_axis).abs().min(1.0);
        (1.0 - alignment).powf(power).clamp(0.0, 1.0)
    }

    pub fn shade(&self, normal: Vec3, uniforms: &FrameUniforms) -> Vec4 {
        uniforms
            .color()
            .extend(self.alpha(normal, uniforms.falloff_power()))
    }

    fn validate(&self) -> Result<(), ShadingError> {
        if !self.view_axis.is_finite() || self.view_axis.length_squared() == 0.0 {
            return Err(ShadingError::InvalidProgram(format!(
                "falloff axis must be a finite non-zero vector, got {}",
                self.view_axis
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentProgram {
    BandHighlight(BandHighlight),
    ViewFalloff(ViewFalloff),
}

impl FragmentProgram {
    pub fn label(&self) -> &'static str {
        match self {
            FragmentProgram::BandHighlight(_) => "band_highlight",
            FragmentProgram::ViewFalloff(_) => "view_falloff",
        }
    }

    pub fn required_uniforms(&self) -> &'static [Uniform] {
        match self {
            FragmentProgram::BandHighlight(_) => BandHighlight::REQUIRED,
            FragmentProgram::ViewFalloff(_) => ViewFalloff::REQUIRED,
        }
    }

    /// Varying the policy interprets.
    pub fn expected_varying(&self) -> VertexProgram {
        match self {
            FragmentProgram::BandHighlight(_) => VertexProgram::WorldPosition,
            FragmentProgram::ViewFalloff(_) => VertexProgram::ViewNormal,
        }
    }

    /// Checks the program's own constants and normalises the falloff axis.
    pub(crate) fn validated(self) -> Result<Self, ShadingError> {
        match self {
            FragmentProgram::BandHighlight(band) => {
                band.validate()?;
                Ok(self)
            }
            FragmentProgram::ViewFalloff(falloff) => {
                falloff.validate()?;
                Ok(FragmentProgram::ViewFalloff(ViewFalloff {
                    view_axis: falloff.view_axis.normalize(),
                }))
            }
        }
    }

    pub fn shade(&self, varying: Vec3, uniforms: &FrameUniforms) -> Vec4 {
        match self {
            FragmentProgram::BandHighlight(band) => band.shade(varying, uniforms),
            FragmentProgram::ViewFalloff(falloff) => falloff.shade(varying, uniforms),
        }
    }
}

impl From<BandHighlight> for FragmentProgram {
    fn from(band: BandHighlight) -> Self {
        FragmentProgram::BandHighlight(band)
    }
}

impl From<ViewFalloff> for FragmentProgram {
    fn from(falloff: ViewFalloff) -> Self {
        FragmentProgram::ViewFalloff(falloff)
    }
}
