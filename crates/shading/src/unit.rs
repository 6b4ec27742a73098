//! The shading unit handle: programs, owned uniforms and frame updaters.
use glam::{Vec3, Vec4};

use crate::error::ShadingError;
use crate::fragment::FragmentProgram;
use crate::uniforms::{FrameUniforms, Uniform, UniformSet, UniformValue};
use crate::updater::PhaseUpdater;
use crate::vertex::VertexProgram;

/// A vertex/fragment program pair together with the uniforms it reads.
///
/// The unit is the single owner of its uniform state. Updaters write it in
/// [`ShadingUnit::on_tick`], control surfaces through the named setters, and
/// draws only ever read a committed [`FrameUniforms`] snapshot.
#[derive(Debug, Clone)]
pub struct ShadingUnit {
    vertex: VertexProgram,
    fragment: FragmentProgram,
    uniforms: UniformSet,
    updaters: Vec<PhaseUpdater>,
    ticks: u64,
}

impl ShadingUnit {
    /// Validates the program pair against `initial` and takes ownership of it.
    ///
    /// Fails when the fragment program cannot read the vertex program's
    /// varying, when a required uniform is absent, or when the band width is
    /// not strictly positive.
    pub fn create(
        vertex: VertexProgram,
        fragment: FragmentProgram,
        initial: UniformSet,
    ) -> Result<Self, ShadingError> {
        let fragment = fragment.validated()?;
        if fragment.expected_varying() != vertex {
            return Err(ShadingError::IncompatiblePrograms {
                vertex: vertex.label(),
                fragment: fragment.label(),
            });
        }
        initial.require(fragment.label(), fragment.required_uniforms())?;

        if let FragmentProgram::BandHighlight(_) = fragment {
            if let Some(width) = initial.float(Uniform::BandWidth) {
                if !(width > 0.0 && width.is_finite()) {
                    return Err(ShadingError::InvalidUniform {
                        uniform: Uniform::BandWidth,
                        reason: format!("band width must be positive, got {width}"),
                    });
                }
            }
        }

        tracing::debug!(
            vertex = vertex.label(),
            fragment = fragment.label(),
            uniforms = initial.len(),
            "created shading unit"
        );
        Ok(Self {
            vertex,
            fragment,
            uniforms: initial,
            updaters: Vec::new(),
            ticks: 0,
        })
    }

    /// Attaches a phase updater and immediately publishes its starting phase.
    pub fn with_updater(mut self, updater: PhaseUpdater) -> Result<Self, ShadingError> {
        if !self.uniforms.contains(updater.target()) {
            return Err(ShadingError::MissingUniform {
                program: "phase updater",
                uniform: updater.target(),
            });
        }
        if self
            .updaters
            .iter()
            .any(|existing| existing.target() == updater.target())
        {
            return Err(ShadingError::InvalidUpdater(format!(
                "uniform '{}' already has a phase updater",
                updater.target()
            )));
        }
        updater.write(&mut self.uniforms)?;
        self.updaters.push(updater);
        Ok(self)
    }

    /// Per-frame hook: advances every updater by `dt` seconds and writes the
    /// results. Negative steps count as zero; non-finite ones are skipped.
    pub fn on_tick(&mut self, dt: f32) {
        if !dt.is_finite() {
            tracing::warn!(dt, "ignoring non-finite frame delta");
            return;
        }
        let dt = dt.max(0.0);
        for updater in &mut self.updaters {
            let phase = updater.advance(dt);
            if let Err(err) = updater.write(&mut self.uniforms) {
                tracing::warn!(uniform = %updater.target(), %err, "failed to publish phase");
                continue;
            }
            tracing::trace!(uniform = %updater.target(), phase, "advanced phase");
        }
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn vertex_program(&self) -> VertexProgram {
        self.vertex
    }

    pub fn fragment_program(&self) -> &FragmentProgram {
        &self.fragment
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn updaters(&self) -> &[PhaseUpdater] {
        &self.updaters
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Overwrites a uniform between frames; takes effect on the next draw.
    ///
    /// A float driven by a phase updater reseeds that updater, so the
    /// animation continues from the written value folded into its range.
    pub fn set_uniform(
        &mut self,
        uniform: Uniform,
        value: UniformValue,
    ) -> Result<(), ShadingError> {
        self.uniforms.set(uniform, value)?;
        let UniformValue::Float(value) = value else {
            return Ok(());
        };
        if let Some(updater) = self
            .updaters
            .iter_mut()
            .find(|updater| updater.target() == uniform)
        {
            let phase = updater.reseed(value);
            tracing::debug!(uniform = uniform.name(), value, phase, "reseeded phase updater");
            updater.write(&mut self.uniforms)?;
        }
        Ok(())
    }

    /// Parses `literal` for the uniform called `name` and applies it.
    pub fn apply_override(&mut self, name: &str, literal: &str) -> Result<Uniform, ShadingError> {
        let uniform = Uniform::from_name(name)?;
        let value = UniformValue::parse_for(uniform, literal)?;
        self.set_uniform(uniform, value)?;
        Ok(uniform)
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.set_float(Uniform::Opacity, opacity);
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.set_rgb(Uniform::Color, color);
    }

    pub fn set_band_y(&mut self, y: f32) {
        self.set_float(Uniform::BandY, y);
    }

    /// Non-positive widths are accepted and render as an empty band.
    pub fn set_band_width(&mut self, width: f32) {
        self.set_float(Uniform::BandWidth, width);
    }

    pub fn set_highlight(&mut self, color: Vec3) {
        self.set_rgb(Uniform::Highlight, color);
    }

    pub fn set_falloff_power(&mut self, power: f32) {
        self.set_float(Uniform::FalloffPower, power);
    }

    fn set_float(&mut self, uniform: Uniform, value: f32) {
        if let Err(err) = self.set_uniform(uniform, UniformValue::Float(value)) {
            tracing::warn!(uniform = uniform.name(), %err, "failed to set uniform");
        }
    }

    fn set_rgb(&mut self, uniform: Uniform, value: Vec3) {
        if let Err(err) = self.set_uniform(uniform, UniformValue::Color(value)) {
            tracing::warn!(uniform = uniform.name(), %err, "failed to set uniform");
        }
    }

    /// Snapshot read by every fragment of the next draw.
    pub fn commit(&self) -> FrameUniforms {
        self.uniforms.commit()
    }

    /// Evaluates the fragment program for one interpolated varying.
    pub fn shade(&self, varying: Vec3, frame: &FrameUniforms) -> Vec4 {
        self.fragment.shade(varying, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{BandHighlight, ViewFalloff};

    fn band_uniforms() -> UniformSet {
        UniformSet::new()
            .with(Uniform::Opacity, 0.3_f32)
            .and_then(|set| set.with(Uniform::Color, Vec3::new(0.0, 1.0, 1.0)))
            .and_then(|set| set.with(Uniform::BandY, 0.0_f32))
            .and_then(|set| set.with(Uniform::BandWidth, 10.0_f32))
            .and_then(|set| set.with(Uniform::Highlight, Vec3::new(1.0, 1.0, 0.0)))
            .unwrap()
    }

    fn band_unit() -> ShadingUnit {
        ShadingUnit::create(
            VertexProgram::WorldPosition,
            BandHighlight::default().into(),
            band_uniforms(),
        )
        .unwrap()
    }

    #[test]
    fn missing_uniform_rejects_construction() {
        let uniforms = UniformSet::new()
            .with(Uniform::Color, Vec3::ONE)
            .unwrap();
        let err = ShadingUnit::create(
            VertexProgram::ViewNormal,
            ViewFalloff::default().into(),
            uniforms,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ShadingError::MissingUniform {
                program: "view_falloff",
                uniform: Uniform::FalloffPower,
            }
        ));
    }

    #[test]
    fn incompatible_programs_are_rejected() {
        let err = ShadingUnit::create(
            VertexProgram::ViewNormal,
            BandHighlight::default().into(),
            band_uniforms(),
        )
        .unwrap_err();
        assert!(matches!(err, ShadingError::IncompatiblePrograms { .. }));
    }

    #[test]
    fn zero_band_width_rejected_at_construction_only() {
        let mut uniforms = band_uniforms();
        uniforms.set(Uniform::BandWidth, UniformValue::Float(0.0)).unwrap();
        let err = ShadingUnit::create(
            VertexProgram::WorldPosition,
            BandHighlight::default().into(),
            uniforms,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ShadingError::InvalidUniform {
                uniform: Uniform::BandWidth,
                ..
            }
        ));

        let mut unit = band_unit();
        unit.set_band_width(0.0);
        let frame = unit.commit();
        let color = unit.shade(Vec3::new(0.0, 0.0, 0.0), &frame);
        assert_eq!(color, Vec4::new(0.5, 0.5, 0.0, 1.0));
    }

    #[test]
    fn updater_writes_phase_on_attach_and_tick() {
        let updater = PhaseUpdater::new(Uniform::BandY, 30.0, -25.0, 50.0)
            .unwrap()
            .with_initial(0.0)
            .unwrap();
        let mut unit = band_unit().with_updater(updater).unwrap();
        assert_eq!(unit.uniforms().float(Uniform::BandY), Some(0.0));

        unit.on_tick(0.5);
        assert_eq!(unit.uniforms().float(Uniform::BandY), Some(15.0));
        unit.on_tick(-1.0);
        assert_eq!(unit.uniforms().float(Uniform::BandY), Some(15.0));
        unit.on_tick(f32::NAN);
        assert_eq!(unit.uniforms().float(Uniform::BandY), Some(15.0));
        assert_eq!(unit.ticks(), 2);
    }

    #[test]
    fn written_phase_survives_the_next_tick() {
        let updater = PhaseUpdater::new(Uniform::BandY, 30.0, -25.0, 50.0)
            .unwrap()
            .with_initial(0.0)
            .unwrap();
        let mut unit = band_unit().with_updater(updater).unwrap();

        unit.set_band_y(20.0);
        unit.on_tick(0.0);
        assert_eq!(unit.commit().band_y(), 20.0);
        unit.on_tick(0.5);
        assert_eq!(unit.commit().band_y(), 35.0);

        unit.apply_override("y", "60").unwrap();
        assert_eq!(unit.uniforms().float(Uniform::BandY), Some(-15.0));
        assert_eq!(unit.updaters()[0].phase(), -15.0);
    }

    #[test]
    fn updater_requires_existing_slot() {
        let updater = PhaseUpdater::new(Uniform::FalloffPower, 1.0, 0.0, 5.0).unwrap();
        assert!(matches!(
            band_unit().with_updater(updater),
            Err(ShadingError::MissingUniform { .. })
        ));
    }

    #[test]
    fn duplicate_updaters_are_rejected() {
        let updater = PhaseUpdater::new(Uniform::BandY, 30.0, -25.0, 50.0).unwrap();
        let unit = band_unit().with_updater(updater.clone()).unwrap();
        assert!(unit.with_updater(updater).is_err());
    }

    #[test]
    fn committed_frame_is_isolated_from_later_writes() {
        let mut unit = band_unit();
        let frame = unit.commit();
        unit.set_band_y(40.0);
        assert_eq!(frame.band_y(), 0.0);
        assert_eq!(unit.commit().band_y(), 40.0);
    }

    #[test]
    fn overrides_parse_by_uniform_type() {
        let mut unit = band_unit();
        assert_eq!(
            unit.apply_override("highlight", "#ff0000").unwrap(),
            Uniform::Highlight
        );
        assert_eq!(
            unit.uniforms().color(Uniform::Highlight),
            Some(Vec3::new(1.0, 0.0, 0.0))
        );
        assert!(matches!(
            unit.apply_override("y", "#ff0000"),
            Err(ShadingError::InvalidUniform { .. })
        ));
        assert!(matches!(
            unit.apply_override("glow", "1"),
            Err(ShadingError::UnknownUniform(_))
        ));
    }
}
