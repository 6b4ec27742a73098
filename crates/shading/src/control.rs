//! Textual uniform overrides of the form `[mesh.]uniform=value`.
use std::fmt;
use std::str::FromStr;

use crate::error::ShadingError;
use crate::uniforms::{Uniform, UniformValue};
use crate::unit::ShadingUnit;

/// One override issued by a control surface between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlCommand {
    /// Restricts the override to a single mesh; `None` targets every mesh
    /// that carries the uniform.
    pub mesh: Option<String>,
    pub uniform: Uniform,
    pub value: UniformValue,
}

impl ControlCommand {
    pub fn new(mesh: Option<String>, uniform: Uniform, value: UniformValue) -> Self {
        Self {
            mesh,
            uniform,
            value,
        }
    }

    /// True when the command addresses the mesh called `mesh_name`.
    pub fn targets(&self, mesh_name: &str) -> bool {
        self.mesh.as_deref().map_or(true, |mesh| mesh == mesh_name)
    }

    /// Writes the value into `unit`. Broadcast commands skip units that do
    /// not carry the uniform and report `false`.
    pub fn apply(&self, unit: &mut ShadingUnit) -> Result<bool, ShadingError> {
        if self.mesh.is_none() && !unit.uniforms().contains(self.uniform) {
            return Ok(false);
        }
        unit.set_uniform(self.uniform, self.value)?;
        Ok(true)
    }
}

impl FromStr for ControlCommand {
    type Err = ShadingError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ShadingError::InvalidOverride {
            input: input.to_string(),
            reason,
        };
        let (target, literal) = input
            .split_once('=')
            .ok_or_else(|| invalid("expected [mesh.]uniform=value".to_string()))?;
        let (mesh, name) = match target.trim().rsplit_once('.') {
            Some((mesh, name)) if !mesh.trim().is_empty() => {
                (Some(mesh.trim().to_string()), name)
            }
            Some(_) => return Err(invalid("mesh name must not be empty".to_string())),
            None => (None, target),
        };
        let uniform = Uniform::from_name(name).map_err(|err| invalid(err.to_string()))?;
        let value =
            UniformValue::parse_for(uniform, literal).map_err(|err| invalid(err.to_string()))?;
        Ok(Self::new(mesh, uniform, value))
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(mesh) = &self.mesh {
            write!(f, "{mesh}.")?;
        }
        write!(f, "{}={}", self.uniform, self.value)
    }
}
