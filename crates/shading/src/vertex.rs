use glam::{Mat3, Mat4, Vec3, Vec4};

use crate::geometry::Vertex;
use crate::transform::Transforms;

/// Which derived quantity the vertex stage hands to the fragment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexProgram {
    /// `World * p`.
    WorldPosition,
    /// `normalize(NormalMatrix * n)`, in view space.
    ViewNormal,
}

impl VertexProgram {
    pub fn label(self) -> &'static str {
        match self {
            VertexProgram::WorldPosition => "world_position",
            VertexProgram::ViewNormal => "view_normal",
        }
    }

    pub fn requires_normals(self) -> bool {
        matches!(self, VertexProgram::ViewNormal)
    }

    /// Runs the stage for one vertex. A missing or zero normal yields a zero
    /// varying, which the fragment stage renders transparent.
    pub fn run(self, vertex: &Vertex, matrices: &StageMatrices) -> VertexOutput {
        let position = vertex.position.extend(1.0);
        let varying = match self {
            VertexProgram::WorldPosition => (matrices.model * position).truncate(),
            VertexProgram::ViewNormal => {
                let normal = vertex.normal.unwrap_or(Vec3::ZERO);
                (matrices.normal * normal).normalize_or_zero()
            }
        };
        VertexOutput {
            clip: matrices.model_view_projection * position,
            varying,
        }
    }
}

/// Matrices derived once per draw from [`Transforms`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageMatrices {
    pub model: Mat4,
    pub model_view_projection: Mat4,
    pub normal: Mat3,
}

impl From<&Transforms> for StageMatrices {
    fn from(transforms: &Transforms) -> Self {
        Self {
            model: transforms.model,
            model_view_projection: transforms.model_view_projection(),
            normal: transforms.normal_matrix(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip: Vec4,
    pub varying: Vec3,
}
