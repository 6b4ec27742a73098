use std::path::PathBuf;

use crate::geometry::GeometryError;
use crate::uniforms::{Uniform, UniformKind};

/// Failures surfaced while building or configuring a shading unit.
///
/// Numeric edge cases met while drawing (zero-length normals, empty bands)
/// are absorbed locally and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum ShadingError {
    #[error("unknown uniform '{0}'")]
    UnknownUniform(String),
    #[error("uniform '{uniform}' expects a {expected} value, got {found}")]
    UniformType {
        uniform: Uniform,
        expected: UniformKind,
        found: UniformKind,
    },
    #[error("{program} requires uniform '{uniform}' which was not supplied")]
    MissingUniform {
        program: &'static str,
        uniform: Uniform,
    },
    #[error("invalid value for uniform '{uniform}': {reason}")]
    InvalidUniform { uniform: Uniform, reason: String },
    #[error("fragment program '{fragment}' cannot consume the '{vertex}' varying")]
    IncompatiblePrograms {
        vertex: &'static str,
        fragment: &'static str,
    },
    #[error("invalid program configuration: {0}")]
    InvalidProgram(String),
    #[error("invalid phase updater: {0}")]
    InvalidUpdater(String),
    #[error("invalid uniform override '{input}': {reason}")]
    InvalidOverride { input: String, reason: String },
    #[error("geometry for '{mesh}' is missing the '{attribute}' attribute")]
    MissingAttribute {
        mesh: String,
        attribute: &'static str,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("failed to export frame to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
