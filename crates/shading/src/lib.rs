//! Parametric shading units and the CPU pipeline that draws them.
//!
//! A [`ShadingUnit`] pairs a vertex program with a fragment color policy and
//! owns the uniforms both read. The frame loop drives it like this:
//!
//! ```text
//!   FrameClock::tick ──▶ dt
//!          │
//!          ▼
//!   ShadingUnit::on_tick(dt) ──▶ PhaseUpdater::advance ──▶ UniformSet
//!          │                                                   │ commit
//!          ▼                                                   ▼
//!   Renderer::render ──▶ VertexProgram ──▶ rasterize ──▶ FragmentProgram
//!                                                              │
//!                                                              ▼
//!                                                   Framebuffer ──▶ PNG
//! ```
//!
//! Two fragment policies ship with the crate: [`BandHighlight`] paints a
//! vertical red/green gradient crossed by a moving highlight band, and
//! [`ViewFalloff`] fades a flat color toward transparency as the surface
//! normal turns toward the viewer. Updaters mutate uniforms only inside
//! [`ShadingUnit::on_tick`]; a draw reads the [`FrameUniforms`] snapshot
//! committed when it starts, so every fragment of one draw sees one state.

pub mod control;
pub mod error;
pub mod fragment;
pub mod geometry;
pub mod raster;
pub mod runtime;
pub mod transform;
pub mod uniforms;
pub mod unit;
pub mod updater;
pub mod vertex;

pub use control::ControlCommand;
pub use error::ShadingError;
pub use fragment::{BandHighlight, FragmentProgram, ViewFalloff, SCREEN_FORWARD};
pub use geometry::{Geometry, GeometryError, SphereParams, Vertex};
pub use raster::{FrameStats, Framebuffer, Mesh, Renderer, Side};
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, ExportFormat, FixedStepTimeSource, FixedTimeSource,
    FrameClock, FrameTick, RenderPolicy, SystemTimeSource, TimeSample, TimeSource,
};
pub use transform::{Camera, Transforms};
pub use uniforms::{
    color_from_hex, parse_color, FrameUniforms, Uniform, UniformKind, UniformSet, UniformValue,
};
pub use unit::ShadingUnit;
pub use updater::{PhaseUpdater, WrapMode};
pub use vertex::{StageMatrices, VertexOutput, VertexProgram};
