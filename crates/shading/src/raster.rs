//! CPU triangle rasterizer that performs the draw for submitted meshes.
//!
//! ```text
//!   Renderer::render
//!        │ per mesh
//!        ├─▶ ShadingUnit::commit ──▶ FrameUniforms (one snapshot per draw)
//!        ├─▶ VertexProgram::run  ──▶ clip position + varying
//!        └─▶ rasterize ──▶ perspective-correct varying ──▶ FragmentProgram
//!                                                       └─▶ depth test + blend
//! ```
use std::path::Path;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::error::ShadingError;
use crate::geometry::Geometry;
use crate::transform::Camera;
use crate::uniforms::FrameUniforms;
use crate::unit::ShadingUnit;
use crate::vertex::{StageMatrices, VertexOutput};

/// Triangles with a vertex this close to the camera plane are dropped.
const MIN_CLIP_W: f32 = 1e-5;

/// Which triangle faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    /// Only counter-clockwise (front-facing) triangles.
    Front,
    #[default]
    Double,
}

/// Linear RGBA color target with a depth buffer.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    clear_color: Vec4,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            color: vec![Vec4::new(0.0, 0.0, 0.0, 1.0); len],
            depth: vec![f32::INFINITY; len],
        }
    }

    pub fn with_clear_color(mut self, rgb: Vec3) -> Self {
        self.clear_color = rgb.extend(1.0);
        self.clear();
        self
    }

    pub fn clear(&mut self) {
        self.color.fill(self.clear_color);
        self.depth.fill(f32::INFINITY);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec4> {
        self.index(x, y).map(|index| self.color[index])
    }

    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|index| self.depth[index])
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Source-over blend of `src` onto the stored color.
    fn blend(&mut self, index: usize, src: Vec4) {
        let dst = self.color[index];
        let alpha = src.w;
        let rgb = src.truncate() * alpha + dst.truncate() * (1.0 - alpha);
        self.color[index] = rgb.extend(alpha + dst.w * (1.0 - alpha));
    }

    /// Quantises the color buffer into 8-bit RGBA.
    pub fn to_image(&self) -> image::RgbaImage {
        let mut pixels = Vec::with_capacity(self.color.len() * 4);
        for color in &self.color {
            for channel in color.to_array() {
                pixels.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        image::RgbaImage::from_raw(self.width, self.height, pixels)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    pub fn save_png(&self, path: &Path) -> Result<(), ShadingError> {
        self.to_image()
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| ShadingError::Export {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Geometry, placement and shading unit submitted to the renderer.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    geometry: Geometry,
    model: Mat4,
    side: Side,
    unit: ShadingUnit,
}

impl Mesh {
    /// Fails when the unit's vertex program needs an attribute the geometry
    /// does not provide.
    pub fn new(
        name: impl Into<String>,
        geometry: Geometry,
        unit: ShadingUnit,
    ) -> Result<Self, ShadingError> {
        let name = name.into();
        if unit.vertex_program().requires_normals() && !geometry.has_normals() {
            return Err(ShadingError::MissingAttribute {
                mesh: name,
                attribute: "normal",
            });
        }
        Ok(Self {
            name,
            geometry,
            model: Mat4::IDENTITY,
            side: Side::default(),
            unit,
        })
    }

    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }

    /// Translation plus XYZ euler rotation in radians.
    pub fn with_placement(self, position: Vec3, rotation: Vec3) -> Self {
        let rotation = Quat::from_euler(glam::EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
        self.with_model(Mat4::from_rotation_translation(rotation, position))
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn unit(&self) -> &ShadingUnit {
        &self.unit
    }

    pub fn unit_mut(&mut self) -> &mut ShadingUnit {
        &mut self.unit
    }
}

/// Counters describing one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub meshes: usize,
    pub triangles: usize,
    pub culled: usize,
    pub fragments: usize,
}

impl std::ops::AddAssign for FrameStats {
    fn add_assign(&mut self, other: Self) {
        self.meshes += other.meshes;
        self.triangles += other.triangles;
        self.culled += other.culled;
        self.fragments += other.fragments;
    }
}

#[derive(Debug, Default)]
pub struct Renderer {
    frames: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Clears `target` and draws every mesh in submission order.
    pub fn render(
        &mut self,
        target: &mut Framebuffer,
        camera: &Camera,
        meshes: &[Mesh],
    ) -> FrameStats {
        target.clear();
        let mut stats = FrameStats::default();
        for mesh in meshes {
            let mesh_stats = draw_mesh(target, camera, mesh);
            tracing::trace!(
                mesh = mesh.name(),
                triangles = mesh_stats.triangles,
                culled = mesh_stats.culled,
                fragments = mesh_stats.fragments,
                "drew mesh"
            );
            stats += mesh_stats;
        }
        self.frames = self.frames.saturating_add(1);
        tracing::debug!(
            frame = self.frames,
            meshes = stats.meshes,
            triangles = stats.triangles,
            fragments = stats.fragments,
            "rendered frame"
        );
        stats
    }
}

fn draw_mesh(target: &mut Framebuffer, camera: &Camera, mesh: &Mesh) -> FrameStats {
    let unit = mesh.unit();
    let frame = unit.commit();
    let matrices = StageMatrices::from(&camera.transforms_for(mesh.model()));
    let program = unit.vertex_program();
    let outputs: Vec<VertexOutput> = mesh
        .geometry()
        .vertices()
        .iter()
        .map(|vertex| program.run(vertex, &matrices))
        .collect();

    let mut stats = FrameStats {
        meshes: 1,
        ..FrameStats::default()
    };
    for [a, b, c] in mesh.geometry().triangles() {
        stats.triangles += 1;
        let triangle = [
            outputs[a as usize],
            outputs[b as usize],
            outputs[c as usize],
        ];
        match rasterize(target, &triangle, mesh.side(), unit, &frame) {
            Some(fragments) => stats.fragments += fragments,
            None => stats.culled += 1,
        }
    }
    stats
}

struct ScreenVertex {
    position: Vec2,
    depth: f32,
    inv_w: f32,
    varying: Vec3,
}

fn to_screen(output: &VertexOutput, width: f32, height: f32) -> ScreenVertex {
    let inv_w = 1.0 / output.clip.w;
    let ndc = output.clip.truncate() * inv_w;
    ScreenVertex {
        position: Vec2::new(
            (ndc.x * 0.5 + 0.5) * width,
            (1.0 - (ndc.y * 0.5 + 0.5)) * height,
        ),
        depth: ndc.z * 0.5 + 0.5,
        inv_w,
        varying: output.varying,
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Returns the number of fragments shaded, or `None` when the triangle was
/// culled before rasterisation.
fn rasterize(
    target: &mut Framebuffer,
    triangle: &[VertexOutput; 3],
    side: Side,
    unit: &ShadingUnit,
    frame: &FrameUniforms,
) -> Option<usize> {
    if triangle.iter().any(|vertex| vertex.clip.w <= MIN_CLIP_W) {
        return None;
    }
    let width = target.width as f32;
    let height = target.height as f32;
    let [v0, v1, v2] = triangle.map(|output| to_screen(&output, width, height));

    let area = edge(v0.position, v1.position, v2.position);
    if !area.is_finite() || area.abs() <= f32::EPSILON {
        return None;
    }
    // screen y points down, so counter-clockwise triangles have negative area
    if side == Side::Front && area > 0.0 {
        return None;
    }

    let min = v0.position.min(v1.position).min(v2.position).floor().max(Vec2::ZERO);
    let max = v0
        .position
        .max(v1.position)
        .max(v2.position)
        .ceil()
        .min(Vec2::new(width - 1.0, height - 1.0));
    if min.x > max.x || min.y > max.y {
        return Some(0);
    }

    let opacity = frame.opacity();
    let mut fragments = 0;
    for y in min.y as u32..=max.y as u32 {
        for x in min.x as u32..=max.x as u32 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(v1.position, v2.position, p) / area;
            let w1 = edge(v2.position, v0.position, p) / area;
            let w2 = edge(v0.position, v1.position, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }
            let index = y as usize * target.width as usize + x as usize;
            if depth >= target.depth[index] {
                continue;
            }

            let p0 = w0 * v0.inv_w;
            let p1 = w1 * v1.inv_w;
            let p2 = w2 * v2.inv_w;
            let varying = (v0.varying * p0 + v1.varying * p1 + v2.varying * p2) / (p0 + p1 + p2);

            let mut color = unit.shade(varying, frame);
            color.w *= opacity;
            target.depth[index] = depth;
            target.blend(index, color);
            fragments += 1;
        }
    }
    Some(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{BandHighlight, ViewFalloff};
    use crate::geometry::Vertex;
    use crate::uniforms::{Uniform, UniformSet};
    use crate::vertex::VertexProgram;

    fn band_unit(opacity: f32) -> ShadingUnit {
        let uniforms = UniformSet::new()
            .with(Uniform::Opacity, opacity)
            .and_then(|set| set.with(Uniform::BandY, 100.0_f32))
            .and_then(|set| set.with(Uniform::BandWidth, 10.0_f32))
            .and_then(|set| set.with(Uniform::Highlight, Vec3::new(1.0, 1.0, 0.0)))
            .unwrap();
        ShadingUnit::create(VertexProgram::WorldPosition, BandHighlight::default().into(), uniforms)
            .unwrap()
    }

    fn front_camera() -> Camera {
        Camera {
            position: Vec3::new(0.0, 0.0, 100.0),
            ..Camera::default()
        }
    }

    #[test]
    fn plane_fills_centre_with_gradient() {
        let mesh = Mesh::new("wall", Geometry::plane(100.0, 50.0, 1, 1).unwrap(), band_unit(1.0))
            .unwrap();
        let mut target = Framebuffer::new(64, 64);
        let stats = Renderer::new().render(&mut target, &front_camera(), &[mesh]);
        assert_eq!(stats.triangles, 2);
        assert_eq!(stats.culled, 0);
        assert!(stats.fragments > 0);

        let centre = target.pixel(32, 32).unwrap();
        assert!((centre.x - 0.5).abs() < 0.05, "{centre}");
        assert!((centre.x + centre.y - 1.0).abs() < 1e-4);
        assert_eq!(target.pixel(0, 0), Some(target.clear_color()));
    }

    #[test]
    fn opacity_blends_over_clear_color() {
        let mesh = Mesh::new("wall", Geometry::plane(100.0, 50.0, 1, 1).unwrap(), band_unit(0.25))
            .unwrap();
        let mut target = Framebuffer::new(32, 32).with_clear_color(Vec3::ZERO);
        Renderer::new().render(&mut target, &front_camera(), &[mesh]);
        let centre = target.pixel(16, 16).unwrap();
        assert!((centre.x + centre.y - 0.25).abs() < 1e-3, "{centre}");
        assert!((centre.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn front_side_culls_back_faces() {
        let geometry = Geometry::plane(100.0, 50.0, 1, 1).unwrap();
        let camera = Camera {
            position: Vec3::new(0.0, 0.0, -100.0),
            ..Camera::default()
        };
        let mesh = Mesh::new("wall", geometry, band_unit(1.0)).unwrap().with_side(Side::Front);
        let mut target = Framebuffer::new(32, 32);
        let stats = Renderer::new().render(&mut target, &camera, std::slice::from_ref(&mesh));
        assert_eq!(stats.culled, 2);
        assert_eq!(stats.fragments, 0);

        let double = mesh.with_side(Side::Double);
        let stats = Renderer::new().render(&mut target, &camera, &[double]);
        assert_eq!(stats.culled, 0);
        assert!(stats.fragments > 0);
    }

    #[test]
    fn triangles_behind_camera_are_dropped() {
        let geometry = Geometry::plane(100.0, 50.0, 1, 1).unwrap();
        let mesh = Mesh::new("wall", geometry, band_unit(1.0))
            .unwrap()
            .with_model(Mat4::from_translation(Vec3::new(0.0, 0.0, 500.0)));
        let mut target = Framebuffer::new(16, 16);
        let stats = Renderer::new().render(&mut target, &front_camera(), &[mesh]);
        assert_eq!(stats.culled, 2);
    }

    #[test]
    fn normal_program_needs_normals() {
        let uniforms = UniformSet::new()
            .with(Uniform::Color, Vec3::ONE)
            .and_then(|set| set.with(Uniform::FalloffPower, 1.0_f32))
            .unwrap();
        let unit =
            ShadingUnit::create(VertexProgram::ViewNormal, ViewFalloff::default().into(), uniforms)
                .unwrap();
        let bare = Geometry::from_triangle_list(vec![
            Vertex::new(Vec3::ZERO),
            Vertex::new(Vec3::X),
            Vertex::new(Vec3::Y),
        ])
        .unwrap();
        assert!(matches!(
            Mesh::new("bare", bare, unit),
            Err(ShadingError::MissingAttribute { attribute: "normal", .. })
        ));
    }

    #[test]
    fn exports_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let target = Framebuffer::new(8, 4).with_clear_color(Vec3::new(1.0, 0.0, 0.0));
        target.save_png(&path).unwrap();
        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(image.get_pixel(3, 2).0, [255, 0, 0, 255]);
    }
}
