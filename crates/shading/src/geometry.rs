//! Vertex buffers and triangle index lists fed to the vertex stage.
use std::f32::consts::{PI, TAU};

use glam::Vec3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("invalid geometry parameter: {0}")]
    InvalidParameter(String),
}

/// One entry of a vertex buffer. Only `position` is mandatory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub color: Option<Vec3>,
    pub size: Option<f32>,
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: None,
            color: None,
            size: None,
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }
}

/// Parameters of a (possibly partial) UV sphere.
///
/// `phi` sweeps around the vertical axis, `theta` from the north pole down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub phi_start: f32,
    pub phi_length: f32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl SphereParams {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Upper half of the sphere, open at the equator.
    pub fn hemisphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments,
            height_segments,
            theta_length: PI / 2.0,
            ..Self::default()
        }
    }
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
            phi_start: 0.0,
            phi_length: TAU,
            theta_start: 0.0,
            theta_length: PI,
        }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Geometry {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, GeometryError> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IndexCount(indices.len()));
        }
        if let Some(index) = indices
            .iter()
            .copied()
            .find(|index| *index as usize >= vertices.len())
        {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    /// Non-indexed form where every three consecutive vertices form a triangle.
    pub fn from_triangle_list(vertices: Vec<Vertex>) -> Result<Self, GeometryError> {
        let count = u32::try_from(vertices.len()).map_err(|_| {
            GeometryError::InvalidParameter("too many vertices for a u32 index list".into())
        })?;
        Self::new(vertices, (0..count).collect())
    }

    /// Plane in the XY plane centred on the origin, facing `+Z`.
    pub fn plane(
        width: f32,
        height: f32,
        width_segments: u32,
        height_segments: u32,
    ) -> Result<Self, GeometryError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(GeometryError::InvalidParameter(format!(
                "plane dimensions must be positive, got {width}x{height}"
            )));
        }
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;

        let mut vertices = Vec::with_capacity(((grid_x + 1) * (grid_y + 1)) as usize);
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height / 2.0;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width / 2.0;
                vertices.push(Vertex::new(Vec3::new(x, -y, 0.0)).with_normal(Vec3::Z));
            }
        }

        let row = grid_x + 1;
        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::new(vertices, indices)
    }

    /// UV sphere with outward normals. Segment counts are raised to the
    /// smallest values that still enclose a volume (3 around, 2 down).
    pub fn sphere(params: SphereParams) -> Result<Self, GeometryError> {
        if !(params.radius > 0.0) {
            return Err(GeometryError::InvalidParameter(format!(
                "sphere radius must be positive, got {}",
                params.radius
            )));
        }
        let width_segments = params.width_segments.max(3);
        let height_segments = params.height_segments.max(2);
        let theta_end = (params.theta_start + params.theta_length).min(PI);

        let mut vertices = Vec::new();
        let mut grid = Vec::with_capacity(height_segments as usize + 1);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = params.theta_start + v * params.theta_length;
            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = params.phi_start + u * params.phi_length;
                let position = Vec3::new(
                    -params.radius * phi.cos() * theta.sin(),
                    params.radius * theta.cos(),
                    params.radius * phi.sin() * theta.sin(),
                );
                row.push(vertices.len() as u32);
                vertices.push(Vertex::new(position).with_normal(position.normalize_or_zero()));
            }
            grid.push(row);
        }

        let mut indices = Vec::new();
        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                if iy != 0 || params.theta_start > 0.0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 || theta_end < PI {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when every vertex carries a normal.
    pub fn has_normals(&self) -> bool {
        self.vertices.iter().all(|vertex| vertex.normal.is_some())
    }

    /// Axis-aligned bounds of all vertex positions.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(min, max), vertex| {
            (min.min(vertex.position), max.max(vertex.position))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_index_lists() {
        let vertices = vec![Vertex::new(Vec3::ZERO); 3];
        assert_eq!(
            Geometry::new(vertices.clone(), vec![0, 1]),
            Err(GeometryError::IndexCount(2))
        );
        assert_eq!(
            Geometry::new(vertices, vec![0, 1, 3]),
            Err(GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn triangle_list_matches_hand_built_quad() {
        let corners = [
            [-50.0, -25.0],
            [50.0, -25.0],
            [50.0, 25.0],
            [-50.0, -25.0],
            [50.0, 25.0],
            [-50.0, 25.0],
        ];
        let vertices = corners
            .iter()
            .zip([1.0, 0.8, 0.6, 1.0, 0.6, 0.4])
            .map(|([x, y], size)| {
                Vertex::new(Vec3::new(*x, *y, 0.0))
                    .with_color(Vec3::new(size, 0.0, 1.0 - size))
                    .with_size(size)
            })
            .collect();
        let geometry = Geometry::from_triangle_list(vertices).unwrap();
        assert_eq!(geometry.triangle_count(), 2);
        assert!(!geometry.has_normals());

        let last = geometry.vertices()[5];
        assert_eq!(last.size, Some(0.4));
        assert_eq!(last.color, Some(Vec3::new(0.4, 0.0, 0.6)));
    }

    #[test]
    fn plane_spans_requested_extent() {
        let plane = Geometry::plane(100.0, 50.0, 1, 1).unwrap();
        assert_eq!(plane.vertices().len(), 4);
        assert_eq!(plane.triangle_count(), 2);
        let (min, max) = plane.bounds().unwrap();
        assert_eq!(min, Vec3::new(-50.0, -25.0, 0.0));
        assert_eq!(max, Vec3::new(50.0, 25.0, 0.0));
        assert!(plane.has_normals());
    }

    #[test]
    fn plane_triangles_wind_counter_clockwise() {
        let plane = Geometry::plane(2.0, 2.0, 2, 2).unwrap();
        for [a, b, c] in plane.triangles() {
            let pa = plane.vertices()[a as usize].position;
            let pb = plane.vertices()[b as usize].position;
            let pc = plane.vertices()[c as usize].position;
            assert!((pb - pa).cross(pc - pa).z > 0.0);
        }
    }

    #[test]
    fn hemisphere_stays_above_equator_with_outward_normals() {
        let dome = Geometry::sphere(SphereParams::hemisphere(50.0, 24, 12)).unwrap();
        let (min, max) = dome.bounds().unwrap();
        assert!(min.y > -1e-3);
        assert!((max.y - 50.0).abs() < 1e-3);
        for vertex in dome.vertices() {
            let normal = vertex.normal.unwrap();
            assert!(normal.dot(vertex.position) >= 0.0);
        }
        // open equator keeps the last row of quads
        assert_eq!(dome.triangle_count(), 24 + 24 * 2 * 11);
    }

    #[test]
    fn sphere_clamps_segment_counts() {
        let sphere = Geometry::sphere(SphereParams {
            width_segments: 0,
            height_segments: 0,
            ..SphereParams::new(1.0)
        })
        .unwrap();
        // 3 around, 2 down, both poles collapsed
        assert_eq!(sphere.triangle_count(), 6);
        assert!(Geometry::sphere(SphereParams::new(0.0)).is_err());
    }
}
