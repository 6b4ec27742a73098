//! Model/view/projection matrices supplied to the vertex stage.
use glam::{Mat3, Mat4, Vec3};

/// Matrices for one mesh in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Transforms {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model,
            view,
            projection,
        }
    }

    pub fn model_view(&self) -> Mat4 {
        self.view * self.model
    }

    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.model_view()
    }

    /// Inverse-transpose of the model-view's upper 3x3; maps object normals
    /// into view space. A singular model-view falls back to its own 3x3.
    pub fn normal_matrix(&self) -> Mat3 {
        let linear = Mat3::from_mat4(self.model_view());
        if linear.determinant().abs() <= f32::EPSILON {
            linear
        } else {
            linear.inverse().transpose()
        }
    }
}

/// Right-handed perspective camera using GL clip conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            aspect: 1.0,
            near: 1.0,
            far: 5000.0,
            position: Vec3::splat(200.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl Camera {
    /// Matches the aspect ratio to a surface size.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn transforms_for(&self, model: Mat4) -> Transforms {
        Transforms::new(model, self.view(), self.projection())
    }
}
