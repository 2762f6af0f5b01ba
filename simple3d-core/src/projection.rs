/// Camera, viewport and ray projection utilities
use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::error::{Error, Result};
use crate::shape::Ray;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Size of the surface pointer coordinates are measured against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Convert screen coordinates (pixels from the top-left corner) to
    /// normalized device coordinates, x right and y up in `[-1, 1]`.
    pub fn screen_to_ndc(&self, screen_x: f32, screen_y: f32) -> Result<Point2<f32>> {
        if !(self.width > 0.0 && self.height > 0.0) || !self.width.is_finite() || !self.height.is_finite() {
            return Err(Error::invalid(format!(
                "viewport must have a positive finite size, got {}x{}",
                self.width, self.height
            )));
        }
        if !screen_x.is_finite() || !screen_y.is_finite() {
            return Err(Error::invalid(format!(
                "screen coordinates must be finite, got ({screen_x}, {screen_y})"
            )));
        }
        Ok(Point2::new(
            (screen_x / self.width) * 2.0 - 1.0,
            -(screen_y / self.height) * 2.0 + 1.0,
        ))
    }
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 3.0, 8.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: 50f32.to_radians(),
            aspect: width as f32 / height as f32,
            near: 0.1,
            far: 1000.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Keep the aspect ratio in step with a resized viewport
    pub fn set_viewport(&mut self, viewport: &Viewport) {
        if viewport.width > 0.0 && viewport.height > 0.0 {
            self.aspect = viewport.aspect();
        }
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    /// Orbit the eye around the target by yaw (about world up) and pitch.
    /// Pitch is clamped short of the poles so the view matrix stays defined.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }
        let current_yaw = offset.x.atan2(offset.z);
        let current_pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        let limit = std::f32::consts::FRAC_PI_2 - 0.05;
        let yaw = current_yaw + yaw;
        let pitch = (current_pitch + pitch).clamp(-limit, limit);
        self.position = self.target
            + Vector3::new(
                radius * pitch.cos() * yaw.sin(),
                radius * pitch.sin(),
                radius * pitch.cos() * yaw.cos(),
            );
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm();
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Build a world-space ray through a point in normalized device coordinates.
    ///
    /// The near and far plane points are unprojected through the inverse
    /// view-projection matrix. A perspective ray starts at the eye, an
    /// orthographic one at the near plane.
    pub fn ray_through(&self, ndc: &Point2<f32>) -> Result<Ray> {
        let view_projection = self.projection_matrix() * self.view_matrix();
        let inverse = view_projection
            .try_inverse()
            .ok_or_else(|| Error::invalid("camera view-projection matrix is not invertible"))?;

        let near = inverse.transform_point(&Point3::new(ndc.x, ndc.y, -1.0));
        let far = inverse.transform_point(&Point3::new(ndc.x, ndc.y, 1.0));

        let origin = match self.mode {
            ProjectionMode::Perspective => self.position,
            ProjectionMode::Orthographic => near,
        };
        Ray::new(origin, far - near)
    }

    /// Project a 3D point to 2D screen space
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let view = self.view_matrix();
        let projection = self.projection_matrix();
        let mvp = projection * view * model_matrix;

        let clip = mvp * point.to_homogeneous();

        // Prevent division by near-zero depth values
        if clip.w.abs() < 1e-6 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let depth = clip.z / clip.w;

        // Clip test
        if !(-1.0..=1.0).contains(&ndc_x) || !(-1.0..=1.0).contains(&ndc_y) || !(-1.0..=1.0).contains(&depth) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

        Some((screen_x, screen_y, depth))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
