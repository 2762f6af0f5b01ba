/// Object transforms and pivot-relative rotation/scaling
use nalgebra::{Matrix4, Point3, Quaternion, Unit, UnitQuaternion, Vector3};

use crate::error::{Error, Result};

/// Euler-angle view of an orientation (in radians, applied Z, Y, X)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn to_quaternion(self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(self.x, self.y, self.z)
    }

    pub fn from_quaternion(orientation: &UnitQuaternion<f32>) -> Self {
        let (x, y, z) = orientation.euler_angles();
        Self { x, y, z }
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Position, orientation and non-uniform scale of a scene object.
///
/// The orientation quaternion is the source of truth. Euler angles are only a
/// projection of it (see [`Transform::euler`]), so repeated pivot rotations
/// compose on the quaternion without being rebuilt from lossy angles.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::identity()
        }
    }

    pub fn with_euler(mut self, rotation: RotationState) -> Self {
        self.set_euler(rotation);
        self
    }

    pub fn with_scale(mut self, sx: f32, sy: f32, sz: f32) -> Self {
        self.scale = Vector3::new(sx, sy, sz);
        self
    }

    pub fn euler(&self) -> RotationState {
        RotationState::from_quaternion(&self.orientation)
    }

    pub fn set_euler(&mut self, rotation: RotationState) {
        self.orientation = rotation.to_quaternion();
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vector3::new(x, y, z);
    }

    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position += Vector3::new(dx, dy, dz);
    }

    /// Rotate the object by `angle` radians about `axis` through `pivot`.
    ///
    /// The offset from the pivot is conjugated by the axis-angle quaternion
    /// `q` and the orientation becomes `orientation * q`: the previous
    /// orientation is composed with the new rotation by Hamilton product in
    /// that order. Scale is untouched.
    /// `axis` does not need to be normalized but must be finite and non-zero.
    pub fn rotate_around_pivot(
        &mut self,
        pivot: &Point3<f32>,
        axis: &Vector3<f32>,
        angle: f32,
    ) -> Result<()> {
        let length = axis.norm();
        if !length.is_finite() || length <= f32::MIN_POSITIVE {
            return Err(Error::invalid(format!(
                "rotation axis must be finite and non-zero, got {axis:?}"
            )));
        }
        if !angle.is_finite() {
            return Err(Error::invalid(format!("rotation angle must be finite, got {angle}")));
        }
        ensure_finite("pivot", &pivot.coords)?;

        let q = UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), angle);
        let offset = Quaternion::from_imag(self.position - pivot.coords);
        let rotated = q.quaternion() * offset * q.inverse().quaternion();

        self.position = pivot.coords + rotated.imag();
        self.orientation = self.orientation * q;
        Ok(())
    }

    /// Set the absolute scale to `(sx, sy, sz)` while keeping `pivot` fixed in space.
    ///
    /// Fails without touching the transform when any current or target scale
    /// component is zero or non-finite.
    pub fn scale_from_pivot(&mut self, pivot: &Point3<f32>, sx: f32, sy: f32, sz: f32) -> Result<()> {
        let target = Vector3::new(sx, sy, sz);
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(Error::invalid(format!(
                "cannot scale from pivot: current scale {:?} has a zero or non-finite axis",
                self.scale
            )));
        }
        if target.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(Error::invalid(format!(
                "target scale must be finite and non-zero on every axis, got {target:?}"
            )));
        }
        ensure_finite("pivot", &pivot.coords)?;

        let ratio = target.component_div(&self.scale);
        self.position = pivot.coords + ratio.component_mul(&(self.position - pivot.coords));
        self.scale = target;
        Ok(())
    }

    /// Scale a unit-sized box so that its minimum corner stays put
    pub fn scale_from_min_corner(&mut self, sx: f32, sy: f32, sz: f32) -> Result<()> {
        let corner = Point3::from(self.position - self.scale / 2.0);
        self.scale_from_pivot(&corner, sx, sy, sz)
    }

    /// Model matrix (translation * rotation * scale)
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position)
            * self.orientation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}

fn ensure_finite(what: &str, v: &Vector3<f32>) -> Result<()> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(Error::invalid(format!("{what} must be finite, got {v:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_rotation_state_quaternion_round_trip() {
        assert_eq!(RotationState::default(), RotationState::zero());
        assert_relative_eq!(RotationState::zero().to_quaternion(), UnitQuaternion::identity(), epsilon = EPSILON);

        let state = RotationState::new(0.1, 0.2, 0.3);
        let back = RotationState::from_quaternion(&state.to_quaternion());
        assert_relative_eq!(back.x, 0.1, epsilon = EPSILON);
        assert_relative_eq!(back.y, 0.2, epsilon = EPSILON);
        assert_relative_eq!(back.z, 0.3, epsilon = EPSILON);
    }

    #[test]
    fn test_identity_model_matrix() {
        let transform = Transform::identity();
        assert!((transform.model_matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_euler_projection_round_trip() {
        let rotation = RotationState::new(0.3, -0.4, 1.1);
        let transform = Transform::identity().with_euler(rotation);
        let back = transform.euler();
        assert_relative_eq!(back.x, rotation.x, epsilon = EPSILON);
        assert_relative_eq!(back.y, rotation.y, epsilon = EPSILON);
        assert_relative_eq!(back.z, rotation.z, epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_half_turn_about_y() {
        let mut transform = Transform::from_position(1.0, 0.0, 0.0);
        transform
            .rotate_around_pivot(&Point3::origin(), &Vector3::y(), PI)
            .unwrap();
        assert_relative_eq!(transform.position, Vector3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_normalizes_axis() {
        let mut a = Transform::from_position(0.0, 0.0, 2.0);
        let mut b = a.clone();
        a.rotate_around_pivot(&Point3::origin(), &Vector3::new(0.0, 5.0, 0.0), FRAC_PI_2)
            .unwrap();
        b.rotate_around_pivot(&Point3::origin(), &Vector3::y(), FRAC_PI_2)
            .unwrap();
        assert_relative_eq!(a.position, b.position, epsilon = EPSILON);
        assert_relative_eq!(a.position, Vector3::new(2.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_then_reverse_restores_transform() {
        let pivots = [
            Point3::origin(),
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(-3.0, 4.0, 10.0),
        ];
        let angles = [0.25, 1.0, -2.5, PI, 7.0];
        for pivot in &pivots {
            for angle in angles {
                let original = Transform::from_position(0.5, 1.5, -2.0)
                    .with_euler(RotationState::new(0.2, 0.4, -0.1))
                    .with_scale(2.0, 1.0, 0.5);
                let mut transform = original.clone();
                let axis = Vector3::new(1.0, 2.0, -0.5);
                transform.rotate_around_pivot(pivot, &axis, angle).unwrap();
                transform.rotate_around_pivot(pivot, &axis, -angle).unwrap();

                assert_relative_eq!(transform.position, original.position, epsilon = 1e-4);
                assert_relative_eq!(transform.orientation, original.orientation, epsilon = 1e-5);
                assert_eq!(transform.scale, original.scale);
            }
        }
    }

    #[test]
    fn test_rotate_zero_angle_is_noop() {
        let original = Transform::from_position(3.0, -1.0, 2.0).with_euler(RotationState::new(0.5, 0.0, 0.2));
        let mut transform = original.clone();
        transform
            .rotate_around_pivot(&Point3::new(1.0, 1.0, 1.0), &Vector3::z(), 0.0)
            .unwrap();
        assert_relative_eq!(transform.position, original.position, epsilon = EPSILON);
        assert_relative_eq!(transform.orientation, original.orientation, epsilon = EPSILON);
    }

    #[test]
    fn test_repeated_quarter_turns_compose() {
        let mut transform = Transform::from_position(2.0, 0.0, 0.0);
        let pivot = Point3::new(1.0, 0.0, 0.0);
        for _ in 0..4 {
            transform.rotate_around_pivot(&pivot, &Vector3::z(), FRAC_PI_2).unwrap();
        }
        assert_relative_eq!(transform.position, Vector3::new(2.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(transform.orientation, UnitQuaternion::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_rotation_keeps_distance_to_pivot() {
        let mut transform = Transform::from_position(4.0, 1.0, -3.0);
        let pivot = Point3::new(1.0, 1.0, 1.0);
        let before = (transform.position - pivot.coords).norm();
        transform
            .rotate_around_pivot(&pivot, &Vector3::new(1.0, 1.0, 0.0), 0.7)
            .unwrap();
        assert_relative_eq!((transform.position - pivot.coords).norm(), before, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_composes_after_previous_orientation() {
        let previous = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let step = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        let mut transform = Transform::identity();
        transform.orientation = previous;
        transform
            .rotate_around_pivot(&Point3::origin(), &Vector3::y(), FRAC_PI_2)
            .unwrap();

        let expected = previous * step;
        assert_relative_eq!(transform.orientation, expected, epsilon = EPSILON);
        assert_relative_eq!(
            transform.orientation.into_inner().coords,
            nalgebra::Vector4::new(0.5, 0.5, 0.5, 0.5),
            epsilon = EPSILON
        );
        // The other order is a different rotation entirely
        assert!(transform.orientation.angle_to(&(step * previous)) > 1.0);
    }

    #[test]
    fn test_rotate_rejects_zero_axis() {
        let original = Transform::from_position(1.0, 0.0, 0.0);
        let mut transform = original.clone();
        let result = transform.rotate_around_pivot(&Point3::origin(), &Vector3::zeros(), 1.0);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(transform, original);
    }

    #[test]
    fn test_rotate_rejects_non_finite_angle() {
        let mut transform = Transform::identity();
        let result = transform.rotate_around_pivot(&Point3::origin(), &Vector3::x(), f32::NAN);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_scale_from_origin_pivot() {
        let mut transform = Transform::identity();
        transform.scale_from_pivot(&Point3::origin(), 2.0, 2.0, 2.0).unwrap();
        assert_eq!(transform.position, Vector3::zeros());
        assert_eq!(transform.scale, Vector3::new(2.0, 2.0, 2.0));

        // Already at the target scale: ratio 1, nothing moves
        transform.scale_from_pivot(&Point3::new(1.0, 0.0, 0.0), 2.0, 2.0, 2.0).unwrap();
        assert_eq!(transform.position, Vector3::zeros());
        assert_eq!(transform.scale, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_scale_keeps_pivot_fixed() {
        let mut transform = Transform::from_position(2.0, 2.0, 2.0);
        transform.scale_from_pivot(&Point3::new(1.0, 1.0, 1.0), 3.0, 1.0, 0.5).unwrap();
        assert_relative_eq!(transform.position, Vector3::new(4.0, 2.0, 1.5), epsilon = EPSILON);
        assert_eq!(transform.scale, Vector3::new(3.0, 1.0, 0.5));
    }

    #[test]
    fn test_scale_there_and_back_restores_position() {
        let original = Transform::from_position(-1.0, 3.0, 0.25).with_scale(1.5, 0.5, 2.0);
        let mut transform = original.clone();
        let pivot = Point3::new(2.0, -1.0, 4.0);
        transform.scale_from_pivot(&pivot, 4.0, -2.0, 0.1).unwrap();
        transform
            .scale_from_pivot(&pivot, original.scale.x, original.scale.y, original.scale.z)
            .unwrap();
        assert_relative_eq!(transform.position, original.position, epsilon = 1e-4);
        assert_relative_eq!(transform.scale, original.scale, epsilon = EPSILON);
    }

    #[test]
    fn test_scale_rejects_zero_scale() {
        let original = Transform::identity().with_scale(1.0, 0.0, 1.0);
        let mut transform = original.clone();
        let result = transform.scale_from_pivot(&Point3::origin(), 2.0, 2.0, 2.0);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(transform, original);

        let mut transform = Transform::identity();
        assert!(transform.scale_from_pivot(&Point3::origin(), 0.0, 1.0, 1.0).is_err());
        assert_eq!(transform, Transform::identity());
    }

    #[test]
    fn test_scale_from_min_corner() {
        let mut transform = Transform::from_position(0.5, 0.5, 0.5);
        transform.scale_from_min_corner(2.0, 4.0, 1.0).unwrap();
        assert_relative_eq!(transform.position, Vector3::new(1.0, 2.0, 0.5), epsilon = EPSILON);
        // The minimum corner is still at the origin
        assert_relative_eq!(transform.position - transform.scale / 2.0, Vector3::zeros(), epsilon = EPSILON);
    }
}
