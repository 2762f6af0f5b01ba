/// Rays and analytic pick volumes for the primitive objects
use nalgebra::{Point3, Unit, Vector3};

use crate::error::{Error, Result};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin in world space
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    /// Creates a ray, normalizing `direction`
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Result<Self> {
        let length = direction.norm();
        if !length.is_finite() || length <= f32::MIN_POSITIVE {
            return Err(Error::invalid(format!(
                "ray direction must be finite and non-zero, got {direction:?}"
            )));
        }
        Ok(Self {
            origin,
            direction: Unit::new_unchecked(direction / length),
        })
    }

    /// Point at parameter `t` along the ray
    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.as_ref() * t
    }
}

/// Local-space intersection: ray parameter and outward surface normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    pub t: f32,
    pub normal: Vector3<f32>,
}

/// Pick volume of a primitive, centred on the object's local origin.
///
/// The volumes are analytic; no triangle mesh is ever built for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned box in local space
    Cuboid { width: f32, height: f32, depth: f32 },
    Sphere { diameter: f32 },
    /// Finite plane at local y = 0, facing +y
    Ground { width: f32, depth: f32 },
}

impl Shape {
    pub fn unit_box() -> Self {
        Shape::Cuboid {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
    }

    /// Intersect a ray given in this shape's local space.
    ///
    /// `direction` need not be unit length (object-space rays carry the
    /// inverse scale), so `t` is in units of `direction`.
    pub fn intersect_local(&self, origin: &Point3<f32>, direction: &Vector3<f32>) -> Option<LocalHit> {
        match *self {
            Shape::Cuboid { width, height, depth } => {
                intersect_box(origin, direction, Vector3::new(width, height, depth) / 2.0)
            }
            Shape::Sphere { diameter } => intersect_sphere(origin, direction, diameter / 2.0),
            Shape::Ground { width, depth } => intersect_ground(origin, direction, width / 2.0, depth / 2.0),
        }
    }
}

/// Slab test against a box centred on the origin
fn intersect_box(origin: &Point3<f32>, direction: &Vector3<f32>, half: Vector3<f32>) -> Option<LocalHit> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut enter_axis = 0;
    let mut exit_axis = 0;

    for axis in 0..3 {
        if direction[axis] == 0.0 {
            // Parallel to this slab: either always inside it or never
            if origin[axis] < -half[axis] || origin[axis] > half[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction[axis];
        let mut t0 = (-half[axis] - origin[axis]) * inv;
        let mut t1 = (half[axis] - origin[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_enter {
            t_enter = t0;
            enter_axis = axis;
        }
        if t1 < t_exit {
            t_exit = t1;
            exit_axis = axis;
        }
    }

    if t_enter > t_exit || t_exit < 0.0 {
        return None;
    }

    // Starting inside the box reports the exit face
    let (t, axis) = if t_enter >= 0.0 {
        (t_enter, enter_axis)
    } else {
        (t_exit, exit_axis)
    };
    let hit = origin + direction * t;
    let mut normal = Vector3::zeros();
    normal[axis] = hit[axis].signum();
    Some(LocalHit { t, normal })
}

fn intersect_sphere(origin: &Point3<f32>, direction: &Vector3<f32>, radius: f32) -> Option<LocalHit> {
    // Solve |origin + t*direction|^2 = radius^2
    let oc = origin.coords;
    let a = direction.dot(direction);
    let b = 2.0 * oc.dot(direction);
    let c = oc.dot(&oc) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || a == 0.0 {
        return None;
    }

    let sqrt_discriminant = discriminant.sqrt();
    let t1 = (-b - sqrt_discriminant) / (2.0 * a);
    let t2 = (-b + sqrt_discriminant) / (2.0 * a);

    // Use the closest non-negative intersection
    let t = if t1 >= 0.0 {
        t1
    } else if t2 >= 0.0 {
        t2
    } else {
        return None;
    };

    let normal = (origin + direction * t).coords.normalize();
    Some(LocalHit { t, normal })
}

fn intersect_ground(origin: &Point3<f32>, direction: &Vector3<f32>, half_width: f32, half_depth: f32) -> Option<LocalHit> {
    if direction.y == 0.0 {
        return None;
    }
    let t = -origin.y / direction.y;
    if t < 0.0 {
        return None;
    }
    let hit = origin + direction * t;
    if hit.x.abs() > half_width || hit.z.abs() > half_depth {
        return None;
    }
    // The ground is double sided; report the face the ray came from
    let normal = Vector3::new(0.0, -direction.y.signum(), 0.0);
    Some(LocalHit { t, normal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -4.0)).unwrap();
        assert_relative_eq!(ray.direction.into_inner(), Vector3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(ray.point_at(2.0), Point3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn test_ray_rejects_zero_direction() {
        assert!(matches!(
            Ray::new(Point3::origin(), Vector3::zeros()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_box_front_face() {
        let hit = Shape::unit_box()
            .intersect_local(&Point3::new(0.0, 0.0, 5.0), &Vector3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_relative_eq!(hit.t, 4.5);
        assert_relative_eq!(hit.normal, Vector3::z());
    }

    #[test]
    fn test_box_miss_and_behind() {
        let shape = Shape::unit_box();
        assert!(shape
            .intersect_local(&Point3::new(2.0, 0.0, 5.0), &Vector3::new(0.0, 0.0, -1.0))
            .is_none());
        assert!(shape
            .intersect_local(&Point3::new(0.0, 0.0, 5.0), &Vector3::new(0.0, 0.0, 1.0))
            .is_none());
    }

    #[test]
    fn test_box_from_inside_reports_exit() {
        let hit = Shape::unit_box()
            .intersect_local(&Point3::origin(), &Vector3::x())
            .unwrap();
        assert_relative_eq!(hit.t, 0.5);
        assert_relative_eq!(hit.normal, Vector3::x());
    }

    #[test]
    fn test_sphere_hit() {
        let hit = Shape::Sphere { diameter: 2.0 }
            .intersect_local(&Point3::new(0.0, 5.0, 0.0), &Vector3::new(0.0, -1.0, 0.0))
            .unwrap();
        assert_relative_eq!(hit.t, 4.0);
        assert_relative_eq!(hit.normal, Vector3::y());
    }

    #[test]
    fn test_ground_bounds() {
        let ground = Shape::Ground { width: 10.0, depth: 4.0 };
        let down = Vector3::new(0.0, -1.0, 0.0);
        let hit = ground.intersect_local(&Point3::new(4.0, 3.0, 1.0), &down).unwrap();
        assert_relative_eq!(hit.t, 3.0);
        assert_relative_eq!(hit.normal, Vector3::y());
        assert!(ground.intersect_local(&Point3::new(0.0, 3.0, 3.0), &down).is_none());
        assert!(ground.intersect_local(&Point3::new(0.0, 3.0, 0.0), &Vector3::x()).is_none());
    }
}
