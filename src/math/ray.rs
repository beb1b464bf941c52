use crate::error::{OperationError, Result};

use super::{Point3, Vector3, TOLERANCE};

/// A half-line `origin + t * direction` with `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point of the ray.
    pub origin: Point3,
    /// Unit-length direction.
    pub direction: Vector3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    ///
    /// # Errors
    ///
    /// Returns an error if `direction` is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let direction = direction
            .try_normalize(TOLERANCE)
            .ok_or_else(|| OperationError::InvalidInput("zero-length ray direction".into()))?;
        Ok(Self { origin, direction })
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Intersects a ray with the triangle `(a, b, c)` using the Möller–Trumbore
/// algorithm.
///
/// Returns the distance along the ray, or `None` when the ray is parallel to
/// the triangle, misses it, or hits it behind the origin.
#[must_use]
pub fn ray_triangle_intersect(ray: &Ray, a: &Point3, b: &Point3, c: &Point3) -> Option<f64> {
    let e1 = b - a;
    let e2 = c - a;

    let p = ray.direction.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < TOLERANCE {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = ray.direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    (t > TOLERANCE).then_some(t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Ray::new(Point3::origin(), Vector3::zeros()).is_err());
    }

    #[test]
    fn direction_is_normalized() {
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 3.0, 4.0)).unwrap();
        assert_relative_eq!(ray.direction.norm(), 1.0);
        assert_relative_eq!(ray.point_at(5.0), p(0.0, 3.0, 4.0));
    }

    #[test]
    fn hits_triangle_from_either_side() {
        let (a, b, c) = (p(-1.0, -1.0, 0.0), p(1.0, -1.0, 0.0), p(0.0, 1.0, 0.0));
        let down = Ray::new(p(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let up = Ray::new(p(0.0, 0.0, -2.0), Vector3::new(0.0, 0.0, 1.0)).unwrap();
        assert_relative_eq!(ray_triangle_intersect(&down, &a, &b, &c).unwrap(), 5.0);
        assert_relative_eq!(ray_triangle_intersect(&up, &a, &b, &c).unwrap(), 2.0);
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(p(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let hit = ray_triangle_intersect(&ray, &p(-1.0, -1.0, 0.0), &p(1.0, -1.0, 0.0), &p(0.0, 1.0, 0.0));
        assert!(hit.is_none());
    }

    #[test]
    fn ray_outside_triangle_misses() {
        let ray = Ray::new(p(5.0, 5.0, 1.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let hit = ray_triangle_intersect(&ray, &p(-1.0, -1.0, 0.0), &p(1.0, -1.0, 0.0), &p(0.0, 1.0, 0.0));
        assert!(hit.is_none());
    }

    #[test]
    fn triangle_behind_origin_misses() {
        let ray = Ray::new(p(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 1.0)).unwrap();
        let hit = ray_triangle_intersect(&ray, &p(-1.0, -1.0, 0.0), &p(1.0, -1.0, 0.0), &p(0.0, 1.0, 0.0));
        assert!(hit.is_none());
    }
}
