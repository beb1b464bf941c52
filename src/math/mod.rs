pub mod aabb;
pub mod ray;
pub mod sphere;

pub use aabb::Aabb;
pub use ray::{ray_triangle_intersect, Ray};
pub use sphere::BoundingSphere;

/// 2D point type, used for texture coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Normal of the triangle `(a, b, c)` following the right-hand rule.
///
/// Returns the zero vector for collinear input.
#[must_use]
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Vector3 {
    (b - a)
        .cross(&(c - a))
        .try_normalize(TOLERANCE)
        .unwrap_or_else(Vector3::zeros)
}

/// Transforms a point by a 4x4 matrix (homogeneous coordinates).
#[must_use]
pub fn transform_point(matrix: &Matrix4, point: &Point3) -> Point3 {
    let v = matrix * nalgebra::Vector4::new(point.x, point.y, point.z, 1.0);
    Point3::new(v.x, v.y, v.z)
}
