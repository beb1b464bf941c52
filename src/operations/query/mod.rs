mod ray_intersect;

pub use ray_intersect::{MeshIntersector, RayHit};
