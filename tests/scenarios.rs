//! End-to-end scenarios over the public API.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use approx::assert_relative_eq;
use wingmesh::io::{read_stl, read_stl_into, write_ply, write_stl, PlyOptions, StlOptions};
use nalgebra::Matrix3;
use wingmesh::math::{Point3, Ray, Vector3};
use wingmesh::operations::query::MeshIntersector;
use wingmesh::operations::smooth::LaplacianSmooth;
use wingmesh::operations::subdivide::{subdivide, Midpoint};
use wingmesh::{IndexedMesh, Mesh, TopologyMesh, VertexSelection};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Corner `i` of the cube spanning `[-50, 50]^3`; bits 0, 1, 2 select +x, +y, +z.
fn corner(i: usize) -> Point3 {
    let c = |bit: usize| if i & bit == 0 { -50.0 } else { 50.0 };
    Point3::new(c(1), c(2), c(4))
}

/// Outward-facing quads of the cube.
const QUADS: [[usize; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

fn build_cube<M: Mesh>(mesh: &mut M) {
    for [a, b, c, d] in QUADS {
        mesh.add_face(corner(a), corner(b), corner(c));
        mesh.add_face(corner(a), corner(c), corner(d));
    }
}

fn normals_point_outward(mesh: &IndexedMesh) -> bool {
    mesh.faces().all(|(id, face)| {
        let Ok([a, b, c]) = mesh.face_positions(id) else {
            return false;
        };
        let center = (a.coords + b.coords + c.coords) / 3.0;
        face.normal.dot(&center) > 0.0
    })
}

/// `n x n` vertex grid in the xy-plane.
fn grid(n: u32) -> TopologyMesh {
    let mut mesh = TopologyMesh::new();
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            let (x, y) = (f64::from(i), f64::from(j));
            let p = |dx: f64, dy: f64| Point3::new(x + dx, y + dy, 0.0);
            mesh.add_face(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0));
            mesh.add_face(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0));
        }
    }
    mesh
}

/// Mean squared distance (along z) of the vertices to their least-squares
/// plane `z = a x + b y + c`.
fn plane_residual(mesh: &TopologyMesh) -> f64 {
    let mut normal = Matrix3::zeros();
    let mut rhs = Vector3::zeros();
    for (_, v) in mesh.vertices() {
        let row = Vector3::new(v.position.x, v.position.y, 1.0);
        normal += row * row.transpose();
        rhs += row * v.position.z;
    }
    let coeffs = normal.lu().solve(&rhs).unwrap();

    let sum: f64 = mesh
        .vertices()
        .map(|(_, v)| {
            let fitted = coeffs.dot(&Vector3::new(v.position.x, v.position.y, 1.0));
            (v.position.z - fitted).powi(2)
        })
        .sum();
    sum / f64::from(u32::try_from(mesh.vertex_count()).unwrap())
}

#[test]
fn unit_cube_counts() {
    init_tracing();
    let mut cube = TopologyMesh::with_name("cube");
    build_cube(&mut cube);

    assert_eq!(cube.vertex_count(), 8);
    assert_eq!(cube.face_count(), 12);
    assert_eq!(cube.edge_count(), 18);
    assert!(cube.edges().all(|(_, e)| e.faces.len() == 2));
    assert!(normals_point_outward(&cube));
    cube.validate().unwrap();

    let sphere = cube.bounding_sphere().unwrap();
    assert_relative_eq!(sphere.center, Point3::origin());
    assert_relative_eq!(sphere.radius, 50.0 * 3.0_f64.sqrt());
}

#[test]
fn cube_subdivision_quadruples_faces() {
    init_tracing();
    let mut cube = TopologyMesh::new();
    build_cube(&mut cube);

    let report = subdivide(&mut cube, &Midpoint::default(), 0.0).unwrap();
    assert_eq!(report.edges_split, 18);
    assert_eq!(report.faces_after, 48);
    assert_eq!(cube.vertex_count(), 8 + 18);
    assert!(cube.boundary_edges().is_empty());
    assert!(normals_point_outward(&cube));
    cube.validate().unwrap();
}

#[test]
fn laplacian_smoothing_converges_to_a_plane() {
    init_tracing();
    let mut mesh = grid(7);

    // Deterministic noise on every interior vertex.
    for i in 1..6_u32 {
        for j in 1..6_u32 {
            let (x, y) = (f64::from(i), f64::from(j));
            let id = mesh.vertex_at(&Point3::new(x, y, 0.0)).unwrap();
            let z = f64::from((i * 7 + j * 13) % 5) * 0.2 - 0.4;
            mesh.set_vertex_position(id, Point3::new(x, y, z)).unwrap();
        }
    }
    mesh.rebuild_index();

    let selection = VertexSelection::interior(&mesh);
    assert_eq!(selection.len(), 25);

    let initial = plane_residual(&mesh);
    assert!(initial > 1e-3);

    let epsilon = 1e-12;
    let mut residual = initial;
    let mut iterations = 0;
    while residual > epsilon && iterations < 500 {
        LaplacianSmooth::new(1).execute(&mut mesh, &selection).unwrap();
        residual = plane_residual(&mesh);
        iterations += 1;
    }
    assert!(residual <= epsilon, "residual {residual} after {iterations} iterations");

    for (_, vertex) in mesh.vertices() {
        assert_relative_eq!(vertex.position.z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(vertex.normal, Vector3::z(), epsilon = 1e-3);
    }
    mesh.validate().unwrap();
}

#[test]
fn ray_hits_cube_top() {
    init_tracing();
    let mut cube = IndexedMesh::new();
    build_cube(&mut cube);

    let intersector = MeshIntersector::new(&cube);
    let ray = Ray::new(Point3::new(10.0, -20.0, 150.0), -Vector3::z()).unwrap();
    let hit = intersector.intersects_ray(&ray).unwrap();
    assert_relative_eq!(hit.distance, 100.0);
    assert_relative_eq!(hit.point, Point3::new(10.0, -20.0, 50.0));
    assert_relative_eq!(hit.normal, Vector3::z());

    let miss = Ray::new(Point3::new(60.0, 0.0, 150.0), -Vector3::z()).unwrap();
    assert!(intersector.intersects_ray(&miss).is_none());
}

#[test]
fn stl_round_trip() {
    init_tracing();
    let mut cube = IndexedMesh::new();
    build_cube(&mut cube);

    let mut bytes = Vec::new();
    write_stl(&cube, &mut bytes, &StlOptions::default()).unwrap();
    assert_eq!(bytes.len(), 84 + 12 * 50);

    let read = read_stl(Cursor::new(&bytes)).unwrap();
    assert_eq!(read.vertex_count(), 8);
    assert_eq!(read.face_count(), 12);
    assert!(normals_point_outward(&read));
    for (_, vertex) in read.vertices() {
        let expected = vertex.position.coords.normalize();
        assert!(vertex.normal.dot(&expected) > 0.5);
    }

    let mut topo = TopologyMesh::new();
    read_stl_into(&mut topo, Cursor::new(&bytes)).unwrap();
    assert_eq!(topo.edge_count(), 18);
    topo.validate().unwrap();
}

#[test]
fn ply_size() {
    init_tracing();
    let mut cube = IndexedMesh::new();
    build_cube(&mut cube);
    cube.compute_vertex_normals();

    let options = PlyOptions {
        with_normals: true,
        comment: None,
    };
    let mut bytes = Vec::new();
    write_ply(&cube, &mut bytes, &options).unwrap();
    let header_len = bytes
        .windows(11)
        .position(|w| w == b"end_header\n")
        .unwrap()
        + 11;
    assert_eq!(bytes.len() - header_len, 8 * 24 + 12 * 13);
}
