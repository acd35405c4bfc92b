//! Input mesh faces and canonical convex faces.

use nalgebra::{Point3, Vector3};

use crate::{Plane3D, PlaneId};

/// A face record supplied by the mesh collaborator.
///
/// Vertices are ordered with consistent winding; the plane is derived from
/// them. `source` is an optional identity of the face in the source mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFace {
    vertices: Vec<Point3<f32>>,
    source: Option<usize>,
}

impl MeshFace {
    pub fn new(vertices: Vec<Point3<f32>>) -> Self {
        Self {
            vertices,
            source: None,
        }
    }

    /// Tags the face with its identity in the source mesh.
    pub fn with_source(mut self, source: usize) -> Self {
        self.source = Some(source);
        self
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    /// The plane through the face, or `None` for fewer than three vertices
    /// or a zero-area (collinear) ring.
    ///
    /// Uses Newell's method so that the normal of a non-triangular face does
    /// not depend on which three vertices happen to come first.
    pub fn plane(&self) -> Option<Plane3D> {
        if self.vertices.len() < 3 {
            return None;
        }
        let normal = newell_normal(&self.vertices);
        if normal.norm() <= f32::EPSILON {
            return None;
        }
        Some(Plane3D::from_point_and_normal(centroid(&self.vertices), normal))
    }
}

/// A convex polygon of canonical points bound to a canonical plane.
///
/// Vertex order is the winding of the face it was derived from; splitting
/// keeps that order on both halves.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexFace {
    vertices: Vec<Point3<f32>>,
    plane: PlaneId,
    source: Option<usize>,
}

impl ConvexFace {
    /// Creates a face from canonical vertices lying on `plane`.
    ///
    /// # Panics
    /// Panics if fewer than 3 vertices are provided.
    pub fn new(vertices: Vec<Point3<f32>>, plane: PlaneId) -> Self {
        assert!(vertices.len() >= 3, "ConvexFace must have at least 3 vertices");
        Self {
            vertices,
            plane,
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, source: Option<usize>) -> Self {
        self.source = source;
        self
    }

    /// Returns the vertices of the face.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The canonical plane this face lies on.
    #[inline]
    pub fn plane(&self) -> PlaneId {
        self.plane
    }

    /// Identity of the source mesh face this face (or the face it was split
    /// from) came from.
    #[inline]
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    /// True when no two vertices are within `epsilon` of each other.
    pub fn is_valid(&self, epsilon: f32) -> bool {
        let eps2 = epsilon * epsilon;
        self.vertices.iter().enumerate().all(|(i, a)| {
            self.vertices[i + 1..]
                .iter()
                .all(|b| (b - a).norm_squared() > eps2)
        })
    }

    /// Computes the centroid (vertex average) of the face.
    pub fn centroid(&self) -> Point3<f32> {
        centroid(&self.vertices)
    }

    /// Area of the polygon.
    pub fn area(&self) -> f32 {
        newell_normal(&self.vertices).norm() * 0.5
    }
}

fn centroid(vertices: &[Point3<f32>]) -> Point3<f32> {
    let sum: Vector3<f32> = vertices.iter().map(|p| p.coords).sum();
    Point3::from(sum / vertices.len() as f32)
}

/// Twice the vector area of a closed polygon ring.
pub(crate) fn newell_normal(vertices: &[Point3<f32>]) -> Vector3<f32> {
    let n = vertices.len();
    (0..n).fold(Vector3::zeros(), |acc, i| {
        let a = vertices[i].coords;
        let b = vertices[(i + 1) % n].coords;
        acc + a.cross(&b)
    })
}

/// The 6 outward-wound quads of an axis-aligned box.
pub fn box_faces(min: Point3<f32>, max: Point3<f32>) -> Vec<MeshFace> {
    let corners = [
        Point3::new(min.x, min.y, min.z), // 0: left-bottom-back
        Point3::new(max.x, min.y, min.z), // 1: right-bottom-back
        Point3::new(max.x, max.y, min.z), // 2: right-top-back
        Point3::new(min.x, max.y, min.z), // 3: left-top-back
        Point3::new(min.x, min.y, max.z), // 4: left-bottom-front
        Point3::new(max.x, min.y, max.z), // 5: right-bottom-front
        Point3::new(max.x, max.y, max.z), // 6: right-top-front
        Point3::new(min.x, max.y, max.z), // 7: left-top-front
    ];

    // counter-clockwise viewed from outside
    let faces: [[usize; 4]; 6] = [
        [4, 5, 6, 7], // front (+Z)
        [1, 0, 3, 2], // back (-Z)
        [0, 4, 7, 3], // left (-X)
        [5, 1, 2, 6], // right (+X)
        [7, 6, 2, 3], // top (+Y)
        [0, 1, 5, 4], // bottom (-Y)
    ];

    faces
        .iter()
        .enumerate()
        .map(|(i, idx)| MeshFace::new(idx.iter().map(|&c| corners[c]).collect()).with_source(i))
        .collect()
}

/// The 6 faces of an axis-aligned cube.
pub fn cube_faces(center: Point3<f32>, size: f32) -> Vec<MeshFace> {
    let half = Vector3::repeat(size / 2.0);
    box_faces(center - half, center + half)
}
