//! Classification and splitting of faces against canonical planes.

use nalgebra::Point3;

use crate::canon::{PlaneCanonicalizer, PointCanonicalizer};
use crate::{ConvexFace, MeshFace, Plane3D, PlaneId, PlaneSide, PointId, Sides};

/// Geometry that can be cut by a plane.
///
/// Implementors expose their vertex ring and know how to rebuild themselves
/// around a clipped ring, carrying over whatever tags they hold.
pub trait Splittable: Sized {
    /// The ordered vertex ring.
    fn vertices(&self) -> &[Point3<f32>];

    /// A copy of `self` with a replacement vertex ring.
    fn with_vertices(&self, vertices: Vec<Point3<f32>>) -> Self;
}

impl Splittable for ConvexFace {
    fn vertices(&self) -> &[Point3<f32>] {
        ConvexFace::vertices(self)
    }

    fn with_vertices(&self, vertices: Vec<Point3<f32>>) -> Self {
        ConvexFace::new(vertices, self.plane()).with_source(self.source())
    }
}

/// Result of cutting a face by a plane.
#[derive(Debug, Clone)]
pub struct Split<T> {
    /// Part behind the plane, if it kept more than two vertices.
    pub neg: Option<T>,
    /// Part in front of the plane, if it kept more than two vertices.
    pub pos: Option<T>,
    /// Edge/plane intersection points created by the cut.
    pub on_plane: Vec<PointId>,
}

/// The canonical point and plane sets of one build, plus the epsilon that
/// governs them.
#[derive(Debug, Clone)]
pub struct Geometry {
    epsilon: f32,
    points: PointCanonicalizer,
    planes: PlaneCanonicalizer,
}

impl Geometry {
    /// Empty point and plane sets sharing one merge distance.
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon,
            points: PointCanonicalizer::new(epsilon),
            planes: PlaneCanonicalizer::new(epsilon),
        }
    }

    /// Merge distance for points and planes, also the classification
    /// tolerance.
    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Looks up a canonical plane.
    #[inline]
    pub fn plane(&self, id: PlaneId) -> &Plane3D {
        self.planes.plane(id)
    }

    /// Looks up a canonical point.
    #[inline]
    pub fn point(&self, id: PointId) -> Point3<f32> {
        self.points.point(id)
    }

    /// Number of canonical points created so far.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of canonical planes created so far.
    #[inline]
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Resolves `point` to the canonical point within epsilon, inserting
    /// it if there is none.
    pub fn canonical_point(&mut self, point: Point3<f32>) -> PointId {
        self.points.canonicalize(point)
    }

    /// Same as [`Self::canonical_point`] for planes. `plane` and
    /// `plane.flipped()` give the same id.
    pub fn canonical_plane(&mut self, plane: &Plane3D) -> PlaneId {
        self.planes.canonicalize(plane)
    }

    /// Canonicalizes a mesh face.
    ///
    /// Returns `None` for faces that are degenerate before or after their
    /// vertices are merged.
    pub fn face_from_mesh(&mut self, mesh: &MeshFace) -> Option<ConvexFace> {
        let plane = mesh.plane()?;
        let plane = self.canonical_plane(&plane);

        let mut ids: Vec<PointId> = Vec::with_capacity(mesh.vertices().len());
        for v in mesh.vertices() {
            push_ring(&mut ids, self.canonical_point(*v));
        }
        close_ring(&mut ids);
        if ids.len() < 3 {
            return None;
        }

        let vertices = ids.iter().map(|id| self.point(*id)).collect();
        let face = ConvexFace::new(vertices, plane).with_source(mesh.source());
        face.is_valid(self.epsilon).then_some(face)
    }

    /// Bitmask of the sides the face's vertices fall on.
    pub fn classify_face<T: Splittable>(&self, plane: PlaneId, face: &T) -> Sides {
        self.plane(plane).classify_points(face.vertices(), self.epsilon)
    }

    /// Canonical ids of the face's vertices lying on the plane.
    pub fn on_plane_vertices<T: Splittable>(&mut self, plane: PlaneId, face: &T) -> Vec<PointId> {
        let plane = self.plane(plane).clone();
        face.vertices()
            .iter()
            .filter(|v| plane.classify_point(**v, self.epsilon) == PlaneSide::OnPlane)
            .map(|v| self.points.canonicalize(*v))
            .collect()
    }

    /// Splits a face by a plane.
    ///
    /// Walks the vertex ring: vertices not behind the plane go to the front
    /// part, vertices not in front go to the back part, so on-plane vertices
    /// land in both. Every edge running strictly from one side to the other
    /// contributes its (canonical) intersection point to both parts. A part
    /// is only produced if it keeps more than two vertices.
    pub fn split_face<T: Splittable>(&mut self, plane: PlaneId, face: &T) -> Split<T> {
        let plane = self.plane(plane).clone();
        let vertices = face.vertices();
        let n = vertices.len();

        let sides: Vec<PlaneSide> = vertices
            .iter()
            .map(|v| plane.classify_point(*v, self.epsilon))
            .collect();

        let mut neg = Vec::with_capacity(n + 1);
        let mut pos = Vec::with_capacity(n + 1);
        let mut on_plane = Vec::new();

        for i in 0..n {
            let current = vertices[i];
            let j = (i + 1) % n;
            let id = self.points.canonicalize(current);

            if sides[i] != PlaneSide::Back {
                push_ring(&mut pos, id);
            }
            if sides[i] != PlaneSide::Front {
                push_ring(&mut neg, id);
            }

            let crosses = matches!(
                (sides[i], sides[j]),
                (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
            );
            if !crosses {
                continue;
            }
            // A parallel edge cannot cross; skip rather than fail the split.
            if let Some(hit) = plane.intersect_line(current, vertices[j] - current) {
                let hit = self.points.canonicalize(hit);
                push_ring(&mut pos, hit);
                push_ring(&mut neg, hit);
                on_plane.push(hit);
            }
        }
        close_ring(&mut neg);
        close_ring(&mut pos);

        Split {
            neg: self.rebuild(face, &neg),
            pos: self.rebuild(face, &pos),
            on_plane,
        }
    }

    fn rebuild<T: Splittable>(&self, face: &T, ring: &[PointId]) -> Option<T> {
        (ring.len() > 2).then(|| face.with_vertices(ring.iter().map(|id| self.point(*id)).collect()))
    }
}

/// Appends a point unless it repeats the previous one.
fn push_ring(ring: &mut Vec<PointId>, id: PointId) {
    if ring.last() != Some(&id) {
        ring.push(id);
    }
}

/// Drops a trailing point that repeats the first one.
fn close_ring(ring: &mut Vec<PointId>) {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
}
