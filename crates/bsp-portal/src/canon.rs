//! Epsilon deduplication of points and planes.
//!
//! Every canonicalizer is a nearest-neighbour lookup in an R-tree: a
//! candidate within epsilon of an existing entry resolves to that entry,
//! anything else is inserted. Entries are never removed.

use nalgebra::{Point2, Point3, Vector3};
use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree};

use crate::Plane3D;

/// Deduplicates `N`-dimensional keys within an epsilon.
#[derive(Debug, Clone)]
pub struct Canonicalizer<const N: usize>
where
    [f32; N]: rstar::Point<Scalar = f32>,
{
    epsilon: f32,
    index: RTree<GeomWithData<[f32; N], usize>>,
    keys: Vec<[f32; N]>,
}

impl<const N: usize> Canonicalizer<N>
where
    [f32; N]: rstar::Point<Scalar = f32>,
{
    /// Creates an empty canonicalizer.
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon,
            index: RTree::new(),
            keys: Vec::new(),
        }
    }

    /// Returns the index of the existing key within epsilon of `key`, or
    /// inserts `key` and returns its new index.
    pub fn canonicalize(&mut self, key: [f32; N]) -> usize {
        if let Some(nearest) = self.index.nearest_neighbor(&key) {
            if nearest.distance_2(&key) <= self.epsilon * self.epsilon {
                return nearest.data;
            }
        }
        let id = self.keys.len();
        self.keys.push(key);
        self.index.insert(GeomWithData::new(key, id));
        id
    }

    /// Returns the stored key for an index.
    #[inline]
    pub fn key(&self, id: usize) -> [f32; N] {
        self.keys[id]
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if nothing was inserted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The merge distance.
    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }
}

/// Identity of a canonical point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub usize);

/// Identity of a canonical plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaneId(pub usize);

/// Canonical 3D points.
#[derive(Debug, Clone)]
pub struct PointCanonicalizer {
    inner: Canonicalizer<3>,
}

impl PointCanonicalizer {
    /// Creates an empty point set merging within `epsilon`.
    pub fn new(epsilon: f32) -> Self {
        Self {
            inner: Canonicalizer::new(epsilon),
        }
    }

    /// Id of the stored point within epsilon of `point`; inserts it if
    /// there is none.
    pub fn canonicalize(&mut self, point: Point3<f32>) -> PointId {
        PointId(self.inner.canonicalize([point.x, point.y, point.z]))
    }

    /// Resolves a point to its canonical coordinates.
    pub fn snap(&mut self, point: Point3<f32>) -> (PointId, Point3<f32>) {
        let id = self.canonicalize(point);
        (id, self.point(id))
    }

    /// Coordinates of a canonical point.
    ///
    /// # Panics
    ///
    /// If `id` did not come from this canonicalizer.
    pub fn point(&self, id: PointId) -> Point3<f32> {
        let [x, y, z] = self.inner.key(id.0);
        Point3::new(x, y, z)
    }

    /// Number of distinct points.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Canonical planes keyed on `(normal, offset)`.
///
/// Planes are sign-normalized before lookup so that a plane and its flipped
/// description resolve to one instance: the offset is made non-negative, and
/// for planes through the origin (|offset| within epsilon) the first
/// non-negligible normal component is made positive.
#[derive(Debug, Clone)]
pub struct PlaneCanonicalizer {
    inner: Canonicalizer<4>,
    planes: Vec<Plane3D>,
}

impl PlaneCanonicalizer {
    /// Creates an empty plane set. `epsilon` bounds the distance between
    /// `[nx, ny, nz, offset]` keys that merge.
    pub fn new(epsilon: f32) -> Self {
        Self {
            inner: Canonicalizer::new(epsilon),
            planes: Vec::new(),
        }
    }

    /// Sign-normalizes `plane` and resolves it to a shared instance.
    pub fn canonicalize(&mut self, plane: &Plane3D) -> PlaneId {
        let epsilon = self.inner.epsilon();
        let (normal, offset) = sign_normalized(plane.normal(), plane.offset(), epsilon);
        let id = self
            .inner
            .canonicalize([normal.x, normal.y, normal.z, offset]);
        if id == self.planes.len() {
            self.planes.push(Plane3D::new(normal, offset));
        }
        PlaneId(id)
    }

    /// The stored, sign-normalized plane.
    pub fn plane(&self, id: PlaneId) -> &Plane3D {
        &self.planes[id.0]
    }

    /// Number of distinct planes.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}

fn sign_normalized(normal: Vector3<f32>, offset: f32, epsilon: f32) -> (Vector3<f32>, f32) {
    let flip = if offset.abs() > epsilon {
        offset < 0.0
    } else {
        normal
            .iter()
            .find(|c| c.abs() > epsilon)
            .is_some_and(|c| *c < 0.0)
    };
    if flip {
        (-normal, -offset)
    } else {
        (normal, offset.max(0.0))
    }
}

/// Merges near-duplicate plane coordinates before polygons are handed to
/// the clip kernel.
#[derive(Debug, Clone)]
pub struct Point2Canonicalizer {
    inner: Canonicalizer<2>,
}

impl Point2Canonicalizer {
    /// Fresh per plane; coordinates of different planes never mix.
    pub fn new(epsilon: f32) -> Self {
        Self {
            inner: Canonicalizer::new(epsilon),
        }
    }

    /// Snaps `point` onto the first coordinate seen within epsilon of it.
    pub fn canonicalize(&mut self, point: Point2<f32>) -> Point2<f32> {
        let id = self.inner.canonicalize([point.x, point.y]);
        let [x, y] = self.inner.key(id);
        Point2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn same_point_within_epsilon_is_one_instance() {
        let mut canon = PointCanonicalizer::new(EPS);
        let a = canon.canonicalize(Point3::new(1.0, 2.0, 3.0));
        let b = canon.canonicalize(Point3::new(1.0 + EPS * 0.3, 2.0, 3.0 - EPS * 0.3));
        assert_eq!(a, b);
        assert_eq!(canon.len(), 1);
        assert_eq!(canon.point(b), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn points_apart_are_distinct() {
        let mut canon = PointCanonicalizer::new(EPS);
        let a = canon.canonicalize(Point3::new(0.0, 0.0, 0.0));
        let b = canon.canonicalize(Point3::new(0.0, EPS * 3.0, 0.0));
        assert_ne!(a, b);
        assert_eq!(canon.len(), 2);
    }

    #[test]
    fn snap_returns_canonical_coordinates() {
        let mut canon = PointCanonicalizer::new(EPS);
        canon.canonicalize(Point3::new(0.5, 0.5, 0.5));
        let (_, p) = canon.snap(Point3::new(0.50001, 0.49999, 0.5));
        assert_eq!(p, Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn flipped_plane_maps_to_same_instance() {
        let mut canon = PlaneCanonicalizer::new(EPS);
        let plane = Plane3D::new(Vector3::new(0.0, 0.0, -1.0), -2.0);
        let a = canon.canonicalize(&plane);
        let b = canon.canonicalize(&plane.flipped());
        assert_eq!(a, b);
        assert_eq!(canon.len(), 1);
        assert!(canon.plane(a).offset() >= 0.0);
        assert_eq!(canon.plane(a).normal(), Vector3::z());
    }

    #[test]
    fn plane_through_origin_is_sign_normalized() {
        let mut canon = PlaneCanonicalizer::new(EPS);
        let a = canon.canonicalize(&Plane3D::new(Vector3::new(-1.0, 0.0, 0.0), 0.0));
        let b = canon.canonicalize(&Plane3D::new(Vector3::new(1.0, 0.0, 0.0), 0.0));
        assert_eq!(a, b);
        assert_eq!(canon.plane(a).normal(), Vector3::x());
    }

    #[test]
    fn distinct_planes_stay_distinct() {
        let mut canon = PlaneCanonicalizer::new(EPS);
        let a = canon.canonicalize(&Plane3D::new(Vector3::z(), 1.0));
        let b = canon.canonicalize(&Plane3D::new(Vector3::z(), 1.01));
        let c = canon.canonicalize(&Plane3D::new(Vector3::x(), 1.0));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(canon.len(), 3);
    }

    #[test]
    fn near_duplicate_2d_coordinates_merge() {
        let mut canon = Point2Canonicalizer::new(EPS);
        let a = canon.canonicalize(Point2::new(1.0, 1.0));
        let b = canon.canonicalize(Point2::new(1.0 + EPS * 0.5, 1.0));
        assert_eq!(a, b);
        assert_eq!(b, Point2::new(1.0, 1.0));

        let c = canon.canonicalize(Point2::new(1.0, 1.0 + EPS * 3.0));
        assert_eq!(c, Point2::new(1.0, 1.0 + EPS * 3.0));
    }
}
