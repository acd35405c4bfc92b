//! Plane representation, 2D plane basis and side classification.

use bitflags::bitflags;
use nalgebra::{Point2, Point3, Vector3};

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

bitflags! {
    /// Union of the sides the vertices of a polygon fall on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Sides: u8 {
        /// At least one vertex strictly behind the plane.
        const NEG = 1;
        /// At least one vertex on the plane.
        const ON = 2;
        /// At least one vertex strictly in front of the plane.
        const POS = 4;
    }
}

impl Sides {
    /// Vertices on both strict sides: the polygon has to be split.
    #[inline]
    pub fn is_spanning(self) -> bool {
        self.contains(Sides::NEG | Sides::POS)
    }

    /// Every vertex lies on the plane.
    #[inline]
    pub fn is_on_only(self) -> bool {
        self == Sides::ON
    }
}

impl From<PlaneSide> for Sides {
    fn from(side: PlaneSide) -> Self {
        match side {
            PlaneSide::Back => Sides::NEG,
            PlaneSide::OnPlane => Sides::ON,
            PlaneSide::Front => Sides::POS,
        }
    }
}

/// A plane in 3D space, represented as `normal · point = offset`.
///
/// Every plane carries an orthonormal in-plane basis `(u, v)` with
/// `u × v = normal`, used to project points into plane coordinates.
/// The basis depends only on the normal, so equal planes project equally.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
    u: Vector3<f32>,
    v: Vector3<f32>,
}

impl Plane3D {
    /// Creates a new plane from a normal vector and offset.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        let normal = normal / norm;
        let (u, v) = basis_for(&normal);
        Self {
            normal,
            offset: offset / norm,
            u,
            v,
        }
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        let unit_normal = normal / norm;
        Self::new(unit_normal, unit_normal.dot(&point.coords))
    }

    /// Creates a plane from three non-collinear points.
    /// The normal direction follows the right-hand rule: (b - a) × (c - a).
    ///
    /// # Panics
    /// Panics if the points are collinear (or nearly so).
    pub fn from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        let normal = (b - a).cross(&(c - a));
        Self::from_point_and_normal(a, normal)
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// First in-plane basis vector.
    #[inline]
    pub fn u(&self) -> Vector3<f32> {
        self.u
    }

    /// Second in-plane basis vector.
    #[inline]
    pub fn v(&self) -> Vector3<f32> {
        self.v
    }

    /// The point of the plane closest to the world origin.
    #[inline]
    pub fn origin(&self) -> Point3<f32> {
        Point3::from(self.normal * self.offset)
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies which side of the plane a point lies on.
    pub fn classify_point(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// ORs together the side of every point.
    pub fn classify_points(&self, points: &[Point3<f32>], epsilon: f32) -> Sides {
        points
            .iter()
            .fold(Sides::empty(), |acc, p| acc | self.classify_point(*p, epsilon).into())
    }

    /// Returns a new plane with the normal flipped (facing the opposite direction).
    #[inline]
    pub fn flipped(&self) -> Self {
        Self::new(-self.normal, -self.offset)
    }

    /// Projects a point onto the plane (finds the closest point on the plane).
    #[inline]
    pub fn project_point(&self, point: Point3<f32>) -> Point3<f32> {
        point - self.normal * self.signed_distance(point)
    }

    /// Intersects the infinite line through `point` along `direction` with the plane.
    ///
    /// Returns `None` when the line is parallel to the plane.
    pub fn intersect_line(
        &self,
        point: Point3<f32>,
        direction: Vector3<f32>,
    ) -> Option<Point3<f32>> {
        let denom = self.normal.dot(&direction);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let t = self.normal.dot(&(self.origin() - point)) / denom;
        Some(point + direction * t)
    }

    /// Computes the intersection of a line segment with the plane.
    ///
    /// Returns `Some((t, point))` where `t` is the interpolation parameter
    /// (0.0 = start, 1.0 = end), or `None` if the segment is parallel to the
    /// plane or doesn't reach it.
    pub fn intersect_segment(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
    ) -> Option<(f32, Point3<f32>)> {
        let direction = end - start;
        let denom = self.normal.dot(&direction);

        if denom.abs() < f32::EPSILON {
            return None;
        }

        let t = (self.offset - self.normal.dot(&start.coords)) / denom;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        Some((t, start + direction * t))
    }

    /// Expresses a world point in the plane's 2D basis.
    ///
    /// The component along the normal is discarded.
    #[inline]
    pub fn to_plane_coords(&self, point: Point3<f32>) -> Point2<f32> {
        let d = point - self.origin();
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    /// Lifts plane coordinates back to the world point on the plane.
    #[inline]
    pub fn to_world_coords(&self, point: Point2<f32>) -> Point3<f32> {
        self.origin() + self.u * point.x + self.v * point.y
    }
}

/// Picks an in-plane basis from the axis the normal is dominant along.
fn basis_for(normal: &Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let a = normal.abs();
    let helper = if a.x >= a.y && a.x >= a.z {
        Vector3::y()
    } else {
        Vector3::x()
    };
    let u = helper.cross(normal).normalize();
    let v = normal.cross(&u);
    (u, v)
}
