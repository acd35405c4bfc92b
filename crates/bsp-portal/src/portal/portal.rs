//! Convex leaf cells.

use nalgebra::{Point3, Vector3};

use super::face::PortalFace;

/// Identity of a leaf portal within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortalId(pub usize);

/// The closed convex boundary of one BSP leaf cell.
///
/// `is_exterior` is the result of the last exterior flood fill; `visible`,
/// `color` and `trace_index` are display state owned by consumers and carry
/// no structural meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    faces: Vec<PortalFace>,
    is_exterior: bool,
    visible: bool,
    color: [u8; 4],
    trace_index: Option<usize>,
}

impl Portal {
    pub fn new(faces: Vec<PortalFace>, color: [u8; 4]) -> Self {
        Self {
            faces,
            is_exterior: false,
            visible: true,
            color,
            trace_index: None,
        }
    }

    /// The bounding faces.
    #[inline]
    pub fn faces(&self) -> &[PortalFace] {
        &self.faces
    }

    #[inline]
    pub fn face(&self, index: usize) -> Option<&PortalFace> {
        self.faces.get(index)
    }

    #[inline]
    pub(crate) fn face_mut(&mut self, index: usize) -> &mut PortalFace {
        &mut self.faces[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Reachable from open space outside the solid.
    #[inline]
    pub fn is_exterior(&self) -> bool {
        self.is_exterior
    }

    pub(crate) fn set_exterior(&mut self, exterior: bool) {
        self.is_exterior = exterior;
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn color(&self) -> [u8; 4] {
        self.color
    }

    pub fn set_color(&mut self, color: [u8; 4]) {
        self.color = color;
    }

    /// Position on the last applied trace path.
    #[inline]
    pub fn trace_index(&self) -> Option<usize> {
        self.trace_index
    }

    pub(crate) fn set_trace_index(&mut self, index: Option<usize>) {
        self.trace_index = index;
    }

    /// Distinct corner points of the cell.
    ///
    /// Portal vertices are canonical, so exact comparison is enough.
    pub fn vertices(&self) -> Vec<Point3<f32>> {
        let mut out: Vec<Point3<f32>> = Vec::new();
        for v in self.faces.iter().flat_map(|f| f.vertices()) {
            if !out.contains(v) {
                out.push(*v);
            }
        }
        out
    }

    /// Average of the distinct corner points.
    pub fn centroid(&self) -> Point3<f32> {
        let vertices = self.vertices();
        if vertices.is_empty() {
            return Point3::origin();
        }
        let sum: Vector3<f32> = vertices.iter().map(|p| p.coords).sum();
        Point3::from(sum / vertices.len() as f32)
    }

    /// Enclosed volume, summed over tetrahedra fanned from the centroid.
    ///
    /// Only meaningful for a closed convex cell; face winding is irrelevant.
    pub fn volume(&self) -> f32 {
        let apex = self.centroid();
        let mut volume = 0.0;
        for face in &self.faces {
            let v = face.vertices();
            for i in 1..v.len().saturating_sub(1) {
                let a = v[0] - apex;
                let b = v[i] - apex;
                let c = v[i + 1] - apex;
                volume += a.dot(&b.cross(&c)).abs() / 6.0;
            }
        }
        volume
    }
}
