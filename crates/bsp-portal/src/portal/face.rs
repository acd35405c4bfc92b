//! Bounding faces of portal cells.

use nalgebra::Point3;

use crate::cuttable::Splittable;
use crate::{ConvexFace, NodeId, PlaneId, PortalId};

/// Address of a face inside a leaf portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortalFaceRef {
    pub portal: PortalId,
    pub face: usize,
}

/// Address of a model face stored on a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelFaceRef {
    pub node: NodeId,
    pub face: usize,
}

/// One bounding polygon of a portal cell.
///
/// `plane_node` is the tree node whose splitting plane the face lies on;
/// faces left over from the initial bounding box have none and are exterior
/// walls. Adjacency lists are filled in by
/// [`BspTree::connect_portals`](crate::BspTree) once every portal is final.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalFace {
    face: ConvexFace,
    plane_node: Option<NodeId>,
    connected_portal_faces: Vec<PortalFaceRef>,
    connected_model_faces: Vec<ModelFaceRef>,
    is_covered: bool,
}

impl PortalFace {
    pub fn new(face: ConvexFace, plane_node: Option<NodeId>) -> Self {
        Self {
            face,
            plane_node,
            connected_portal_faces: Vec::new(),
            connected_model_faces: Vec::new(),
            is_covered: false,
        }
    }

    /// The underlying polygon.
    #[inline]
    pub fn face(&self) -> &ConvexFace {
        &self.face
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        self.face.vertices()
    }

    #[inline]
    pub fn plane(&self) -> PlaneId {
        self.face.plane()
    }

    /// The node whose plane this face lies on.
    #[inline]
    pub fn plane_node(&self) -> Option<NodeId> {
        self.plane_node
    }

    /// The face lies on the original bounding box.
    #[inline]
    pub fn is_exterior_wall(&self) -> bool {
        self.plane_node.is_none()
    }

    /// Faces of other portals seen through this one.
    #[inline]
    pub fn connected_portal_faces(&self) -> &[PortalFaceRef] {
        &self.connected_portal_faces
    }

    /// Model faces on the same plane as this face.
    #[inline]
    pub fn connected_model_faces(&self) -> &[ModelFaceRef] {
        &self.connected_model_faces
    }

    /// The face is entirely covered by model faces.
    #[inline]
    pub fn is_covered(&self) -> bool {
        self.is_covered
    }

    pub(crate) fn connect_portal_face(&mut self, other: PortalFaceRef) {
        if !self.connected_portal_faces.contains(&other) {
            self.connected_portal_faces.push(other);
        }
    }

    pub(crate) fn set_connected_model_faces(&mut self, faces: Vec<ModelFaceRef>) {
        self.connected_model_faces = faces;
    }

    pub(crate) fn set_covered(&mut self, covered: bool) {
        self.is_covered = covered;
    }
}

impl Splittable for PortalFace {
    fn vertices(&self) -> &[Point3<f32>] {
        self.face.vertices()
    }

    /// Clipped copies keep the plane node (and with it the exterior-wall
    /// flag) but no adjacency.
    fn with_vertices(&self, vertices: Vec<Point3<f32>>) -> Self {
        Self::new(self.face.with_vertices(vertices), self.plane_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuttable::Geometry;
    use crate::{MeshFace, Plane3D};
    use nalgebra::Vector3;

    #[test]
    fn split_portal_face_inherits_tags() {
        let mut geometry = Geometry::new(1e-4);
        let mesh = MeshFace::new(vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ]);
        let face = geometry.face_from_mesh(&mesh).unwrap();
        let mut wall = PortalFace::new(face, Some(NodeId(3)));
        wall.set_covered(true);
        wall.connect_portal_face(PortalFaceRef {
            portal: PortalId(1),
            face: 0,
        });

        let cut = geometry.canonical_plane(&Plane3D::new(Vector3::x(), 0.0));
        let split = geometry.split_face(cut, &wall);
        for half in [split.neg.unwrap(), split.pos.unwrap()] {
            assert_eq!(half.plane_node(), Some(NodeId(3)));
            assert_eq!(half.plane(), wall.plane());
            assert!(!half.is_covered());
            assert!(half.connected_portal_faces().is_empty());
        }
    }

    #[test]
    fn exterior_wall_has_no_plane_node() {
        let mut geometry = Geometry::new(1e-4);
        let mesh = MeshFace::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        let face = geometry.face_from_mesh(&mesh).unwrap();
        assert!(PortalFace::new(face.clone(), None).is_exterior_wall());
        assert!(!PortalFace::new(face, Some(NodeId(0))).is_exterior_wall());
    }

    #[test]
    fn connecting_twice_keeps_one_entry() {
        let mut geometry = Geometry::new(1e-4);
        let mesh = MeshFace::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        let mut face = PortalFace::new(geometry.face_from_mesh(&mesh).unwrap(), None);
        let other = PortalFaceRef {
            portal: PortalId(2),
            face: 1,
        };
        face.connect_portal_face(other);
        face.connect_portal_face(other);
        assert_eq!(face.connected_portal_faces(), &[other]);
    }
}
