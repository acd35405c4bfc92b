//! BSP tree node implementation.

use nalgebra::Point3;

use crate::{ConvexFace, PlaneId, PortalId};

/// Index of a node in its tree's arena. Stable for the life of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// Which child of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Behind the splitting plane.
    Neg,
    /// In front of the splitting plane.
    Pos,
}

/// A node in the BSP tree.
///
/// A node created from a face adopts that face's plane and stores every
/// face lying on it. A node created to host a portal has no plane and no
/// faces; it is a leaf cell.
///
/// Children and parent are arena indices, so the tree is navigable in both
/// directions without shared ownership.
#[derive(Debug, Clone)]
pub struct BspNode {
    id: NodeId,
    /// The splitting plane for this node.
    plane: Option<PlaneId>,
    /// Model faces lying on the plane.
    faces: Vec<ConvexFace>,
    /// Subtree strictly behind the plane.
    neg: Option<NodeId>,
    /// Subtree strictly in front of the plane.
    pos: Option<NodeId>,
    parent: Option<NodeId>,
    portal: Option<PortalId>,
    /// Partial overlaps between portal faces on this plane, in world space.
    overlaps: Vec<Vec<Point3<f32>>>,
}

impl BspNode {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, plane: Option<PlaneId>) -> Self {
        Self {
            id,
            plane,
            faces: Vec::new(),
            neg: None,
            pos: None,
            parent,
            portal: None,
            overlaps: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the splitting plane, if the node has one.
    #[inline]
    pub fn plane(&self) -> Option<PlaneId> {
        self.plane
    }

    /// Faces lying on the splitting plane.
    #[inline]
    pub fn faces(&self) -> &[ConvexFace] {
        &self.faces
    }

    #[inline]
    pub fn neg(&self) -> Option<NodeId> {
        self.neg
    }

    #[inline]
    pub fn pos(&self) -> Option<NodeId> {
        self.pos
    }

    #[inline]
    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Neg => self.neg,
            Side::Pos => self.pos,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The leaf cell attached to this node.
    #[inline]
    pub fn portal(&self) -> Option<PortalId> {
        self.portal
    }

    /// Partial overlap polygons between portal faces on this node's plane.
    #[inline]
    pub fn overlaps(&self) -> &[Vec<Point3<f32>>] {
        &self.overlaps
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.neg.is_none() && self.pos.is_none()
    }

    pub(crate) fn set_plane(&mut self, plane: PlaneId) {
        self.plane = Some(plane);
    }

    pub(crate) fn push_face(&mut self, face: ConvexFace) {
        self.faces.push(face);
    }

    pub(crate) fn set_child(&mut self, side: Side, child: NodeId) {
        match side {
            Side::Neg => self.neg = Some(child),
            Side::Pos => self.pos = Some(child),
        }
    }

    pub(crate) fn set_portal(&mut self, portal: PortalId) {
        self.portal = Some(portal);
    }

    pub(crate) fn set_overlaps(&mut self, overlaps: Vec<Vec<Point3<f32>>>) {
        self.overlaps = overlaps;
    }
}
