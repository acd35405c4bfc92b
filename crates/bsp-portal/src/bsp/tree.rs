//! BSP tree container and construction.

use log::{debug, info};
use nalgebra::Point3;

use crate::clip::{ClipKernel, GeoClipKernel};
use crate::color::{ColorGenerator, HashColors};
use crate::cuttable::Geometry;
use crate::portal::{Portal, PortalFace, PortalFaceRef, PortalId};
use crate::{BspError, BuildConfig, ConvexFace, MeshFace, Plane3D, PlaneId, PlaneSide, Result};

use super::node::{BspNode, NodeId, Side};
use super::visitor::{BspVisitor, CollectingVisitor};

/// A Binary Space Partitioning tree over the faces of a polygonal solid,
/// together with the convex leaf cells (portals) it carves out of the
/// solid's padded bounding box.
///
/// # Construction
///
/// Faces are inserted greedily in input order: the first face supplies the
/// root plane, and every later face is routed, split where it straddles a
/// plane, until it lands on a node with its own plane or seeds a new child.
/// Coplanar faces share one node.
///
/// ```ignore
/// use bsp_portal::{cube_faces, BspTree, BuildConfig};
/// use nalgebra::Point3;
///
/// let tree = BspTree::build(cube_faces(Point3::origin(), 1.0), BuildConfig::default())?;
/// assert_eq!(tree.leaf_portals().len(), 7);
/// ```
///
/// A build then cuts the bounding box into leaf portals, resolves which
/// portals see each other through every splitting plane, and flood-fills
/// the exterior. Nodes and portals are stored in arenas and addressed by
/// [`NodeId`] and [`PortalId`]; nothing is ever removed during a build.
#[derive(Debug, Clone)]
pub struct BspTree {
    pub(crate) config: BuildConfig,
    pub(crate) geometry: Geometry,
    pub(crate) nodes: Vec<BspNode>,
    pub(crate) portals: Vec<Portal>,
    pub(crate) root: Option<NodeId>,
    input: Vec<MeshFace>,
}

impl BspTree {
    fn empty(config: BuildConfig) -> Self {
        Self {
            config,
            geometry: Geometry::new(config.epsilon),
            nodes: Vec::new(),
            portals: Vec::new(),
            root: None,
            input: Vec::new(),
        }
    }

    /// Builds the tree, its portals, their adjacency and the exterior
    /// classification, using the `geo` clip kernel and hashed colors.
    pub fn build(faces: Vec<MeshFace>, config: BuildConfig) -> Result<Self> {
        Self::build_with(
            faces,
            config,
            &GeoClipKernel::from_config(&config),
            &mut HashColors::default(),
        )
    }

    /// Like [`build`](Self::build) with an explicit clip kernel and color
    /// source.
    ///
    /// Degenerate faces are dropped. Fails if the config is invalid or no
    /// face survives.
    pub fn build_with<K: ClipKernel, C: ColorGenerator>(
        faces: Vec<MeshFace>,
        config: BuildConfig,
        kernel: &K,
        colors: &mut C,
    ) -> Result<Self> {
        config.validate()?;
        let mut tree = Self::empty(config);

        for mesh in &faces {
            match tree.geometry.face_from_mesh(mesh) {
                Some(face) => tree.insert(face),
                None => debug!(
                    "dropping degenerate face {:?} with {} vertices",
                    mesh.source(),
                    mesh.vertices().len()
                ),
            }
        }
        tree.input = faces;

        let root = tree.root.ok_or(BspError::NoFaces)?;
        let bounds = tree.bounding_portal();
        tree.set_portal(root, bounds, colors);
        tree.connect_portals(kernel);
        tree.classify_exterior();

        info!(
            "built BSP tree: {} nodes, {} planes, {} leaf portals ({} exterior)",
            tree.nodes.len(),
            tree.geometry.plane_count(),
            tree.portals.len(),
            tree.portals.iter().filter(|p| p.is_exterior()).count()
        );
        Ok(tree)
    }

    /// Discards the tree and portal graph and builds again from the same
    /// input faces with a new configuration.
    ///
    /// On error the current tree is left untouched.
    pub fn rebuild(&mut self, config: BuildConfig) -> Result<()> {
        *self = Self::build(self.input.clone(), config)?;
        Ok(())
    }

    /// Configuration the tree was built with.
    #[inline]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The faces the tree was built from.
    #[inline]
    pub fn input_faces(&self) -> &[MeshFace] {
        &self.input
    }

    /// Canonical points and planes of this build.
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn plane(&self, id: PlaneId) -> &Plane3D {
        self.geometry.plane(id)
    }

    /// Returns `true` if the tree contains no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&BspNode> {
        self.nodes.get(id.0)
    }

    /// All nodes, indexed by [`NodeId`].
    #[inline]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// Partial overlaps between portal walls on the plane of `id`, in
    /// world coordinates.
    pub fn overlaps(&self, id: NodeId) -> Result<&[Vec<Point3<f32>>]> {
        self.node(id)
            .map(|node| node.overlaps())
            .ok_or(BspError::UnknownNode(id))
    }

    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(id.0)
    }

    pub fn portal_mut(&mut self, id: PortalId) -> Option<&mut Portal> {
        self.portals.get_mut(id.0)
    }

    /// All leaf portals, indexed by [`PortalId`].
    #[inline]
    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn portal_face(&self, r: PortalFaceRef) -> Option<&PortalFace> {
        self.portal(r.portal).and_then(|p| p.face(r.face))
    }

    pub(crate) fn portal_face_mut(&mut self, r: PortalFaceRef) -> &mut PortalFace {
        self.portals[r.portal.0].face_mut(r.face)
    }

    /// Number of nodes, including portal-only leaves.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the total number of model faces in the tree.
    pub fn face_count(&self) -> usize {
        self.nodes.iter().map(|n| n.faces().len()).sum()
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |root| self.depth_of(root))
    }

    fn depth_of(&self, id: NodeId) -> usize {
        let node = &self.nodes[id.0];
        let neg = node.neg().map_or(0, |n| self.depth_of(n));
        let pos = node.pos().map_or(0, |n| self.depth_of(n));
        1 + neg.max(pos)
    }

    pub(crate) fn push_node(&mut self, parent: Option<NodeId>, plane: Option<PlaneId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BspNode::new(id, parent, plane));
        id
    }

    /// Adds a face at the root, seeding the root if the tree is empty.
    fn insert(&mut self, face: ConvexFace) {
        match self.root {
            Some(root) => self.add_face(root, face),
            None => {
                let root = self.seed_node(None, face);
                self.root = Some(root);
            }
        }
    }

    /// A new node adopting the face's plane and holding the face.
    fn seed_node(&mut self, parent: Option<NodeId>, face: ConvexFace) -> NodeId {
        let id = self.push_node(parent, Some(face.plane()));
        self.nodes[id.0].push_face(face);
        id
    }

    /// Routes a face down from `id` until it lands on a node with its plane.
    pub(crate) fn add_face(&mut self, id: NodeId, face: ConvexFace) {
        let Some(plane) = self.nodes[id.0].plane() else {
            // portal host: the first face to arrive supplies the plane
            self.nodes[id.0].set_plane(face.plane());
            self.nodes[id.0].push_face(face);
            return;
        };

        if face.plane() == plane {
            self.nodes[id.0].push_face(face);
            return;
        }

        let sides = self.geometry.classify_face(plane, &face);
        if sides.is_on_only() {
            self.nodes[id.0].push_face(face);
        } else if sides.is_spanning() {
            let split = self.geometry.split_face(plane, &face);
            if let Some(neg) = split.neg {
                self.add_to_child(id, Side::Neg, neg);
            }
            if let Some(pos) = split.pos {
                self.add_to_child(id, Side::Pos, pos);
            }
        } else if sides.contains(crate::Sides::POS) {
            self.add_to_child(id, Side::Pos, face);
        } else {
            self.add_to_child(id, Side::Neg, face);
        }
    }

    fn add_to_child(&mut self, id: NodeId, side: Side, face: ConvexFace) {
        match self.nodes[id.0].child(side) {
            Some(child) => self.add_face(child, face),
            None => {
                let child = self.seed_node(Some(id), face);
                self.nodes[id.0].set_child(side, child);
            }
        }
    }

    /// Walks the tree in order (neg, node, pos), visiting every node that
    /// holds faces.
    pub fn traverse<V: BspVisitor>(&self, visitor: &mut V) {
        if let Some(root) = self.root {
            self.traverse_node(root, visitor);
        }
    }

    fn traverse_node<V: BspVisitor>(&self, id: NodeId, visitor: &mut V) {
        let node = &self.nodes[id.0];
        if let Some(neg) = node.neg() {
            self.traverse_node(neg, visitor);
        }
        if !node.faces().is_empty() {
            visitor.visit(id, node.faces());
        }
        if let Some(pos) = node.pos() {
            self.traverse_node(pos, visitor);
        }
    }

    /// All model faces, in order.
    pub fn faces(&self) -> Vec<ConvexFace> {
        let mut visitor = CollectingVisitor::new();
        self.traverse(&mut visitor);
        visitor.into_faces()
    }

    /// Portals of leaf nodes, in order.
    pub fn leaf_portals(&self) -> Vec<PortalId> {
        let mut out = Vec::with_capacity(self.portals.len());
        if let Some(root) = self.root {
            self.collect_leaf_portals(root, &mut out);
        }
        out
    }

    fn collect_leaf_portals(&self, id: NodeId, out: &mut Vec<PortalId>) {
        let node = &self.nodes[id.0];
        if let Some(neg) = node.neg() {
            self.collect_leaf_portals(neg, out);
        }
        if let (true, Some(portal)) = (node.is_leaf(), node.portal()) {
            out.push(portal);
        }
        if let Some(pos) = node.pos() {
            self.collect_leaf_portals(pos, out);
        }
    }

    /// Traverses the tree back-to-front relative to the given viewpoint.
    ///
    /// Faces far from `eye` are visited first, so drawing them in visit
    /// order paints near faces over far ones.
    pub fn traverse_back_to_front<V: BspVisitor>(&self, eye: Point3<f32>, visitor: &mut V) {
        if let Some(root) = self.root {
            self.back_to_front_node(root, eye, visitor);
        }
    }

    fn back_to_front_node<V: BspVisitor>(&self, id: NodeId, eye: Point3<f32>, visitor: &mut V) {
        let node = &self.nodes[id.0];
        let Some(plane) = node.plane() else {
            return;
        };
        let (far, near) = match self.plane(plane).classify_point(eye, self.config.epsilon) {
            PlaneSide::Front | PlaneSide::OnPlane => (node.neg(), node.pos()),
            PlaneSide::Back => (node.pos(), node.neg()),
        };
        if let Some(far) = far {
            self.back_to_front_node(far, eye, visitor);
        }
        if !node.faces().is_empty() {
            visitor.visit(id, node.faces());
        }
        if let Some(near) = near {
            self.back_to_front_node(near, eye, visitor);
        }
    }

    /// The leaf portal containing `point`, if the point is inside the
    /// bounding box and its cell materialized.
    pub fn locate_portal(&self, point: Point3<f32>) -> Option<PortalId> {
        let mut current = self.root?;
        loop {
            let node = &self.nodes[current.0];
            if let Some(portal) = node.portal() {
                return Some(portal);
            }
            let plane = node.plane()?;
            let side = match self.plane(plane).classify_point(point, self.config.epsilon) {
                PlaneSide::Front => Side::Pos,
                PlaneSide::Back | PlaneSide::OnPlane => Side::Neg,
            };
            current = node.child(side)?;
        }
    }
}
