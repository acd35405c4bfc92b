//! Callbacks for the tree walks.
//!
//! [`BspTree::traverse`](super::BspTree::traverse) and
//! [`BspTree::traverse_back_to_front`](super::BspTree::traverse_back_to_front)
//! hand every node that holds model faces to a [`BspVisitor`], one coplanar
//! group at a time.

use crate::{ConvexFace, NodeId};

/// Receives the coplanar face group of each node a walk passes.
pub trait BspVisitor {
    /// `faces` is never empty.
    fn visit(&mut self, node: NodeId, faces: &[ConvexFace]);
}

/// Gathers faces in visiting order, remembering which node each group came
/// from.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    faces: Vec<ConvexFace>,
    groups: Vec<(NodeId, usize)>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faces seen so far, flattened.
    pub fn faces(&self) -> &[ConvexFace] {
        &self.faces
    }

    /// Nodes in the order they were visited.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.groups.iter().map(|(node, _)| *node)
    }

    /// The faces that came from `node`, empty if it was never visited.
    pub fn faces_of(&self, node: NodeId) -> &[ConvexFace] {
        let mut start = 0;
        for &(id, count) in &self.groups {
            if id == node {
                return &self.faces[start..start + count];
            }
            start += count;
        }
        &[]
    }

    pub fn into_faces(self) -> Vec<ConvexFace> {
        self.faces
    }
}

impl BspVisitor for CollectingVisitor {
    fn visit(&mut self, node: NodeId, faces: &[ConvexFace]) {
        self.groups.push((node, faces.len()));
        self.faces.extend_from_slice(faces);
    }
}

/// Adapts a closure to [`BspVisitor`].
pub struct FnVisitor<F>(F)
where
    F: FnMut(NodeId, &[ConvexFace]);

impl<F> FnVisitor<F>
where
    F: FnMut(NodeId, &[ConvexFace]),
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> BspVisitor for FnVisitor<F>
where
    F: FnMut(NodeId, &[ConvexFace]),
{
    fn visit(&mut self, node: NodeId, faces: &[ConvexFace]) {
        (self.0)(node, faces)
    }
}
