//! Portal-to-portal adjacency and coverage across splitting planes.

use log::trace;
use nalgebra::{Point2, Point3};

use crate::bsp::{BspTree, NodeId};
use crate::canon::Point2Canonicalizer;
use crate::clip::{ClipInput, ClipKernel, PolygonOwner};

use super::face::{ModelFaceRef, PortalFaceRef};

impl BspTree {
    /// Resolves, for every splitting plane, which portal faces see each
    /// other through it and which are covered by model faces on it.
    pub(crate) fn connect_portals<K: ClipKernel>(&mut self, kernel: &K) {
        let mut walls: Vec<Vec<PortalFaceRef>> = vec![Vec::new(); self.nodes.len()];
        for (portal, cell) in self.portals.iter().enumerate() {
            for (face, wall) in cell.faces().iter().enumerate() {
                if let Some(node) = wall.plane_node() {
                    walls[node.0].push(PortalFaceRef {
                        portal: super::PortalId(portal),
                        face,
                    });
                }
            }
        }

        if let Some(root) = self.root {
            self.connect_node(root, &walls, kernel);
        }
    }

    fn connect_node<K: ClipKernel>(&mut self, id: NodeId, walls: &[Vec<PortalFaceRef>], kernel: &K) {
        if !walls[id.0].is_empty() {
            self.connect_plane(id, &walls[id.0], kernel);
        }
        let node = &self.nodes[id.0];
        let children = [node.neg(), node.pos()];
        for child in children.into_iter().flatten() {
            self.connect_node(child, walls, kernel);
        }
    }

    /// Runs the clip kernel over the walls and model faces of one plane.
    fn connect_plane<K: ClipKernel>(&mut self, id: NodeId, walls: &[PortalFaceRef], kernel: &K) {
        let Some(plane_id) = self.nodes[id.0].plane() else {
            return;
        };
        let plane = self.geometry.plane(plane_id).clone();
        let mut flat = Point2Canonicalizer::new(self.config.epsilon);
        let mut project = |p: &Point3<f32>| flat.canonicalize(plane.to_plane_coords(*p));

        let mut input = ClipInput::new();
        for (slot, wall) in walls.iter().enumerate() {
            let face = &self.portals[wall.portal.0].faces()[wall.face];
            let ring: Vec<Point2<f32>> = face.vertices().iter().map(&mut project).collect();
            input.push(PolygonOwner::Portal(slot), ring);
        }
        let model_faces = self.nodes[id.0].faces();
        for (slot, face) in model_faces.iter().enumerate() {
            let ring: Vec<Point2<f32>> = face.vertices().iter().map(&mut project).collect();
            input.push(PolygonOwner::Model(slot), ring);
        }
        let model_refs: Vec<ModelFaceRef> = (0..model_faces.len())
            .map(|face| ModelFaceRef { node: id, face })
            .collect();

        let output = kernel.clip_polygons(&input);

        let mut links = 0;
        for pair in output.connected.iter().filter(|pair| !pair.blocked) {
            let (a, b) = (walls[pair.a], walls[pair.b]);
            if a.portal == b.portal {
                continue;
            }
            self.portal_face_mut(a).connect_portal_face(b);
            self.portal_face_mut(b).connect_portal_face(a);
            links += 1;
        }
        for &slot in &output.covered {
            self.portal_face_mut(walls[slot]).set_covered(true);
        }
        for wall in walls {
            self.portal_face_mut(*wall)
                .set_connected_model_faces(model_refs.clone());
        }

        let overlaps = output
            .intersected
            .iter()
            .map(|overlap| {
                overlap
                    .polygon
                    .iter()
                    .map(|p| plane.to_world_coords(*p))
                    .collect()
            })
            .collect();
        self.nodes[id.0].set_overlaps(overlaps);

        trace!(
            "node {:?}: {} walls, {} model faces, {} links, {} covered, {} partial overlaps",
            id,
            walls.len(),
            model_refs.len(),
            links,
            output.covered.len(),
            output.intersected.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::bsp::tree::tests::{make_quad, make_triangle};
    use crate::{cube_faces, BspTree, BuildConfig, MeshFace, PortalFaceRef};
    use nalgebra::Point3;

    fn build(faces: Vec<MeshFace>) -> BspTree {
        BspTree::build(faces, BuildConfig::default()).unwrap()
    }

    fn walls_on_root(tree: &BspTree) -> Vec<PortalFaceRef> {
        let mut out = Vec::new();
        for (p, portal) in tree.portals().iter().enumerate() {
            for (f, face) in portal.faces().iter().enumerate() {
                if face.plane_node() == tree.root() {
                    out.push(PortalFaceRef {
                        portal: crate::PortalId(p),
                        face: f,
                    });
                }
            }
        }
        out
    }

    #[test]
    fn adjacency_is_symmetric() {
        let tree = build(cube_faces(Point3::origin(), 1.0));
        for (p, portal) in tree.portals().iter().enumerate() {
            for (f, face) in portal.faces().iter().enumerate() {
                let me = PortalFaceRef {
                    portal: crate::PortalId(p),
                    face: f,
                };
                for other in face.connected_portal_faces() {
                    assert_ne!(other.portal, me.portal);
                    let back = tree.portal_face(*other).unwrap();
                    assert!(back.connected_portal_faces().contains(&me));
                }
            }
        }
    }

    #[test]
    fn cube_walls_are_covered() {
        let tree = build(cube_faces(Point3::origin(), 1.0));
        let inside = tree.locate_portal(Point3::origin()).unwrap();
        let portal = tree.portal(inside).unwrap();
        for face in portal.faces() {
            assert!(face.is_covered());
            assert!(face.connected_portal_faces().is_empty());
            assert_eq!(face.connected_model_faces().len(), 1);
        }
    }

    #[test]
    fn small_face_leaves_the_wall_open_around_it() {
        // a small triangle in a big padded box: both halves see each other
        // around it
        let tree = build(vec![make_triangle(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        )]);
        let walls = walls_on_root(&tree);
        assert_eq!(walls.len(), 2);
        for wall in &walls {
            let face = tree.portal_face(*wall).unwrap();
            assert!(!face.is_covered());
            assert_eq!(face.connected_portal_faces().len(), 1);
            assert_eq!(face.connected_model_faces().len(), 1);
        }
    }

    #[test]
    fn partial_overlaps_are_kept_on_the_node() {
        // above z = 0 the cells are cut at x = 0.5, below it at y = 0.5, so
        // each upper piece of the z = 0 wall meets each lower piece in one
        // quadrant
        let tree = build(vec![
            make_quad([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
            make_quad([[0.5, 0.0, 0.2], [0.5, 1.0, 0.2], [0.5, 1.0, 0.8], [0.5, 0.0, 0.8]]),
            make_quad([[0.0, 0.5, -0.8], [1.0, 0.5, -0.8], [1.0, 0.5, -0.2], [0.0, 0.5, -0.2]]),
        ]);
        let root = tree.root().unwrap();
        assert_eq!(walls_on_root(&tree).len(), 4);

        let overlaps = tree.overlaps(root).unwrap();
        assert_eq!(overlaps.len(), 4);
        for polygon in overlaps {
            assert!(polygon.len() >= 3);
            assert!(polygon.iter().all(|p| p.z.abs() < 1e-3));
            // every quadrant has the point (0.5, 0.5) as a corner
            assert!(polygon
                .iter()
                .any(|p| (p.x - 0.5).abs() < 1e-3 && (p.y - 0.5).abs() < 1e-3));
        }

        let bogus = crate::NodeId(tree.node_count());
        assert_eq!(tree.overlaps(bogus), Err(crate::BspError::UnknownNode(bogus)));
    }

    #[test]
    fn nested_walls_are_not_partial_overlaps() {
        let tree = build(cube_faces(Point3::origin(), 1.0));
        let root = tree.root().unwrap();
        assert!(tree.overlaps(root).unwrap().is_empty());
    }

    #[test]
    fn exterior_walls_have_no_adjacency() {
        let tree = build(cube_faces(Point3::origin(), 1.0));
        for face in tree.portals().iter().flat_map(|p| p.faces()) {
            if face.is_exterior_wall() {
                assert!(face.connected_portal_faces().is_empty());
                assert!(face.connected_model_faces().is_empty());
                assert!(!face.is_covered());
            }
        }
    }
}
