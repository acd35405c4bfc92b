//! Carving leaf cells out of the bounding box.

use log::debug;
use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::bsp::{BspTree, NodeId, Side};
use crate::color::ColorGenerator;
use crate::{box_faces, ConvexFace, PlaneId, PointId, Sides};

use super::face::PortalFace;
use super::portal::{Portal, PortalId};

/// A closed convex cell has at least this many faces.
const MIN_CELL_FACES: usize = 4;

impl BspTree {
    /// The padded bounding box of every model face, as exterior walls.
    pub(crate) fn bounding_portal(&mut self) -> Vec<PortalFace> {
        let mut min = Point3::from(Vector3::repeat(f32::MAX));
        let mut max = Point3::from(Vector3::repeat(f32::MIN));
        for v in self
            .nodes
            .iter()
            .flat_map(|n| n.faces())
            .flat_map(|f| f.vertices())
        {
            min = min.inf(v);
            max = max.sup(v);
        }

        let pad = Vector3::repeat(self.config.padding);
        box_faces(min - pad, max + pad)
            .iter()
            .filter_map(|mesh| self.geometry.face_from_mesh(mesh))
            .map(|face| PortalFace::new(face, None))
            .collect()
    }

    /// Pushes a cell down the subtree at `id`, splitting it at every plane
    /// and attaching the pieces that reach a leaf position.
    pub(crate) fn set_portal<C: ColorGenerator>(
        &mut self,
        id: NodeId,
        cell: Vec<PortalFace>,
        colors: &mut C,
    ) {
        let Some(plane) = self.nodes[id.0].plane() else {
            self.attach_portal(id, cell, colors);
            return;
        };

        let (neg, pos) = self.split_portal(id, plane, cell);
        for (side, piece) in [(Side::Neg, neg), (Side::Pos, pos)] {
            match self.nodes[id.0].child(side) {
                Some(child) => self.set_portal(child, piece, colors),
                None if piece.len() >= MIN_CELL_FACES => {
                    let leaf = self.push_node(Some(id), None);
                    self.nodes[id.0].set_child(side, leaf);
                    self.attach_portal(leaf, piece, colors);
                }
                None if !piece.is_empty() => {
                    debug!(
                        "node {:?}: {:?} cell with {} faces does not close",
                        id,
                        side,
                        piece.len()
                    );
                }
                None => {}
            }
        }
    }

    /// Splits a cell by the plane of node `id`.
    ///
    /// Faces on the plane go to both halves. If the plane cuts through the
    /// cell, the cross-section becomes a new wall shared by both halves.
    fn split_portal(
        &mut self,
        id: NodeId,
        plane: PlaneId,
        cell: Vec<PortalFace>,
    ) -> (Vec<PortalFace>, Vec<PortalFace>) {
        let mut neg = Vec::with_capacity(cell.len() + 1);
        let mut pos = Vec::with_capacity(cell.len() + 1);
        let mut plane_points: Vec<PointId> = Vec::new();
        let mut cell_sides = Sides::empty();

        for face in cell {
            let sides = self.geometry.classify_face(plane, &face);
            cell_sides |= sides;

            if sides.is_on_only() {
                neg.push(face.clone());
                pos.push(face);
                continue;
            }
            plane_points.extend(self.geometry.on_plane_vertices(plane, &face));

            if sides.is_spanning() {
                let split = self.geometry.split_face(plane, &face);
                plane_points.extend(split.on_plane);
                neg.extend(split.neg);
                pos.extend(split.pos);
            } else if sides.contains(Sides::POS) {
                pos.push(face);
            } else {
                neg.push(face);
            }
        }

        if cell_sides.is_spanning() {
            plane_points.sort_unstable();
            plane_points.dedup();
            if let Some(wall) = self.wall_face(id, plane, &plane_points) {
                neg.push(wall.clone());
                pos.push(wall);
            }
        }
        (neg, pos)
    }

    /// Orders the cross-section points by angle around their centroid.
    fn wall_face(&self, id: NodeId, plane_id: PlaneId, points: &[PointId]) -> Option<PortalFace> {
        if points.len() < 3 {
            return None;
        }
        let plane = self.geometry.plane(plane_id);
        let world: Vec<Point3<f32>> = points.iter().map(|p| self.geometry.point(*p)).collect();
        let flat: Vec<Point2<f32>> = world.iter().map(|p| plane.to_plane_coords(*p)).collect();
        let center = flat.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / flat.len() as f32;

        let angle = |p: &Point2<f32>| (p.y - center.y).atan2(p.x - center.x);
        let mut order: Vec<usize> = (0..flat.len()).collect();
        order.sort_by(|&a, &b| angle(&flat[a]).total_cmp(&angle(&flat[b])));

        let wall = ConvexFace::new(order.iter().map(|&i| world[i]).collect(), plane_id);
        if f64::from(wall.area()) <= self.config.area_epsilon() {
            debug!("node {:?}: cross-section has no area", id);
            return None;
        }
        Some(PortalFace::new(wall, Some(id)))
    }

    fn attach_portal<C: ColorGenerator>(&mut self, id: NodeId, faces: Vec<PortalFace>, colors: &mut C) {
        let portal = PortalId(self.portals.len());
        let color = colors.color(portal);
        self.portals.push(Portal::new(faces, color));
        self.nodes[id.0].set_portal(portal);
    }
}

#[cfg(test)]
mod tests {
    use crate::bsp::tree::tests::{complex_scene, make_triangle};
    use crate::clip::GeoClipKernel;
    use crate::color::FixedColor;
    use crate::{cube_faces, BspTree, BuildConfig, MeshFace};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn build(faces: Vec<MeshFace>) -> BspTree {
        BspTree::build(faces, BuildConfig::default()).unwrap()
    }

    /// Volume of the padded bounding box around the input.
    fn padded_volume(faces: &[MeshFace], padding: f32) -> f32 {
        let mut min = Point3::from(Vector3::repeat(f32::MAX));
        let mut max = Point3::from(Vector3::repeat(f32::MIN));
        for v in faces.iter().flat_map(|f| f.vertices()) {
            min = min.inf(v);
            max = max.sup(v);
        }
        let extent = max - min;
        (extent.x + 2.0 * padding) * (extent.y + 2.0 * padding) * (extent.z + 2.0 * padding)
    }

    #[test]
    fn single_face_halves_the_box() {
        let tree = build(vec![make_triangle(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        )]);
        // box [-1, 2] x [-1, 2] x [-1, 1]
        let leaves = tree.leaf_portals();
        assert_eq!(leaves.len(), 2);
        for id in leaves {
            let portal = tree.portal(id).unwrap();
            assert_eq!(portal.len(), 6);
            assert_relative_eq!(portal.volume(), 9.0, epsilon = 1e-3);
            let walls: Vec<_> = portal.faces().iter().filter(|f| !f.is_exterior_wall()).collect();
            assert_eq!(walls.len(), 1);
            assert_eq!(walls[0].plane_node(), tree.root());
        }
    }

    #[test]
    fn unit_cube_interior_cell() {
        let tree = build(cube_faces(Point3::origin(), 1.0));
        let inside = tree.locate_portal(Point3::origin()).unwrap();
        let portal = tree.portal(inside).unwrap();

        assert_eq!(portal.len(), 6);
        assert!(portal.faces().iter().all(|f| !f.is_exterior_wall()));
        assert_eq!(portal.vertices().len(), 8);
        for v in portal.vertices() {
            assert_relative_eq!(v.x.abs(), 0.5, epsilon = 1e-4);
            assert_relative_eq!(v.y.abs(), 0.5, epsilon = 1e-4);
            assert_relative_eq!(v.z.abs(), 0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn leaf_volumes_fill_the_box() {
        let faces = cube_faces(Point3::origin(), 1.0);
        let expected = padded_volume(&faces, 1.0);
        let tree = build(faces);
        let total: f32 = tree
            .leaf_portals()
            .into_iter()
            .map(|id| tree.portal(id).unwrap().volume())
            .sum();
        assert_relative_eq!(total, expected, max_relative = 1e-3);
        assert_relative_eq!(total, 27.0, max_relative = 1e-3);
    }

    #[test]
    fn leaf_volumes_fill_the_box_for_rotated_geometry() {
        let faces = complex_scene();
        let expected = padded_volume(&faces, 1.0);
        let tree = build(faces);
        let total: f32 = tree
            .leaf_portals()
            .into_iter()
            .map(|id| tree.portal(id).unwrap().volume())
            .sum();
        assert_relative_eq!(total, expected, max_relative = 1e-3);
    }

    #[test]
    fn every_leaf_has_a_closed_cell() {
        let tree = build(complex_scene());
        for node in tree.nodes() {
            if let Some(portal) = node.portal() {
                assert!(node.is_leaf());
                assert!(tree.portal(portal).unwrap().len() >= 4);
            }
        }
        assert_eq!(tree.leaf_portals().len(), tree.portals().len());
    }

    #[test]
    fn walls_lie_on_their_node_plane() {
        let tree = build(complex_scene());
        let slack = tree.config().epsilon * 2.0;
        for portal in tree.portals() {
            for face in portal.faces() {
                let Some(node) = face.plane_node() else { continue };
                let plane = tree.node(node).unwrap().plane().unwrap();
                assert_eq!(face.plane(), plane);
                let plane = tree.plane(plane);
                assert!(face.vertices().iter().all(|v| plane.signed_distance(*v).abs() <= slack));
            }
        }
    }

    #[test]
    fn colors_come_from_the_generator() {
        let tree = BspTree::build_with(
            cube_faces(Point3::origin(), 1.0),
            BuildConfig::default(),
            &GeoClipKernel::default(),
            &mut FixedColor([1, 2, 3, 4]),
        )
        .unwrap();
        assert!(tree.portals().iter().all(|p| p.color() == [1, 2, 3, 4]));
    }
}
