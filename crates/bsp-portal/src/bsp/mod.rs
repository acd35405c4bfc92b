//! Binary Space Partitioning tree over the faces of a polygonal solid.
//!
//! The tree recursively partitions 3D space using the planes of its input
//! faces, then carves the padded bounding box into convex leaf cells
//! (see [`crate::portal`]). It supports:
//!
//! - In-order face and leaf-portal collection
//! - Back-to-front traversal relative to a viewpoint
//! - Point location down to the containing leaf cell
//!
//! # Example
//!
//! ```ignore
//! use bsp_portal::bsp::{BspTree, CollectingVisitor};
//! use bsp_portal::{cube_faces, BuildConfig};
//! use nalgebra::Point3;
//!
//! let tree = BspTree::build(cube_faces(Point3::origin(), 1.0), BuildConfig::default())?;
//!
//! // Paint far faces first
//! let eye = Point3::new(0.0, 0.0, 10.0);
//! let mut visitor = CollectingVisitor::new();
//! tree.traverse_back_to_front(eye, &mut visitor);
//! let ordered_faces = visitor.into_faces();
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: Arena of nodes and portals plus the canonical geometry
//! - [`BspNode`]: A splitting plane, the faces on it, and child/parent links
//! - [`BspVisitor`]: Visitor trait for custom traversal behavior

mod node;
pub(crate) mod tree;
mod visitor;

pub use node::{BspNode, NodeId, Side};
pub use tree::BspTree;
pub use visitor::{BspVisitor, CollectingVisitor, FnVisitor};
