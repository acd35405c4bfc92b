//! BSP tree construction, convex leaf cells and portal visibility queries
//! for closed polygonal solids.
//!
//! Build a [`BspTree`] from [`MeshFace`]s; it partitions space by the face
//! planes, carves the padded bounding box into leaf [`Portal`]s, links
//! portals that see each other through uncovered parts of the splitting
//! planes, and marks the cells reachable from outside as exterior.

pub mod bsp;
mod canon;
pub mod clip;
pub mod color;
mod config;
mod cuttable;
mod error;
mod face;
mod plane;
pub mod portal;

pub use bsp::{BspNode, BspTree, BspVisitor, CollectingVisitor, FnVisitor, NodeId, Side};
pub use canon::{
    Canonicalizer, PlaneCanonicalizer, PlaneId, Point2Canonicalizer, PointCanonicalizer, PointId,
};
pub use clip::{ClipKernel, GeoClipKernel};
pub use color::{ColorGenerator, FixedColor, HashColors};
pub use config::{BuildConfig, DEFAULT_EPSILON, DEFAULT_PADDING};
pub use cuttable::{Geometry, Split, Splittable};
pub use error::{BspError, Result};
pub use face::{box_faces, cube_faces, ConvexFace, MeshFace};
pub use plane::{Plane3D, PlaneSide, Sides};
pub use portal::{ModelFaceRef, Portal, PortalFace, PortalFaceRef, PortalId};
