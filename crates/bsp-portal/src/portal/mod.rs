//! Convex leaf cells and the adjacency graph between them.
//!
//! Portals are built by pushing the padded bounding box down the tree and
//! splitting it at every plane. Each cut leaves a shared wall tagged with
//! the node whose plane made it. Walls are then matched across each plane,
//! with model faces on the plane blocking sight, and the resulting graph
//! answers exterior and hop-count queries.

mod build;
mod connect;
mod face;
mod graph;
#[allow(clippy::module_inception)]
mod portal;

pub use face::{ModelFaceRef, PortalFace, PortalFaceRef};
pub use portal::{Portal, PortalId};
