//! Error types.

use crate::{NodeId, PortalId};

/// Errors surfaced by tree construction and graph queries.
///
/// Degenerate geometry is never an error; it is dropped during the build.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BspError {
    /// Epsilon must be finite and strictly positive.
    #[error("invalid epsilon {0}: must be finite and > 0")]
    InvalidEpsilon(f32),
    /// Padding must be finite and larger than epsilon.
    #[error("invalid bounding box padding {0}: must be finite and larger than epsilon")]
    InvalidPadding(f32),
    /// No usable face survived canonicalization.
    #[error("no non-degenerate faces to build a tree from")]
    NoFaces,
    /// The portal id does not belong to this tree.
    #[error("unknown portal {0:?}")]
    UnknownPortal(PortalId),
    /// The node id does not belong to this tree.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BspError>;
