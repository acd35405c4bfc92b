//! Display colors for portals.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::PortalId;

/// Supplies a display color for each portal as it is created.
pub trait ColorGenerator {
    /// RGBA color for a new portal.
    fn color(&mut self, portal: PortalId) -> [u8; 4];
}

/// Derives colors from a hash of the portal id, so a rebuild of the same
/// input paints the same cells the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashColors {
    /// Mixed into the hash to get a different palette.
    pub seed: u64,
}

impl ColorGenerator for HashColors {
    fn color(&mut self, portal: PortalId) -> [u8; 4] {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        portal.hash(&mut hasher);
        let hash = hasher.finish();

        // Keep colors away from black.
        let r = (((hash >> 16) & 0xFF) as u8).max(40);
        let g = (((hash >> 8) & 0xFF) as u8).max(40);
        let b = ((hash & 0xFF) as u8).max(40);
        [r, g, b, 255]
    }
}

/// Paints every portal the same color.
#[derive(Debug, Clone, Copy)]
pub struct FixedColor(pub [u8; 4]);

impl ColorGenerator for FixedColor {
    fn color(&mut self, _portal: PortalId) -> [u8; 4] {
        self.0
    }
}
