//! Build configuration.

use crate::{BspError, Result};

/// Default epsilon for all coincidence tests (point merging, plane merging,
/// plane-side classification).
pub const DEFAULT_EPSILON: f32 = 1e-4;

/// Default distance the bounding box is grown by on every side before it
/// becomes the root portal.
pub const DEFAULT_PADDING: f32 = 1.0;

/// Tunables threaded through a single build.
///
/// Changing either value requires a full rebuild, see
/// [`BspTree::rebuild`](crate::BspTree::rebuild).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildConfig {
    /// Points and planes closer than this are the same; vertices closer than
    /// this to a plane are on it.
    pub epsilon: f32,
    /// Padding added around the solid's axis-aligned bounds.
    pub padding: f32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            padding: DEFAULT_PADDING,
        }
    }
}

impl BuildConfig {
    /// Sets the coincidence epsilon.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the bounding box padding.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Checks that the values can drive a build.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(BspError::InvalidEpsilon(self.epsilon));
        }
        if !self.padding.is_finite() || self.padding <= self.epsilon {
            return Err(BspError::InvalidPadding(self.padding));
        }
        Ok(())
    }

    /// Area at or below which a cross-section wall is dropped.
    #[inline]
    pub(crate) fn area_epsilon(&self) -> f64 {
        f64::from(self.epsilon) * f64::from(self.epsilon)
    }
}
