//! Bake configuration parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::harmonics::basis_count;
use crate::projection::{hemispherical_side, Projection, ProjectionKind};

/// Highest accepted spherical-harmonic order (65 536 layers per projection).
pub const MAX_LMAX: u32 = 255;

/// Errors for rejected configurations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid hemispherical radius: {0} (must be >= 1)")]
    InvalidRadius(u32),
    #[error("Hemispherical radius {0} is too large: 2R does not fit in u32")]
    RadiusOverflow(u32),
    #[error("Invalid equirectangular dimensions: {0}x{1} (both must be >= 1)")]
    InvalidDimensions(u32, u32),
    #[error("Invalid lmax: {0} (must be <= 255)")]
    InvalidLmax(u32),
}

/// Parameters of one bake.
///
/// The defaults are the reference configuration; every value can be overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// Pixel radius of the hemispherical disk (image is `2R x 2R`).
    pub hemi_radius: u32,
    /// Equirectangular width in pixels (one full turn of azimuth).
    pub eq_width: u32,
    /// Equirectangular height in pixels (pole to equator).
    pub eq_height: u32,
    /// Highest spherical-harmonic order; `(lmax + 1)²` layers per projection.
    pub lmax: u32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            hemi_radius: 512,
            eq_width: 2048,
            eq_height: 1024,
            lmax: 6,
        }
    }
}

impl BakeConfig {
    /// Small configuration for previews and tests.
    pub fn preview() -> Self {
        Self {
            hemi_radius: 32,
            eq_width: 128,
            eq_height: 64,
            lmax: 2,
        }
    }

    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, crate::pipeline::BakeError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Checks that every dimension and the basis size are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hemi_radius == 0 {
            return Err(ConfigError::InvalidRadius(self.hemi_radius));
        }
        if hemispherical_side(self.hemi_radius).is_none() {
            return Err(ConfigError::RadiusOverflow(self.hemi_radius));
        }
        if self.eq_width == 0 || self.eq_height == 0 {
            return Err(ConfigError::InvalidDimensions(self.eq_width, self.eq_height));
        }
        if self.lmax > MAX_LMAX || basis_count(self.lmax).is_none() {
            return Err(ConfigError::InvalidLmax(self.lmax));
        }
        Ok(())
    }

    /// Returns the parameterized projection for `kind`.
    pub fn projection(&self, kind: ProjectionKind) -> Projection {
        match kind {
            ProjectionKind::Hemispherical => Projection::Hemispherical { radius: self.hemi_radius },
            ProjectionKind::Equirectangular => Projection::Equirectangular {
                width: self.eq_width,
                height: self.eq_height,
            },
        }
    }

    /// Number of spherical-harmonic layers per projection.
    ///
    /// Returns `None` if `lmax` is too large for the count to be represented.
    pub fn layer_count(&self) -> Option<usize> {
        basis_count(self.lmax)
    }
}
