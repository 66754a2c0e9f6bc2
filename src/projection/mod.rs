//! Sphere-to-plane projection models.
//!
//! Maps a pixel grid to angular coordinates (colatitude θ, azimuth φ) on the
//! upper hemisphere, together with a validity mask for the projection's
//! domain.

mod hemispherical;
mod equirect;
mod backmap;

pub use hemispherical::{hemispherical_sample, hemispherical_side};
pub use equirect::equirect_sample;
pub use backmap::{Backmap, normalize_phi, normalize_theta, phi_from_unit, theta_from_unit};

use serde::{Deserialize, Serialize};

use crate::grid::Grid2;

/// Which projection a bake targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    /// Azimuthal-equidistant hemisphere in a disk.
    Hemispherical,
    /// Equirectangular upper hemisphere.
    Equirectangular,
}

impl ProjectionKind {
    /// Returns both projection kinds in bake order.
    pub const fn all() -> [ProjectionKind; 2] {
        [ProjectionKind::Hemispherical, ProjectionKind::Equirectangular]
    }

    /// Short name used in asset file names (e.g. "hemi", "eq").
    pub const fn short_name(self) -> &'static str {
        match self {
            ProjectionKind::Hemispherical => "hemi",
            ProjectionKind::Equirectangular => "eq",
        }
    }
}

/// A fully parameterized projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Disk of pixel radius `radius`; the image is `2R x 2R`.
    Hemispherical { radius: u32 },
    /// `width x height` rectangle; φ spans the width, θ the height.
    Equirectangular { width: u32, height: u32 },
}

/// Per-pixel geometry produced by a projection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelSample {
    /// Colatitude in radians.
    pub theta: f64,
    /// Azimuth in radians, in [0, 2π).
    pub phi: f64,
    /// Distance from the projection center in pixels (0 for equirectangular).
    pub radial: f64,
    /// Whether the pixel lies inside the projection's valid domain.
    pub inside: bool,
}

/// Angular coordinates in radians for every pixel of a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularGrid {
    pub theta: Grid2<f64>,
    pub phi: Grid2<f64>,
}

impl AngularGrid {
    /// Returns `(width, height)` of the angle fields.
    pub fn dimensions(&self) -> (u32, u32) {
        self.theta.dimensions()
    }
}

/// The output of building a projection: angles plus validity mask.
#[derive(Debug, Clone)]
pub struct ProjectedGrid {
    pub projection: Projection,
    pub angles: AngularGrid,
    pub radial: Grid2<f64>,
    pub mask: Grid2<bool>,
}

impl Projection {
    /// Returns which kind of projection this is.
    pub fn kind(&self) -> ProjectionKind {
        match self {
            Projection::Hemispherical { .. } => ProjectionKind::Hemispherical,
            Projection::Equirectangular { .. } => ProjectionKind::Equirectangular,
        }
    }

    /// Image dimensions `(width, height)` in pixels.
    ///
    /// Callers are expected to have validated the parameters; an oversized
    /// hemispherical radius saturates rather than wrapping.
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            Projection::Hemispherical { radius } => {
                let side = hemispherical_side(radius).unwrap_or(u32::MAX);
                (side, side)
            }
            Projection::Equirectangular { width, height } => (width, height),
        }
    }

    /// Evaluates the projection at pixel `(x, y)`.
    pub fn sample(&self, x: u32, y: u32) -> PixelSample {
        match *self {
            Projection::Hemispherical { radius } => hemispherical_sample(radius, x, y),
            Projection::Equirectangular { width, height } => equirect_sample(width, height, x, y),
        }
    }

    /// Evaluates the projection over its whole pixel grid.
    pub fn build(&self) -> ProjectedGrid {
        let (w, h) = self.dimensions();
        let samples = Grid2::from_fn(w, h, |x, y| self.sample(x, y));

        ProjectedGrid {
            projection: *self,
            angles: AngularGrid {
                theta: samples.map(|s| s.theta),
                phi: samples.map(|s| s.phi),
            },
            radial: samples.map(|s| s.radial),
            mask: samples.map(|s| s.inside),
        }
    }
}
