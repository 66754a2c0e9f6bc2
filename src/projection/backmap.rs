//! Backmaps: per-pixel angular coordinates stored in normalized [0, 1] form.

use std::f64::consts::{FRAC_PI_2, TAU};

use super::{AngularGrid, ProjectedGrid, ProjectionKind};
use crate::grid::Grid2;

/// θ in [0, π/2] to θ01 in [0, 1].
#[inline]
pub fn normalize_theta(theta: f64) -> f64 {
    theta / FRAC_PI_2
}

/// φ in [0, 2π) to φ01 in [0, 1).
#[inline]
pub fn normalize_phi(phi: f64) -> f64 {
    phi / TAU
}

/// θ01 back to radians.
#[inline]
pub fn theta_from_unit(theta01: f64) -> f64 {
    theta01 * FRAC_PI_2
}

/// φ01 back to radians.
#[inline]
pub fn phi_from_unit(phi01: f64) -> f64 {
    phi01 * TAU
}

/// Normalized angular coordinates for every pixel, zeroed outside the mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Backmap {
    pub theta01: Grid2<f64>,
    pub phi01: Grid2<f64>,
}

impl Backmap {
    /// Normalizes a projected grid into backmap form.
    ///
    /// Hemispherical θ01 is clipped to [0, 1] (pixels past the rim would
    /// otherwise exceed it); every pixel outside the mask becomes `(0, 0)`.
    pub fn from_projected(grid: &ProjectedGrid) -> Self {
        let clip_theta = grid.projection.kind() == ProjectionKind::Hemispherical;

        let theta01 = grid.angles.theta.zip_map(&grid.mask, |&t, &inside| {
            if !inside {
                return 0.0;
            }
            let v = normalize_theta(t);
            if clip_theta { v.clamp(0.0, 1.0) } else { v }
        });
        let phi01 = grid.angles.phi.zip_map(&grid.mask, |&p, &inside| {
            if inside { normalize_phi(p) } else { 0.0 }
        });

        Self { theta01, phi01 }
    }

    /// Returns `(width, height)` of the backmap.
    pub fn dimensions(&self) -> (u32, u32) {
        self.theta01.dimensions()
    }

    /// Converts the backmap back into radians.
    pub fn to_angles(&self) -> AngularGrid {
        AngularGrid {
            theta: self.theta01.map(|&t| theta_from_unit(t)),
            phi: self.phi01.map(|&p| phi_from_unit(p)),
        }
    }
}
