//! Importance weights compensating each projection's area distortion.
//!
//! Raw weights are left without an absolute scale; consumers normalize by the
//! maximum over the valid domain.

use std::f64::consts::PI;

use crate::grid::Grid2;
use crate::projection::{Projection, ProjectedGrid};

/// Radii below this use the analytic center limit.
pub const CENTER_EPSILON: f64 = 1e-12;

/// Weight of the hemispherical (azimuthal-equidistant) projection at pixel
/// radius `r` for a disk of radius `radius`.
///
/// `w(r) = (π/2R) · sin(π r / 2R) / r`, with the limit `(π/2R)²` at the center.
pub fn hemispherical_weight(r: f64, radius: u32) -> f64 {
    let k = PI / (2.0 * radius as f64);
    if r < CENTER_EPSILON {
        return k * k;
    }
    k * (k * r).sin() / r
}

/// Weight of the equirectangular hemisphere at colatitude `theta`.
///
/// This is the solid-angle density `sin θ` without the grid-step factor.
#[inline]
pub fn equirect_weight(theta: f64) -> f64 {
    theta.sin()
}

/// Computes raw weights over a projected grid.
pub fn raw_weights(grid: &ProjectedGrid) -> Grid2<f64> {
    match grid.projection {
        Projection::Hemispherical { radius } => grid.radial.map(|&r| hemispherical_weight(r, radius)),
        Projection::Equirectangular { .. } => grid.angles.theta.map(|&t| equirect_weight(t)),
    }
}

/// Largest raw weight over the valid pixels, if any valid pixel exists.
pub fn max_valid_weight(raw: &Grid2<f64>, mask: &Grid2<bool>) -> Option<f64> {
    raw.iter()
        .zip(mask.iter())
        .filter(|&(_, &inside)| inside)
        .map(|(&w, _)| w)
        .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |m| m.max(w))))
}

/// Divides every valid weight by the maximum valid weight.
///
/// Invalid pixels become 0. If there is no valid pixel, or the maximum is not
/// positive, the result is all zeros.
pub fn normalize_weights(raw: &Grid2<f64>, mask: &Grid2<bool>) -> Grid2<f64> {
    let scale = max_valid_weight(raw, mask).filter(|&m| m > 0.0);
    raw.zip_map(mask, |&w, &inside| match scale {
        Some(s) if inside => w / s,
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_hemi_center_limit() {
        let expected = (PI / 1024.0).powi(2);
        assert_eq!(hemispherical_weight(0.0, 512), expected);
        assert_eq!(hemispherical_weight(1e-13, 512), expected);
        assert!((expected - 9.41e-6).abs() < 1e-7);
    }

    #[test]
    fn test_hemi_continuous_near_center() {
        let limit = hemispherical_weight(0.0, 512);
        let near = hemispherical_weight(1e-6, 512);
        assert!(((near - limit) / limit).abs() < 1e-9);
    }

    #[test]
    fn test_hemi_decreases_to_rim() {
        let r = 64;
        let mut prev = hemispherical_weight(0.0, r);
        for i in 1..=r {
            let w = hemispherical_weight(i as f64, r);
            assert!(w.is_finite() && w > 0.0);
            assert!(w < prev, "weight should fall off with radius");
            prev = w;
        }
        // At the rim, sin(π/2) = 1 so w = (π/2R) / R.
        let rim = hemispherical_weight(r as f64, r);
        assert!((rim - (PI / 128.0) / 64.0).abs() < 1e-15);
    }

    #[test]
    fn test_equirect_endpoints() {
        assert_eq!(equirect_weight(0.0), 0.0);
        assert_eq!(equirect_weight(FRAC_PI_2), 1.0);
    }

    #[test]
    fn test_normalized_max_is_one() {
        for projection in [
            Projection::Hemispherical { radius: 4 },
            Projection::Hemispherical { radius: 33 },
            Projection::Equirectangular { width: 16, height: 8 },
            Projection::Equirectangular { width: 3, height: 1 },
        ] {
            let grid = projection.build();
            let normalized = normalize_weights(&raw_weights(&grid), &grid.mask);
            let max = max_valid_weight(&normalized, &grid.mask).unwrap();
            if projection == (Projection::Equirectangular { width: 3, height: 1 }) {
                // Single row at θ = 0: every raw weight is zero.
                assert_eq!(max, 0.0);
            } else {
                assert_eq!(max, 1.0, "{:?}", projection);
            }
        }
    }

    #[test]
    fn test_normalized_zero_outside_mask() {
        let grid = Projection::Hemispherical { radius: 10 }.build();
        let normalized = normalize_weights(&raw_weights(&grid), &grid.mask);
        for (w, &inside) in normalized.iter().zip(grid.mask.iter()) {
            if inside {
                assert!(*w > 0.0 && *w <= 1.0);
            } else {
                assert_eq!(*w, 0.0);
            }
        }
    }

    #[test]
    fn test_normalize_empty_mask() {
        let raw = Grid2::filled(4, 4, 2.0);
        let mask = Grid2::filled(4, 4, false);
        assert!(max_valid_weight(&raw, &mask).is_none());
        assert!(normalize_weights(&raw, &mask).iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_raw_is_finite_everywhere() {
        let grid = Projection::Hemispherical { radius: 7 }.build();
        assert!(raw_weights(&grid).iter().all(|w| w.is_finite()));
    }
}
