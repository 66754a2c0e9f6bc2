//! Azimuthal-equidistant projection of the upper hemisphere onto a disk.
//!
//! Radial pixel distance is linear in colatitude: the disk center is the pole
//! (θ = 0) and the rim at radius `R` is the equator (θ = π/2).

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec2;

use super::PixelSample;

/// Side length `2R` of the square image holding a disk of radius `R`.
///
/// Returns `None` if the side does not fit in a `u32`.
pub fn hemispherical_side(radius: u32) -> Option<u32> {
    radius.checked_mul(2)
}

/// Samples the hemispherical projection at pixel `(x, y)`.
///
/// The disk center sits at pixel `(R, R)`. Pixels with `r > R` are reported as
/// outside, but their angles are still computed.
pub fn hemispherical_sample(radius: u32, x: u32, y: u32) -> PixelSample {
    let r_max = radius as f64;
    let offset = DVec2::new(x as f64 - r_max, y as f64 - r_max);
    let r = offset.length();

    let theta = FRAC_PI_2 * (r / r_max);
    // atan2 yields (-π, π]; rem_euclid folds it into [0, 2π).
    let mut phi = offset.y.atan2(offset.x).rem_euclid(TAU);
    if phi >= TAU {
        phi = 0.0;
    }

    PixelSample {
        theta,
        phi,
        radial: r,
        inside: r <= r_max,
    }
}
