//! Equirectangular projection restricted to the upper hemisphere.
//!
//! One full turn of azimuth spans the width; a quarter turn of colatitude
//! spans the height. Pixels are sampled at their top-left corner, so row 0 is
//! the pole and column 0 is φ = 0.

use std::f64::consts::{FRAC_PI_2, TAU};

use super::PixelSample;

/// Samples the equirectangular projection at pixel `(x, y)`.
pub fn equirect_sample(width: u32, height: u32, x: u32, y: u32) -> PixelSample {
    let phi = (x as f64 / width as f64) * TAU;
    let theta = (y as f64 / height as f64) * FRAC_PI_2;

    PixelSample {
        theta,
        phi,
        radial: 0.0,
        inside: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let s = equirect_sample(2048, 1024, 0, 0);
        assert_eq!(s.theta, 0.0);
        assert_eq!(s.phi, 0.0);
        assert!(s.inside);
    }

    #[test]
    fn test_linear_axes() {
        let s = equirect_sample(8, 4, 4, 2);
        assert!((s.phi - std::f64::consts::PI).abs() < 1e-12);
        assert!((s.theta - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_last_pixel_below_full_range() {
        let s = equirect_sample(16, 8, 15, 7);
        assert!(s.phi < TAU);
        assert!(s.theta < FRAC_PI_2);
    }
}
