//! Complex spherical-harmonic basis evaluation.
//!
//! Uses the orthonormal physics convention with the Condon-Shortley phase:
//! `Y_l^m(θ, φ) = N_l^m P_l^m(cos θ) e^{imφ}` with θ the colatitude and φ the
//! azimuth. Negative degrees follow `Y_l^{-m} = (-1)^m conj(Y_l^m)`.

mod legendre;

pub use legendre::normalized_legendre;

use num_complex::Complex64;
use rayon::prelude::*;

use crate::grid::Grid2;
use crate::projection::AngularGrid;

/// One `(order, degree)` pair of the basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasisTerm {
    /// Order `l ≥ 0`.
    pub l: u32,
    /// Degree `-l ≤ m ≤ l`.
    pub m: i32,
}

impl BasisTerm {
    /// Creates a term; `|m|` must not exceed `l`.
    pub fn new(l: u32, m: i32) -> Self {
        debug_assert!(m.unsigned_abs() <= l);
        Self { l, m }
    }

    /// Position of this term in the basis ordering.
    pub fn index(self) -> usize {
        basis_index(self.l, self.m)
    }
}

/// Number of basis terms for truncation order `lmax`: `(lmax + 1)²`.
///
/// Returns `None` if the count does not fit in a `usize`.
pub fn basis_count(lmax: u32) -> Option<usize> {
    let n = (lmax as usize).checked_add(1)?;
    n.checked_mul(n)
}

/// Index of `(l, m)` in the ordering `l` ascending, then `m` ascending.
pub fn basis_index(l: u32, m: i32) -> usize {
    let l = l as i64;
    (l * l + l + m as i64) as usize
}

/// All basis terms up to `lmax`, ordered by `l` then `m`.
///
/// `lmax` is expected to be validated (see `BakeConfig::validate`).
pub fn basis_terms(lmax: u32) -> Vec<BasisTerm> {
    let mut terms = Vec::with_capacity(basis_count(lmax).unwrap_or(0));
    for l in 0..=lmax {
        let l_i = l as i32;
        for m in -l_i..=l_i {
            terms.push(BasisTerm { l, m });
        }
    }
    terms
}

/// Evaluates `Y_l^m(θ, φ)`.
pub fn ylm(l: u32, m: i32, theta: f64, phi: f64) -> Complex64 {
    let m_abs = m.unsigned_abs();
    let (sin_theta, cos_theta) = theta.sin_cos();
    let p = normalized_legendre(l, m_abs, cos_theta, sin_theta);
    let y = Complex64::from_polar(p, m_abs as f64 * phi);

    if m >= 0 {
        y
    } else if m_abs % 2 == 0 {
        y.conj()
    } else {
        -y.conj()
    }
}

/// A basis function evaluated over a whole grid.
#[derive(Debug, Clone)]
pub struct BasisLayer {
    pub term: BasisTerm,
    pub field: Grid2<Complex64>,
}

impl BasisLayer {
    /// Zeroes every sample outside `mask`.
    pub fn masked(mut self, mask: &Grid2<bool>) -> Self {
        self.field = apply_mask(&self.field, mask);
        self
    }
}

/// Evaluates a single basis term at every pixel of `grid`.
pub fn evaluate_layer(grid: &AngularGrid, term: BasisTerm) -> BasisLayer {
    let field = grid
        .theta
        .zip_map(&grid.phi, |&theta, &phi| ylm(term.l, term.m, theta, phi));
    BasisLayer { term, field }
}

/// Evaluates every basis term up to `lmax` over `grid`.
///
/// The returned layers are in basis order (see [`basis_terms`]).
pub fn generate_basis(grid: &AngularGrid, lmax: u32) -> Vec<BasisLayer> {
    basis_terms(lmax)
        .into_par_iter()
        .map(|term| evaluate_layer(grid, term))
        .collect()
}

/// Multiplies a complex field by a validity mask.
pub fn apply_mask(field: &Grid2<Complex64>, mask: &Grid2<bool>) -> Grid2<Complex64> {
    field.zip_map(mask, |&z, &inside| if inside { z } else { Complex64::new(0.0, 0.0) })
}
