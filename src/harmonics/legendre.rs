//! Orthonormalized associated Legendre functions.
//!
//! Computes `N_l^m · P_l^m(cos θ)` for `m ≥ 0`, where
//! `N_l^m = sqrt((2l+1)/(4π) · (l-m)!/(l+m)!)` and `P_l^m` carries the
//! Condon-Shortley phase `(-1)^m`. The recurrence runs on normalized values
//! directly, so no factorials are formed and high orders stay finite.

use std::f64::consts::PI;

/// Evaluates `N_l^m P_l^m(cos θ)` for a single `(l, m)` with `0 ≤ m ≤ l`.
pub fn normalized_legendre(l: u32, m: u32, cos_theta: f64, sin_theta: f64) -> f64 {
    debug_assert!(m <= l);
    let m_f = m as f64;

    // Diagonal: p_mm = (-1)^m sqrt((2m+1)/(4π (2m)!)) (2m-1)!! sin^m θ,
    // built up one order at a time.
    let mut p_mm = (1.0 / (4.0 * PI)).sqrt();
    for k in 1..=m {
        let k = k as f64;
        p_mm *= -((2.0 * k + 1.0) / (2.0 * k)).sqrt() * sin_theta;
    }
    if l == m {
        return p_mm;
    }

    // First off-diagonal.
    let mut p_prev = p_mm;
    let mut p_curr = (2.0 * m_f + 3.0).sqrt() * cos_theta * p_mm;
    if l == m + 1 {
        return p_curr;
    }

    for n in (m + 2)..=l {
        let n_f = n as f64;
        let a = ((4.0 * n_f * n_f - 1.0) / (n_f * n_f - m_f * m_f)).sqrt();
        let b = (((n_f - 1.0) * (n_f - 1.0) - m_f * m_f) / (4.0 * (n_f - 1.0) * (n_f - 1.0) - 1.0)).sqrt();
        let p_next = a * (cos_theta * p_curr - b * p_prev);
        p_prev = p_curr;
        p_curr = p_next;
    }
    p_curr
}
