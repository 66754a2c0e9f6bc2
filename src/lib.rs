//! Offline baker for spherical-harmonic projection textures.
//!
//! For a hemispherical (azimuthal-equidistant) and an equirectangular
//! hemisphere projection, this crate produces per-pixel backmaps, importance
//! weights and complex `Y_l^m` basis layers, encoded as 8-bit PNG images.

pub mod grid;
pub mod projection;
pub mod weight;
pub mod harmonics;
pub mod export;
pub mod pipeline;

pub use grid::Grid2;
pub use projection::{AngularGrid, Backmap, Projection, ProjectionKind, ProjectedGrid};
pub use weight::{normalize_weights, raw_weights};
pub use harmonics::{basis_terms, generate_basis, ylm, BasisLayer, BasisTerm};
pub use pipeline::{BakeConfig, BakeError, BakeReport, Pipeline, EquirectangularStage, HemisphericalStage};
