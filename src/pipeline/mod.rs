//! Bake orchestration.
//!
//! A [`Pipeline`] validates a [`BakeConfig`], then runs one stage per
//! projection. Each stage builds the projected grid, derives weights and the
//! backmap, evaluates the spherical-harmonic basis and writes every asset.

mod config;
mod stage;

pub use config::{BakeConfig, ConfigError, MAX_LMAX};
pub use stage::{
    asset_file_name, basis_file_name, AssetKind, AssetRecord, AssetWriter,
    BakeError, BakeReport, BakeStage, EquirectangularStage, HemisphericalStage, Pipeline,
    VariantOutputs, MANIFEST_FILE_NAME,
};
