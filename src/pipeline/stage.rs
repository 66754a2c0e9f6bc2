//! Bake stages and pipeline orchestration.

use std::path::{Path, PathBuf};

use image::{GrayImage, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use super::config::{BakeConfig, ConfigError};
use crate::export::{
    encode_complex, encode_gray, encode_rg, encode_weight, write_gray_png, write_rgba_png, ExportError,
    PngOptions,
};
use crate::harmonics::{basis_terms, evaluate_layer, BasisTerm};
use crate::projection::{Backmap, Projection, ProjectionKind};
use crate::weight::raw_weights;

/// File name of the manifest written next to the assets.
pub const MANIFEST_FILE_NAME: &str = "bake_manifest.json";

/// Errors that can occur while baking.
#[derive(Error, Debug)]
pub enum BakeError {
    #[error("Rejected configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What an asset contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Normalized colatitude, grayscale.
    Theta,
    /// Normalized azimuth, grayscale.
    Phi,
    /// Normalized (θ, φ) packed into red/green.
    BackmapRg,
    /// Max-normalized importance weight, grayscale.
    Weight,
    /// Complex `Y_l^m` layer packed into red/green.
    Basis,
}

impl AssetKind {
    fn suffix(self) -> &'static str {
        match self {
            AssetKind::Theta => "theta",
            AssetKind::Phi => "phi",
            AssetKind::BackmapRg => "backmap_rg",
            AssetKind::Weight => "weight",
            AssetKind::Basis => "basis",
        }
    }
}

/// File name of a non-basis asset, e.g. `hemi_weight.png`.
pub fn asset_file_name(variant: ProjectionKind, kind: AssetKind) -> String {
    format!("{}_{}.png", variant.short_name(), kind.suffix())
}

/// File name of a basis layer, e.g. `Y_2_-1_eq.png`.
pub fn basis_file_name(term: BasisTerm, variant: ProjectionKind) -> String {
    format!("Y_{}_{}_{}.png", term.l, term.m, variant.short_name())
}

/// One written asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    pub file: String,
    pub variant: ProjectionKind,
    pub kind: AssetKind,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<i32>,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BakeReport {
    pub config: BakeConfig,
    pub assets: Vec<AssetRecord>,
}

impl BakeReport {
    /// Number of basis layers written.
    pub fn basis_count(&self) -> usize {
        self.assets.iter().filter(|a| a.kind == AssetKind::Basis).count()
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), BakeError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Writes encoded images into an output directory.
#[derive(Debug, Clone)]
pub struct AssetWriter {
    output_dir: PathBuf,
    png: PngOptions,
}

impl AssetWriter {
    /// Creates a writer targeting `output_dir`, which must already exist.
    pub fn new(output_dir: impl Into<PathBuf>, png: PngOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            png,
        }
    }

    fn record(file: String, variant: ProjectionKind, kind: AssetKind, dims: (u32, u32), term: Option<BasisTerm>) -> AssetRecord {
        AssetRecord {
            file,
            variant,
            kind,
            width: dims.0,
            height: dims.1,
            l: term.map(|t| t.l),
            m: term.map(|t| t.m),
        }
    }

    /// Writes a grayscale asset and returns its record.
    pub fn write_gray(&self, image: &GrayImage, variant: ProjectionKind, kind: AssetKind) -> Result<AssetRecord, BakeError> {
        let file = asset_file_name(variant, kind);
        write_gray_png(image, &self.output_dir.join(&file), &self.png)?;
        Ok(Self::record(file, variant, kind, image.dimensions(), None))
    }

    /// Writes an RGBA asset and returns its record.
    pub fn write_rgba(&self, image: &RgbaImage, variant: ProjectionKind, kind: AssetKind) -> Result<AssetRecord, BakeError> {
        let file = asset_file_name(variant, kind);
        write_rgba_png(image, &self.output_dir.join(&file), &self.png)?;
        Ok(Self::record(file, variant, kind, image.dimensions(), None))
    }

    /// Writes a basis layer asset and returns its record.
    pub fn write_basis(&self, image: &RgbaImage, variant: ProjectionKind, term: BasisTerm) -> Result<AssetRecord, BakeError> {
        let file = basis_file_name(term, variant);
        write_rgba_png(image, &self.output_dir.join(&file), &self.png)?;
        Ok(Self::record(file, variant, AssetKind::Basis, image.dimensions(), Some(term)))
    }
}

/// Which optional outputs a projection stage emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantOutputs {
    /// Emit θ and φ as separate grayscale images.
    pub scalar_backmap: bool,
    /// Zero basis layers outside the validity mask.
    pub mask_layers: bool,
}

/// Bakes every asset of one projection.
///
/// Basis layers are evaluated, encoded and written in parallel; the returned
/// records are in basis order regardless of scheduling.
pub(crate) fn bake_projection(
    projection: Projection,
    lmax: u32,
    outputs: VariantOutputs,
    writer: &AssetWriter,
) -> Result<Vec<AssetRecord>, BakeError> {
    let variant = projection.kind();
    let grid = projection.build();
    let raw = raw_weights(&grid);
    let backmap = Backmap::from_projected(&grid);

    let mut records = Vec::new();
    if outputs.scalar_backmap {
        records.push(writer.write_gray(&encode_gray(&backmap.theta01), variant, AssetKind::Theta)?);
        records.push(writer.write_gray(&encode_gray(&backmap.phi01), variant, AssetKind::Phi)?);
    }
    let packed = encode_rg(&backmap.theta01, &backmap.phi01)?;
    records.push(writer.write_rgba(&packed, variant, AssetKind::BackmapRg)?);
    records.push(writer.write_gray(&encode_weight(&raw, &grid.mask)?, variant, AssetKind::Weight)?);

    // Layers are evaluated at the angles recovered from the normalized backmap.
    let angles = backmap.to_angles();
    let layers = basis_terms(lmax)
        .into_par_iter()
        .map(|term| {
            let mut layer = evaluate_layer(&angles, term);
            if outputs.mask_layers {
                layer = layer.masked(&grid.mask);
            }
            writer.write_basis(&encode_complex(&layer.field), variant, term)
        })
        .collect::<Result<Vec<_>, BakeError>>()?;
    records.extend(layers);

    Ok(records)
}

/// Trait for implementing bake stages.
///
/// Each stage bakes the complete asset set of one projection.
pub trait BakeStage: Send + Sync {
    /// Returns the projection this stage bakes.
    fn kind(&self) -> ProjectionKind;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Executes the stage, writing its assets through `writer`.
    ///
    /// Implementations reject an invalid `config` before writing anything.
    fn execute(&self, config: &BakeConfig, writer: &AssetWriter) -> Result<Vec<AssetRecord>, BakeError>;
}

/// Azimuthal-equidistant hemisphere assets.
pub struct HemisphericalStage;

impl BakeStage for HemisphericalStage {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Hemispherical
    }

    fn name(&self) -> &str {
        "Hemispherical Bake"
    }

    fn execute(&self, config: &BakeConfig, writer: &AssetWriter) -> Result<Vec<AssetRecord>, BakeError> {
        config.validate()?;
        let outputs = VariantOutputs {
            scalar_backmap: true,
            mask_layers: true,
        };
        bake_projection(config.projection(self.kind()), config.lmax, outputs, writer)
    }
}

/// Equirectangular hemisphere assets.
pub struct EquirectangularStage;

impl BakeStage for EquirectangularStage {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Equirectangular
    }

    fn name(&self) -> &str {
        "Equirectangular Bake"
    }

    fn execute(&self, config: &BakeConfig, writer: &AssetWriter) -> Result<Vec<AssetRecord>, BakeError> {
        config.validate()?;
        // The full rectangle is valid, so layers are left unmasked.
        let outputs = VariantOutputs {
            scalar_backmap: false,
            mask_layers: false,
        };
        bake_projection(config.projection(self.kind()), config.lmax, outputs, writer)
    }
}

/// Orchestrates bake stages into a complete asset set.
pub struct Pipeline {
    stages: Vec<Box<dyn BakeStage>>,
    config: BakeConfig,
    png: PngOptions,
    write_manifest: bool,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: BakeConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
            png: PngOptions::default(),
            write_manifest: false,
        }
    }

    /// Creates a pipeline baking both projections, hemispherical first.
    pub fn with_default_stages(config: BakeConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline.add_stage(HemisphericalStage);
        pipeline.add_stage(EquirectangularStage);
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: BakeStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Sets the PNG encoder settings.
    pub fn set_png_options(&mut self, png: PngOptions) -> &mut Self {
        self.png = png;
        self
    }

    /// Writes `bake_manifest.json` after the last stage when enabled.
    pub fn set_write_manifest(&mut self, enabled: bool) -> &mut Self {
        self.write_manifest = enabled;
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs all stages in order, writing assets into `output_dir`.
    pub fn run(&self, output_dir: &Path) -> Result<BakeReport, BakeError> {
        self.run_with_callbacks(output_dir, |_, _, _| {}, |_, _, _| {})
    }

    /// Runs all stages with progress callbacks.
    ///
    /// The configuration is validated before anything is allocated or written.
    ///
    /// # Arguments
    /// * `output_dir` - Directory receiving the assets (created if missing)
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        output_dir: &Path,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<BakeReport, BakeError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        self.config.validate()?;
        std::fs::create_dir_all(output_dir)?;

        let writer = AssetWriter::new(output_dir, self.png.clone());
        let total = self.stages.len();
        let mut assets = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);
            assets.extend(stage.execute(&self.config, &writer)?);
            on_stage_complete(stage.name(), i, total);
        }

        let report = BakeReport {
            config: self.config.clone(),
            assets,
        };
        if self.write_manifest {
            report.write_json(&output_dir.join(MANIFEST_FILE_NAME))?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::decode_complex;
    use tempfile::tempdir;

    fn tiny_config(lmax: u32) -> BakeConfig {
        BakeConfig {
            hemi_radius: 4,
            eq_width: 8,
            eq_height: 4,
            lmax,
        }
    }

    fn fast_pipeline(config: BakeConfig) -> Pipeline {
        let mut pipeline = Pipeline::with_default_stages(config);
        pipeline.set_png_options(PngOptions::fast());
        pipeline
    }

    #[test]
    fn test_file_names() {
        assert_eq!(asset_file_name(ProjectionKind::Hemispherical, AssetKind::Theta), "hemi_theta.png");
        assert_eq!(asset_file_name(ProjectionKind::Equirectangular, AssetKind::BackmapRg), "eq_backmap_rg.png");
        assert_eq!(asset_file_name(ProjectionKind::Equirectangular, AssetKind::Weight), "eq_weight.png");
        assert_eq!(basis_file_name(BasisTerm::new(2, -1), ProjectionKind::Equirectangular), "Y_2_-1_eq.png");
    }

    #[test]
    fn test_tiny_bake_single_basis_layer() {
        let dir = tempdir().unwrap();
        let report = fast_pipeline(tiny_config(0)).run(dir.path()).unwrap();

        let hemi_basis: Vec<_> = report
            .assets
            .iter()
            .filter(|a| a.kind == AssetKind::Basis && a.variant == ProjectionKind::Hemispherical)
            .collect();
        assert_eq!(hemi_basis.len(), 1);
        assert_eq!(hemi_basis[0].file, "Y_0_0_hemi.png");

        let img = image::open(dir.path().join("Y_0_0_hemi.png")).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (8, 8));

        let center = img.get_pixel(4, 4).0;
        assert!((center[0] as f64 / 255.0 - 0.641).abs() < 2.0 / 255.0, "red {}", center[0]);
        assert!((center[1] as f64 / 255.0 - 0.5).abs() < 1.0 / 255.0, "green {}", center[1]);
        assert_eq!(center[3], 255);

        let z = decode_complex(center);
        let y00 = 0.5 * (1.0 / std::f64::consts::PI).sqrt();
        assert!((z.re - y00).abs() <= 1.0 / 255.0);

        // Outside the disk the layer is masked to zero: (0.5, 0.5) in channel space.
        assert_eq!(img.get_pixel(0, 0).0, [128, 128, 0, 255]);
    }

    #[test]
    fn test_full_asset_set() {
        let dir = tempdir().unwrap();
        let report = fast_pipeline(tiny_config(2)).run(dir.path()).unwrap();

        // hemi: theta, phi, backmap, weight + 9 layers; eq: backmap, weight + 9 layers.
        assert_eq!(report.assets.len(), 4 + 9 + 2 + 9);
        assert_eq!(report.basis_count(), 18);

        for name in [
            "hemi_theta.png",
            "hemi_phi.png",
            "hemi_backmap_rg.png",
            "hemi_weight.png",
            "eq_backmap_rg.png",
            "eq_weight.png",
            "Y_0_0_hemi.png",
            "Y_1_-1_hemi.png",
            "Y_2_2_eq.png",
        ] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
        assert!(!dir.path().join("eq_theta.png").exists());
        assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());

        // Basis records follow (l, m) order within each variant.
        let eq_terms: Vec<(u32, i32)> = report
            .assets
            .iter()
            .filter(|a| a.kind == AssetKind::Basis && a.variant == ProjectionKind::Equirectangular)
            .map(|a| (a.l.unwrap(), a.m.unwrap()))
            .collect();
        let expected: Vec<(u32, i32)> = basis_terms(2).iter().map(|t| (t.l, t.m)).collect();
        assert_eq!(eq_terms, expected);
    }

    #[test]
    fn test_backmap_and_weight_assets() {
        let dir = tempdir().unwrap();
        fast_pipeline(tiny_config(0)).run(dir.path()).unwrap();

        let backmap = image::open(dir.path().join("hemi_backmap_rg.png")).unwrap().to_rgba8();
        assert_eq!(backmap.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(backmap.get_pixel(4, 4).0[0], 0);

        let weight = image::open(dir.path().join("hemi_weight.png")).unwrap().to_luma8();
        assert_eq!(weight.get_pixel(4, 4).0, [255]);
        assert_eq!(weight.get_pixel(0, 0).0, [0]);
        assert_eq!(weight.pixels().map(|p| p.0[0]).max(), Some(255));

        let eq_weight = image::open(dir.path().join("eq_weight.png")).unwrap().to_luma8();
        assert_eq!(eq_weight.dimensions(), (8, 4));
        assert_eq!(eq_weight.get_pixel(0, 0).0, [0]);
        assert_eq!(eq_weight.get_pixel(5, 3).0, [255]);
    }

    #[test]
    fn test_rebake_overwrites_and_is_deterministic() {
        let dir = tempdir().unwrap();
        let pipeline = fast_pipeline(tiny_config(1));
        pipeline.run(dir.path()).unwrap();
        let first = std::fs::read(dir.path().join("Y_1_1_hemi.png")).unwrap();
        pipeline.run(dir.path()).unwrap();
        let second = std::fs::read(dir.path().join("Y_1_1_hemi.png")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_config_fails_before_writing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let config = BakeConfig { hemi_radius: 0, ..tiny_config(0) };

        let result = fast_pipeline(config).run(&out);
        assert!(matches!(result, Err(BakeError::Config(ConfigError::InvalidRadius(0)))));
        assert!(!out.exists(), "nothing should be created for a rejected config");
    }

    #[test]
    fn test_stage_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let writer = AssetWriter::new(dir.path(), PngOptions::fast());

        let config = BakeConfig { hemi_radius: 0, ..tiny_config(0) };
        let result = HemisphericalStage.execute(&config, &writer);
        assert!(matches!(result, Err(BakeError::Config(ConfigError::InvalidRadius(0)))));

        let config = BakeConfig { lmax: u32::MAX, ..tiny_config(0) };
        let result = EquirectangularStage.execute(&config, &writer);
        assert!(matches!(result, Err(BakeError::Config(ConfigError::InvalidLmax(u32::MAX)))));

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_manifest_written() {
        let dir = tempdir().unwrap();
        let mut pipeline = fast_pipeline(tiny_config(0));
        pipeline.set_write_manifest(true);
        pipeline.run(dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(MANIFEST_FILE_NAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["config"]["hemi_radius"], 4);
        let assets = value["assets"].as_array().unwrap();
        assert_eq!(assets.len(), 4 + 1 + 2 + 1);
        assert_eq!(assets[0]["file"], "hemi_theta.png");
        assert_eq!(assets[0]["variant"], "hemispherical");
        assert!(assets[0].get("l").is_none());
    }

    #[test]
    fn test_pipeline_with_callbacks() {
        let dir = tempdir().unwrap();
        let pipeline = fast_pipeline(tiny_config(0));

        let mut started = Vec::new();
        let mut completed = Vec::new();
        pipeline
            .run_with_callbacks(
                dir.path(),
                |name, i, total| started.push((name.to_string(), i, total)),
                |name, i, total| completed.push((name.to_string(), i, total)),
            )
            .unwrap();

        assert_eq!(pipeline.stage_count(), 2);
        assert_eq!(started, completed);
        assert_eq!(started[0], ("Hemispherical Bake".to_string(), 0, 2));
        assert_eq!(started[1], ("Equirectangular Bake".to_string(), 1, 2));
    }

    #[test]
    fn test_single_stage_pipeline() {
        let dir = tempdir().unwrap();
        let mut pipeline = Pipeline::new(tiny_config(0));
        pipeline.add_stage(EquirectangularStage).set_png_options(PngOptions::fast());
        let report = pipeline.run(dir.path()).unwrap();

        assert!(report.assets.iter().all(|a| a.variant == ProjectionKind::Equirectangular));
        assert!(!dir.path().join("hemi_weight.png").exists());
    }
}
