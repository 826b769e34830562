//! JSON configuration and report helpers for the extraction pipeline.

use std::{
    fs,
    path::{Path, PathBuf},
};

use cardscan_orb::OrbDetector;
use serde::{Deserialize, Serialize};

use crate::extractor::{
    AlignStrategy, CardExtractor, ExtractError, ExtractionResult, ExtractorParams,
};
use crate::template::{ReferenceTemplate, TemplateError};
use crate::zone::ZoneSet;
use crate::{CleanParams, ContourAlignParams, FeatureAlignParams};

#[derive(thiserror::Error, Debug)]
pub enum ExtractIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// On-disk configuration for an extraction run.
///
/// Every pipeline knob is optional; unset sections fall back to the built-in
/// card profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Path of the reference template image.
    pub template_path: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub strategy: Option<AlignStrategy>,
    #[serde(default)]
    pub feature: Option<FeatureAlignParams>,
    #[serde(default)]
    pub contour: Option<ContourAlignParams>,
    #[serde(default)]
    pub zones: Option<ZoneSet>,
    #[serde(default)]
    pub clean: Option<CleanParams>,
}

impl ExtractConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ExtractIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ExtractIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("extract_report.json"))
    }

    /// Build extractor parameters, applying overrides from the config.
    pub fn build_params(&self) -> ExtractorParams {
        let mut params = ExtractorParams::default();
        if let Some(strategy) = self.strategy {
            params.strategy = strategy;
        }
        if let Some(feature) = self.feature {
            params.feature = feature;
        }
        if let Some(contour) = self.contour {
            params.contour = contour;
        }
        if let Some(zones) = self.zones.clone() {
            params.zones = zones;
        }
        if let Some(clean) = self.clean {
            params.clean = clean;
        }
        params
    }

    /// Build a ready-to-run extractor: loads the template and describes it
    /// with the same detector settings the scene side will use.
    pub fn build_extractor(&self) -> Result<CardExtractor, TemplateError> {
        let params = self.build_params();
        let detector = OrbDetector::new(params.feature.orb);
        let template = ReferenceTemplate::load(&self.template_path, &detector)?;
        Ok(CardExtractor::new(template, params))
    }
}

/// File-level record of one extraction run, written next to the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractReport {
    pub image_path: String,
    pub config_path: String,
    #[serde(default)]
    pub result: Option<ExtractionResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExtractReport {
    pub fn new(cfg: &ExtractConfig, config_path: &Path) -> Self {
        Self {
            image_path: cfg.image_path.clone().unwrap_or_default(),
            config_path: config_path.to_string_lossy().into_owned(),
            result: None,
            error: None,
        }
    }

    /// Record a successful extraction.
    pub fn set_result(&mut self, result: ExtractionResult) {
        self.result = Some(result);
        self.error = None;
    }

    /// Record an aborting failure.
    pub fn set_error(&mut self, err: &ExtractError) {
        self.error = Some(err.to_string());
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ExtractIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ExtractIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let cfg = ExtractConfig {
            template_path: "assets/template.png".into(),
            image_path: Some("card.jpg".into()),
            output_path: None,
            strategy: Some(AlignStrategy::Contour),
            feature: None,
            contour: None,
            zones: None,
            clean: None,
        };
        cfg.write_json(&path).expect("write");

        let loaded = ExtractConfig::load_json(&path).expect("load");
        assert_eq!(loaded.template_path, "assets/template.png");
        assert_eq!(loaded.strategy, Some(AlignStrategy::Contour));

        let params = loaded.build_params();
        assert_eq!(params.strategy, AlignStrategy::Contour);
        assert_eq!(params.zones, ZoneSet::student_card());
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let cfg: ExtractConfig =
            serde_json::from_str(r#"{ "template_path": "t.png" }"#).expect("parse");
        assert!(cfg.image_path.is_none());
        let params = cfg.build_params();
        assert_eq!(params.strategy, AlignStrategy::Feature);
        assert_eq!(params.feature.min_matches, 8);
    }

    #[test]
    fn missing_template_surfaces_as_config_error() {
        let cfg: ExtractConfig =
            serde_json::from_str(r#"{ "template_path": "/no/such/file.png" }"#).expect("parse");
        let err = cfg.build_extractor().expect_err("missing template");
        assert!(matches!(err, TemplateError::Missing { .. }));
    }

    #[test]
    fn report_records_errors_as_strings() {
        let cfg: ExtractConfig =
            serde_json::from_str(r#"{ "template_path": "t.png", "image_path": "c.jpg" }"#)
                .expect("parse");
        let mut report = ExtractReport::new(&cfg, Path::new("cfg.json"));
        report.set_error(&ExtractError::Alignment(
            crate::aligner::AlignError::NoContours,
        ));
        assert!(report.error.as_deref().unwrap_or("").contains("no card outline"));
        assert!(report.result.is_none());
    }
}
