//! Config-driven extraction run.
//!
//! Usage: `cargo run --example extract_card -- extract_config.json`
//!
//! Reads the JSON config, loads the reference template, aligns the input
//! photo, extracts the configured zones and writes a JSON report. Without
//! the `ocr` feature a no-op recognizer is used, so the report shows zone
//! geometry and alignment quality but every field reads "not detected".

use std::{
    env,
    path::{Path, PathBuf},
};

use cardscan::extract::{ExtractConfig, ExtractReport};
#[cfg(not(feature = "ocr"))]
use cardscan::extract::{OcrError, TextRecognizer};
use cardscan::run::extract_from_bytes;
use log::LevelFilter;

#[cfg(not(feature = "ocr"))]
struct NoopOcr;

#[cfg(not(feature = "ocr"))]
impl TextRecognizer for NoopOcr {
    fn recognize(&self, _: &image::GrayImage) -> Result<Vec<String>, OcrError> {
        Ok(vec![])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    cardscan::core::init_with_level(LevelFilter::Info)?;

    let config_path = parse_config_path();
    let cfg = ExtractConfig::load_json(&config_path)?;

    let extractor = cfg.build_extractor()?;
    let image_path = cfg
        .image_path
        .clone()
        .ok_or("config is missing image_path")?;
    let bytes = std::fs::read(Path::new(&image_path))?;

    let mut report = ExtractReport::new(&cfg, &config_path);

    #[cfg(feature = "ocr")]
    let recognizer = cardscan::extract::OcrsRecognizer::new(
        cardscan::extract::OcrsConfig::from_dir("models"),
    )?;
    #[cfg(not(feature = "ocr"))]
    let recognizer = NoopOcr;

    match extract_from_bytes(&extractor, &bytes, &recognizer) {
        Ok(result) => {
            for field in &result.fields {
                println!(
                    "{}: {}",
                    field.label,
                    field.text.as_deref().unwrap_or("not detected")
                );
            }
            report.set_result(result);
        }
        Err(cardscan::run::RunError::Extract(err)) => {
            eprintln!("{err}");
            report.set_error(&err);
        }
        Err(err) => return Err(err.into()),
    }

    let output_path = cfg.output_path();
    report.write_json(&output_path)?;
    println!("wrote report JSON to {}", output_path.display());
    Ok(())
}

fn parse_config_path() -> PathBuf {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("extract_config.json"))
}
