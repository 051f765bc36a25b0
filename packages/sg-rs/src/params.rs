//! Comparison of acquisition parameters in JSON sidecars against the
//! recommended protocol of each scanner model.
//!
//! The specs file is nested `manufacturer -> model -> contrast`:
//!
//! ```json
//! {"Siemens": {"Prisma_fit": {"T1w": {"RepetitionTime": 2.0, "EchoTime": 0.00372, "FlipAngle": 9}}}}
//! ```

use crate::derivatives::IMAGE_EXTENSION;
use crate::error::{Result, SgError};
use crate::naming::sidecar_name;
use crate::validator::RESERVED_DIRS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Contrasts whose parameters are checked.
pub const CHECKED_CONTRASTS: &[&str] = &["T1w", "T2w", "T2star"];

/// Log written at the dataset root, replaced on every run.
pub const WARNING_LOG: &str = "WARNING.log";

/// Allowed excess of TR and TE over the recommended value, in seconds.
pub const TIMING_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContrastSpec {
    pub repetition_time: Option<f64>,
    pub echo_time: Option<f64>,
    pub flip_angle: Option<f64>,
}

/// Recommended parameters, `manufacturer -> model -> contrast`.
pub type Specs = HashMap<String, HashMap<String, HashMap<String, ContrastSpec>>>;

pub fn load_specs<P: AsRef<Path>>(path: P) -> Result<Specs> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        SgError::InvalidConfig(format!("Cannot read specs file {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Metadata fields read from an image's sidecar.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AcquisitionMetadata {
    pub manufacturer: Option<String>,
    pub manufacturers_model_name: Option<String>,
    pub repetition_time: Option<f64>,
    pub echo_time: Option<f64>,
    pub flip_angle: Option<f64>,
}

impl AcquisitionMetadata {
    /// Read the sidecar of `image`; a missing sidecar yields empty metadata.
    pub fn for_image(image: &Path) -> Result<Self> {
        let sidecar = PathBuf::from(sidecar_name(&image.to_string_lossy()));
        if !sidecar.is_file() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(sidecar)?)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamWarning {
    MissingManufacturer { file: String },
    UnknownScanner { file: String, name: String },
    MissingParameter { file: String, parameter: String },
    Incorrect {
        file: String,
        parameter: String,
        actual: f64,
        expected: f64,
    },
}

fn abbreviation(parameter: &str) -> &str {
    match parameter {
        "RepetitionTime" => "TR",
        "EchoTime" => "TE",
        "FlipAngle" => "FA",
        other => other,
    }
}

impl fmt::Display for ParamWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamWarning::MissingManufacturer { file } => write!(
                f,
                "{} Missing Manufacturer in json sidecar; Cannot check parameters.",
                file
            ),
            ParamWarning::UnknownScanner { file, name } => {
                write!(f, "{} Missing: {}; Cannot check parameters.", file, name)
            }
            ParamWarning::MissingParameter { file, parameter } => {
                write!(f, "{} Missing {} in json sidecar.", file, parameter)
            }
            ParamWarning::Incorrect {
                file,
                parameter,
                actual,
                expected,
            } => write!(
                f,
                " Incorrect {}: {}; {}={:?} instead of {:?}",
                parameter,
                file,
                abbreviation(parameter),
                actual,
                expected
            ),
        }
    }
}

/// Contrast of a checked image (`sub-01_T2star.nii.gz` -> `T2star`).
fn image_contrast(filename: &str) -> Option<&'static str> {
    CHECKED_CONTRASTS
        .iter()
        .copied()
        .find(|c| filename.ends_with(&format!("_{}{}", c, IMAGE_EXTENSION)))
}

fn find_images(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() == 1
                && e.file_type().is_dir()
                && RESERVED_DIRS.contains(&e.file_name().to_string_lossy().as_ref()))
        });

    let mut images = Vec::new();
    for entry in walker {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && name.starts_with("sub-") && image_contrast(&name).is_some()
        {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

fn check_value(
    warnings: &mut Vec<ParamWarning>,
    file: &str,
    parameter: &str,
    actual: Option<f64>,
    expected: Option<f64>,
    differs: impl Fn(f64, f64) -> bool,
) {
    let Some(expected) = expected else {
        return;
    };
    match actual {
        Some(actual) if differs(actual, expected) => warnings.push(ParamWarning::Incorrect {
            file: file.to_string(),
            parameter: parameter.to_string(),
            actual,
            expected,
        }),
        Some(_) => {}
        None => warnings.push(ParamWarning::MissingParameter {
            file: file.to_string(),
            parameter: parameter.to_string(),
        }),
    }
}

/// Check one image's metadata against `specs`.
pub fn check_image(
    filename: &str,
    contrast: &str,
    metadata: &AcquisitionMetadata,
    specs: &Specs,
) -> Vec<ParamWarning> {
    let file = filename.to_string();
    let Some(ref manufacturer) = metadata.manufacturer else {
        return vec![ParamWarning::MissingManufacturer { file }];
    };
    let Some(models) = specs.get(manufacturer) else {
        return vec![ParamWarning::UnknownScanner {
            file,
            name: manufacturer.clone(),
        }];
    };
    let model = metadata.manufacturers_model_name.clone().unwrap_or_default();
    let Some(contrasts) = models.get(&model) else {
        return vec![ParamWarning::UnknownScanner { file, name: model }];
    };
    let Some(spec) = contrasts.get(contrast) else {
        return vec![ParamWarning::UnknownScanner {
            file,
            name: format!("{}/{}", model, contrast),
        }];
    };

    // TR and TE only flag values above the recommendation.
    let mut warnings = Vec::new();
    let too_long = |actual: f64, expected: f64| actual - expected > TIMING_TOLERANCE;
    check_value(
        &mut warnings,
        filename,
        "RepetitionTime",
        metadata.repetition_time,
        spec.repetition_time,
        too_long,
    );
    check_value(
        &mut warnings,
        filename,
        "EchoTime",
        metadata.echo_time,
        spec.echo_time,
        too_long,
    );
    check_value(
        &mut warnings,
        filename,
        "FlipAngle",
        metadata.flip_angle,
        spec.flip_angle,
        |actual, expected| actual != expected,
    );
    warnings
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamsReport {
    pub images_checked: usize,
    pub warnings: Vec<ParamWarning>,
    pub log_file: PathBuf,
}

impl ParamsReport {
    /// Lines of `WARNING.log`.
    pub fn log_lines(&self) -> Vec<String> {
        self.warnings.iter().map(|w| format!("WARNING:{}", w)).collect()
    }
}

/// Check every T1w, T2w and T2star image of a dataset and write
/// `WARNING.log` at its root.
pub fn check_params<P: AsRef<Path>>(path_in: P, specs: &Specs) -> Result<ParamsReport> {
    let root = path_in.as_ref();
    if !root.is_dir() {
        return Err(SgError::DirectoryNotFound(root.to_path_buf()));
    }

    let log_file = root.join(WARNING_LOG);
    if log_file.is_file() {
        fs::remove_file(&log_file)?;
    }

    let images = find_images(root)?;
    let mut warnings = Vec::new();
    for image in &images {
        let filename = image
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let Some(contrast) = image_contrast(&filename) else {
            continue;
        };
        let metadata = AcquisitionMetadata::for_image(image)?;
        for warning in check_image(&filename, contrast, &metadata, specs) {
            log::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    let report = ParamsReport {
        images_checked: images.len(),
        warnings,
        log_file,
    };
    let mut content = report.log_lines().join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(&report.log_file, content)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &str = r#"{
        "Siemens": {
            "Prisma_fit": {
                "T1w": {"RepetitionTime": 2.0, "EchoTime": 0.00372, "FlipAngle": 9},
                "T2w": {"RepetitionTime": 1.5, "EchoTime": 0.12, "FlipAngle": 120}
            }
        }
    }"#;

    fn specs() -> Specs {
        serde_json::from_str(SPECS).unwrap()
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_image_contrast() {
        assert_eq!(image_contrast("sub-01_T2star.nii.gz"), Some("T2star"));
        assert_eq!(image_contrast("sub-01_acq-MTon_MTS.nii.gz"), None);
        assert_eq!(image_contrast("sub-01_T1w.json"), None);
    }

    #[test]
    fn test_one_sided_timing_check() {
        let metadata = AcquisitionMetadata {
            manufacturer: Some("Siemens".into()),
            manufacturers_model_name: Some("Prisma_fit".into()),
            repetition_time: Some(1.0),
            echo_time: Some(0.5),
            flip_angle: Some(9.0),
        };
        let warnings = check_image("sub-01_T1w.nii.gz", "T1w", &metadata, &specs());
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].to_string(),
            " Incorrect EchoTime: sub-01_T1w.nii.gz; TE=0.5 instead of 0.00372"
        );
    }

    #[test]
    fn test_flip_angle_must_match() {
        let metadata = AcquisitionMetadata {
            manufacturer: Some("Siemens".into()),
            manufacturers_model_name: Some("Prisma_fit".into()),
            repetition_time: Some(1.5),
            echo_time: Some(0.12),
            flip_angle: Some(90.0),
        };
        let warnings = check_image("sub-01_T2w.nii.gz", "T2w", &metadata, &specs());
        assert_eq!(
            warnings,
            vec![ParamWarning::Incorrect {
                file: "sub-01_T2w.nii.gz".into(),
                parameter: "FlipAngle".into(),
                actual: 90.0,
                expected: 120.0,
            }]
        );
    }

    #[test]
    fn test_unknown_scanner() {
        let metadata = AcquisitionMetadata {
            manufacturer: Some("Siemens".into()),
            manufacturers_model_name: Some("Skyra".into()),
            ..Default::default()
        };
        let warnings = check_image("sub-01_T1w.nii.gz", "T1w", &metadata, &specs());
        assert_eq!(
            warnings[0].to_string(),
            "sub-01_T1w.nii.gz Missing: Skyra; Cannot check parameters."
        );
    }

    #[test]
    fn test_check_params_writes_log() {
        let tmp = tempfile::tempdir().unwrap();
        let anat = tmp.path().join("sub-01/anat");
        write(&anat.join("sub-01_T1w.nii.gz"), "");
        write(
            &anat.join("sub-01_T1w.json"),
            r#"{"Manufacturer": "Siemens", "ManufacturersModelName": "Prisma_fit",
                "RepetitionTime": 2.5, "EchoTime": 0.00372, "FlipAngle": 9}"#,
        );
        write(&anat.join("sub-01_T2w.nii.gz"), "");
        write(&tmp.path().join(WARNING_LOG), "stale\n");

        let report = check_params(tmp.path(), &specs()).unwrap();
        assert_eq!(report.images_checked, 2);

        let log = fs::read_to_string(tmp.path().join(WARNING_LOG)).unwrap();
        assert_eq!(
            log,
            "WARNING: Incorrect RepetitionTime: sub-01_T1w.nii.gz; TR=2.5 instead of 2.0\n\
             WARNING:sub-01_T2w.nii.gz Missing Manufacturer in json sidecar; Cannot check parameters.\n"
        );
    }

    #[test]
    fn test_load_specs_missing_file() {
        let err = load_specs("/nonexistent_specs_12345.json").unwrap_err();
        assert!(matches!(err, SgError::InvalidConfig(_)));
    }
}
