//! Curation of manually corrected segmentations into a clean derivatives
//! folder.

use crate::bids::{get_subject, infer_datatype, Datatype};
use crate::correction::create_json;
use crate::derivatives::{check_output_folder, copy_file, FOLDER_DERIVATIVES};
use crate::error::{Result, SgError};
use crate::naming::{add_suffix, remove_suffix, sidecar_name};
use crate::tools::run_tool;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the list written at the root of the curated output.
pub const MANUAL_SEG_LIST: &str = "manual_seg.yml";

const MANUAL_SEG_PATTERN: &str = "*seg-manual.nii.gz";
const CSF_SEG_SUFFIX: &str = "_csfseg-manual.nii.gz";

/// Processing suffixes stripped from anatomical derivatives.
const PROCESSING_SUFFIXES: &[&str] = &["_RPI_r", "_rms"];

/// Resolution CSF segmentations are resampled to, in mm.
pub const CSF_RESOLUTION: &str = "0.8x0.8x0.8";

/// Curated filename for a manual segmentation.
///
/// DWI segmentations all refer to the averaged DWI volume and are renamed
/// `<subject>_rec-average_dwi_seg-manual.nii.gz`; other files lose their
/// processing suffixes.
pub fn curated_name(filename: &str) -> Result<String> {
    let subject = get_subject(filename)?;
    Ok(match infer_datatype(filename) {
        Datatype::Dwi => format!("{}_rec-average_dwi_seg-manual.nii.gz", subject),
        Datatype::Anat => PROCESSING_SUFFIXES
            .iter()
            .fold(filename.to_string(), |name, suffix| remove_suffix(&name, suffix)),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CuratedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Sidecar was copied from the source rather than created.
    pub sidecar_copied: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CurateReport {
    pub curated: Vec<CuratedFile>,
    pub list_file: PathBuf,
    #[serde(rename = "FILES_SEG")]
    pub files_seg: Vec<String>,
}

#[derive(Serialize)]
struct ManualSegList<'a> {
    #[serde(rename = "FILES_SEG")]
    files_seg: &'a [String],
}

fn find_manual_segmentations(path_in: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/{}",
        glob::Pattern::escape(&path_in.to_string_lossy()),
        MANUAL_SEG_PATTERN
    );
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("glob error: {}", e);
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Re-orient a CSF segmentation to RPI and resample it, replacing the file.
pub async fn curate_csfseg(fname: &Path) -> Result<()> {
    let original = fname.to_string_lossy().to_string();
    let rpi = add_suffix(&original, "_RPI");
    let rpi_r = add_suffix(&original, "_RPI_r");

    run_tool(
        "sct_image",
        ["-i", original.as_str(), "-setorient", "RPI", "-o", rpi.as_str()],
    )
    .await?;
    run_tool(
        "sct_resample",
        ["-i", rpi.as_str(), "-mm", CSF_RESOLUTION, "-o", rpi_r.as_str()],
    )
    .await?;

    fs::remove_file(&rpi)?;
    fs::rename(&rpi_r, fname)?;
    Ok(())
}

/// Collect every `*seg-manual.nii.gz` under `path_in` into
/// `<path_out>/derivatives/labels/<subject>/<datatype>/`, under its curated
/// name, with a JSON sidecar.
///
/// An existing sidecar next to the source is carried over; otherwise one is
/// created for `name_rater`. The curated names, minus `_seg-manual`, are
/// listed in `<path_out>/manual_seg.yml`.
pub async fn curate_derivatives<P: AsRef<Path>, Q: AsRef<Path>>(
    path_in: P,
    path_out: Q,
    name_rater: &str,
) -> Result<CurateReport> {
    let path_in = path_in.as_ref();
    let path_out = path_out.as_ref();
    if !path_in.is_dir() {
        return Err(SgError::DirectoryNotFound(path_in.to_path_buf()));
    }
    let path_out_deriv = check_output_folder(path_out, FOLDER_DERIVATIVES)?;

    let sources = find_manual_segmentations(path_in)?;
    log::info!("Found {} manual segmentations", sources.len());

    let mut report = CurateReport::default();
    for source in sources {
        let file = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let subject = get_subject(&file)?;
        let datatype = infer_datatype(&file);
        let file_curated = curated_name(&file)?;

        report
            .files_seg
            .push(remove_suffix(&file_curated, "_seg-manual"));

        let destination = path_out_deriv
            .join(subject)
            .join(datatype.as_str())
            .join(&file_curated);
        copy_file(&source, &destination, true)?;
        log::info!("{} -> {}", source.display(), destination.display());

        if file_curated.ends_with(CSF_SEG_SUFFIX) {
            curate_csfseg(&destination).await?;
        }

        let source_json = PathBuf::from(sidecar_name(&source.to_string_lossy()));
        let sidecar_copied = if source_json.is_file() {
            let curated_json = PathBuf::from(sidecar_name(&destination.to_string_lossy()));
            fs::copy(&source_json, curated_json)?;
            true
        } else {
            create_json(&destination, name_rater)?;
            false
        };

        report.curated.push(CuratedFile {
            source,
            destination,
            sidecar_copied,
        });
    }

    report.list_file = path_out.join(MANUAL_SEG_LIST);
    let yaml = serde_yaml::to_string(&ManualSegList {
        files_seg: &report.files_seg,
    })?;
    fs::write(&report.list_file, yaml)?;

    Ok(report)
}
