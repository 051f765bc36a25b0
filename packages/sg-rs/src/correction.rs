//! Manual correction of segmentations and vertebral labels.
//!
//! A YAML config lists, per task, the processed images whose automatic
//! output needs fixing:
//!
//! ```yaml
//! FILES_SEG:
//! - sub-amu01_T1w_RPI_r.nii.gz
//! - sub-cardiff02_dwi_moco_dwi_mean.nii.gz
//! FILES_GMSEG:
//! - sub-amu01_T2star_rms.nii.gz
//! FILES_LABEL:
//! - sub-amu01_T1w_RPI_r.nii.gz
//! NAME:
//! - John Doe
//! ```
//!
//! Each entry becomes a [`CorrectionJob`]: the automatic output is copied into
//! the derivatives tree under a `-manual` name and the rater edits it in an
//! external viewer.

use crate::derivatives::{copy_file, subject_dir};
use crate::error::{Result, SgError};
use crate::naming::{add_suffix, sidecar_name};
use crate::tools::run_tool;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Message shown by `sct_label_utils` in labeling mode.
pub const LABEL_MESSAGE: &str =
    "Click inside the spinal cord, at C3 and C5 mid-vertebral levels, then click 'Save and Quit'.";

/// Config key holding the rater's name.
pub const NAME_KEY: &str = "NAME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectionTask {
    /// Spinal cord segmentation.
    #[serde(rename = "FILES_SEG")]
    Seg,
    /// Gray matter segmentation.
    #[serde(rename = "FILES_GMSEG")]
    GmSeg,
    /// Vertebral labeling.
    #[serde(rename = "FILES_LABEL")]
    Label,
}

impl CorrectionTask {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "FILES_SEG" => Some(Self::Seg),
            "FILES_GMSEG" => Some(Self::GmSeg),
            "FILES_LABEL" => Some(Self::Label),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Seg => "FILES_SEG",
            Self::GmSeg => "FILES_GMSEG",
            Self::Label => "FILES_LABEL",
        }
    }

    /// Suffix of the automatic output next to the processed image, if any.
    pub fn source_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Seg => Some("_seg"),
            Self::GmSeg => Some("_gmseg"),
            Self::Label => None,
        }
    }

    /// Suffix of the manually corrected file.
    pub fn manual_suffix(&self) -> &'static str {
        match self {
            Self::Seg => "_seg-manual",
            Self::GmSeg => "_gmseg-manual",
            Self::Label => "_labels-manual",
        }
    }
}

/// Parsed correction config, tasks in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionConfig {
    pub tasks: Vec<(CorrectionTask, Vec<String>)>,
    pub rater: Option<String>,
}

fn string_list(key: &str, value: &serde_yaml::Value) -> Result<Vec<String>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_yaml::from_value::<Vec<String>>(value.clone()).map_err(|e| {
        SgError::InvalidConfig(format!("'{}' must be a list of file names: {}", key, e))
    })
}

impl CorrectionConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(text)?;
        let mut config = CorrectionConfig::default();

        for (key, value) in &mapping {
            let key = key
                .as_str()
                .ok_or_else(|| SgError::InvalidConfig(format!("non-string key {:?}", key)))?;

            if key == NAME_KEY {
                config.rater = match value {
                    serde_yaml::Value::String(s) => Some(s.clone()),
                    other => string_list(key, other)?.into_iter().next(),
                };
                continue;
            }

            let task = CorrectionTask::from_key(key).ok_or_else(|| {
                SgError::InvalidConfig(format!("Task not recognized from yml file: {}", key))
            })?;
            config.tasks.push((task, string_list(key, value)?));
        }

        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SgError::InvalidConfig(format!(
                "Input yml file {} does not exist or path is wrong.",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Every `(task, file)` pair in config order.
    pub fn entries(&self) -> impl Iterator<Item = (CorrectionTask, &str)> {
        self.tasks
            .iter()
            .flat_map(|(task, files)| files.iter().map(move |f| (*task, f.as_str())))
    }
}

/// Resolved paths for one file to correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionJob {
    pub task: CorrectionTask,
    pub file: String,
    /// Processed image, `<path_in>/<subject>/<datatype>/<file>`.
    pub image: PathBuf,
    /// Automatic output to start from; `None` for labeling.
    pub source: Option<PathBuf>,
    /// Corrected file in the derivatives tree.
    pub output: PathBuf,
}

impl CorrectionJob {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        task: CorrectionTask,
        file: &str,
        path_in: P,
        path_deriv: Q,
    ) -> Result<Self> {
        let image = subject_dir(path_in, file)?.join(file);
        let source = task
            .source_suffix()
            .map(|suffix| PathBuf::from(add_suffix(&image.to_string_lossy(), suffix)));
        let output = subject_dir(path_deriv, file)?.join(add_suffix(file, task.manual_suffix()));
        Ok(Self {
            task,
            file: file.to_string(),
            image,
            source,
            output,
        })
    }

    /// Program and arguments that open the editor for this job.
    pub fn viewer_command(&self) -> (&'static str, Vec<String>) {
        let image = self.image.display().to_string();
        let output = self.output.display().to_string();
        match self.task {
            CorrectionTask::Seg | CorrectionTask::GmSeg => (
                "fsleyes",
                vec![
                    "-yh".to_string(),
                    image,
                    output,
                    "-cm".to_string(),
                    "red".to_string(),
                ],
            ),
            CorrectionTask::Label => (
                "sct_label_utils",
                vec![
                    "-i".to_string(),
                    image,
                    "-create-viewer".to_string(),
                    "3,5".to_string(),
                    "-o".to_string(),
                    output,
                    "-msg".to_string(),
                    LABEL_MESSAGE.to_string(),
                ],
            ),
        }
    }

    /// Files that must exist before the job can run.
    pub fn inputs(&self) -> Vec<&Path> {
        let mut inputs = vec![self.image.as_path()];
        if let Some(ref source) = self.source {
            inputs.push(source.as_path());
        }
        inputs
    }
}

/// Build every job of a config.
pub fn plan<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &CorrectionConfig,
    path_in: P,
    path_deriv: Q,
) -> Result<Vec<CorrectionJob>> {
    config
        .entries()
        .map(|(task, file)| CorrectionJob::new(task, file, path_in.as_ref(), path_deriv.as_ref()))
        .collect()
}

/// Check all inputs up front so a long correction session does not stop
/// halfway on a typo. Every missing file is reported at once.
pub fn check_files_exist(jobs: &[CorrectionJob]) -> Result<()> {
    let mut missing: Vec<PathBuf> = Vec::new();
    for job in jobs {
        for input in job.inputs() {
            if !input.is_file() && !missing.iter().any(|m| m == input) {
                missing.push(input.to_path_buf());
            }
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SgError::MissingInputs(missing))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RaterSidecar<'a> {
    author: &'a str,
    date: String,
}

/// Write `{"Author": ..., "Date": ...}` next to a corrected image.
pub fn create_json<P: AsRef<Path>>(fname_nifti: P, name_rater: &str) -> Result<PathBuf> {
    let fname_json = PathBuf::from(sidecar_name(&fname_nifti.as_ref().to_string_lossy()));
    let metadata = RaterSidecar {
        author: name_rater,
        date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    let json = serde_json::to_string_pretty(&metadata)?;
    fs::write(&fname_json, json)?;
    Ok(fname_json)
}

/// Prepare a job's output and open the editor on it.
///
/// A corrected file that already exists is reopened as-is unless
/// `overwrite` is set, so earlier manual work is not replaced by the
/// automatic output.
pub async fn run_job(job: &CorrectionJob, name_rater: &str, overwrite: bool) -> Result<()> {
    if let Some(parent) = job.output.parent() {
        fs::create_dir_all(parent)?;
    }

    if let Some(ref source) = job.source {
        match copy_file(source, &job.output, overwrite) {
            Ok(()) => {}
            Err(SgError::OutputExists(path)) => {
                log::info!("Reopening existing correction: {}", path.display());
            }
            Err(e) => return Err(e),
        }
        log::warn!(
            "In FSLeyes, click on 'Edit mode', correct the segmentation, then save it with the same name (overwrite)."
        );
    }

    let (program, args) = job.viewer_command();
    run_tool(program, &args).await?;

    create_json(&job.output, name_rater)?;
    Ok(())
}
