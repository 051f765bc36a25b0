use crate::bids::{get_contrast, get_subject};
use crate::error::{Result, SgError};
use crate::grammar::{check_path, Violation};
use crate::naming::split_extension;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

/// Files every spine-generic dataset must carry at its root.
pub const REQUIRED_FILES: &[&str] = &[
    "dataset_description.json",
    "participants.tsv",
    "participants.json",
];

/// Top-level directories that hold non-raw data and are not checked.
pub const RESERVED_DIRS: &[&str] = &["derivatives", "sourcedata", "code"];

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// One file that does not follow the naming grammar.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Path relative to the dataset root, with a leading `/`.
    pub path: String,
    pub violation: Violation,
    /// Subject token, when the filename had one.
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub dataset: String,
    pub files_checked: usize,
    pub missing: Vec<String>,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn warning_count(&self) -> usize {
        self.missing.len() + self.findings.len()
    }

    pub fn is_clean(&self) -> bool {
        self.warning_count() == 0
    }

    /// One line per warning, as printed by `sg validate`.
    pub fn warning_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .missing
            .iter()
            .map(|m| format!("Warning - missing: /{}", m))
            .collect();
        lines.extend(
            self.findings
                .iter()
                .map(|f| format!("Warning : {} is not BIDS.", f.path)),
        );
        lines
    }
}

/// Collect dataset-relative paths (`/`-separated, leading `/`) of every file
/// that should be checked.
fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).min_depth(1).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        !(e.depth() == 1 && e.file_type().is_dir() && RESERVED_DIRS.contains(&name.as_ref()))
    });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if IGNORED_FILES.contains(&name.as_ref()) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        files.push(format!("/{}", parts.join("/")));
    }

    Ok(files)
}

fn classify(relative: &str) -> Option<Finding> {
    let violation = check_path(relative).err()?;
    let filename = relative.rsplit('/').next().unwrap_or(relative);
    let subject = get_subject(filename).ok().map(|s| s.to_string());
    Some(Finding {
        path: relative.to_string(),
        violation,
        subject,
    })
}

/// Check that a dataset directory is named according to BIDS.
///
/// Every problem is reported; nothing aborts the walk except I/O errors on
/// the dataset itself.
pub fn validate_dataset<P: AsRef<Path>>(path_data: P) -> Result<ValidationReport> {
    let root = path_data.as_ref();
    if !root.is_dir() {
        return Err(SgError::DirectoryNotFound(root.to_path_buf()));
    }

    log::info!("Now checking: {}", root.display());

    let missing: Vec<String> = REQUIRED_FILES
        .iter()
        .filter(|f| !root.join(f).is_file())
        .map(|f| f.to_string())
        .collect();

    let files = collect_files(root)?;
    log::debug!("Found {} files to check", files.len());

    let mut findings: Vec<Finding> = files.par_iter().filter_map(|f| classify(f)).collect();
    findings.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ValidationReport {
        dataset: root.display().to_string(),
        files_checked: files.len(),
        missing,
        findings,
    })
}

/// Summary of a flat list of filenames as the resolver sees them. Names the
/// resolver cannot handle are reported, not fatal.
#[derive(Debug, Clone, Serialize)]
pub struct NameCheck {
    pub filename: String,
    pub subject: Option<String>,
    pub datatype: Option<String>,
    pub extension: String,
    pub error: Option<String>,
}

pub fn check_name(filename: &str) -> NameCheck {
    let (_, extension) = split_extension(filename);
    let subject = get_subject(filename);
    let datatype = get_contrast(filename);
    let error = match (&subject, &datatype) {
        (Err(e), _) | (_, Err(e)) => Some(e.to_string()),
        _ => None,
    };
    NameCheck {
        filename: filename.to_string(),
        subject: subject.ok().map(|s| s.to_string()),
        datatype: datatype.ok().map(|d| d.to_string()),
        extension: extension.to_string(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn valid_dataset() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        for f in REQUIRED_FILES {
            touch(root, f);
        }
        touch(root, "README");
        touch(root, "sub-amu01/anat/sub-amu01_T1w.nii.gz");
        touch(root, "sub-amu01/anat/sub-amu01_T1w.json");
        touch(root, "sub-amu01/dwi/sub-amu01_dwi.nii.gz");
        touch(root, "sub-amu01/dwi/sub-amu01_dwi.bval");
        tmp
    }

    #[test]
    fn test_clean_dataset() {
        let tmp = valid_dataset();
        let report = validate_dataset(tmp.path()).unwrap();
        assert!(report.is_clean(), "{:?}", report.warning_lines());
        assert_eq!(report.files_checked, 8);
    }

    #[test]
    fn test_missing_required_files() {
        let tmp = valid_dataset();
        fs::remove_file(tmp.path().join("participants.json")).unwrap();
        let report = validate_dataset(tmp.path()).unwrap();
        assert_eq!(report.missing, vec!["participants.json"]);
        assert_eq!(
            report.warning_lines(),
            vec!["Warning - missing: /participants.json"]
        );
    }

    #[test]
    fn test_reports_every_bad_file() {
        let tmp = valid_dataset();
        touch(tmp.path(), "sub-amu01/anat/sub-amu01_T1w_RPI_r.nii.gz");
        touch(tmp.path(), "sub-amu01/anat/T1w.nii.gz");
        touch(tmp.path(), "notes.txt");
        let report = validate_dataset(tmp.path()).unwrap();
        let paths: Vec<&str> = report.findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/notes.txt",
                "/sub-amu01/anat/T1w.nii.gz",
                "/sub-amu01/anat/sub-amu01_T1w_RPI_r.nii.gz",
            ]
        );
        assert_eq!(report.findings[0].subject, None);
        assert_eq!(report.findings[2].subject.as_deref(), Some("sub-amu01"));
        assert!(report
            .warning_lines()
            .contains(&"Warning : /notes.txt is not BIDS.".to_string()));
    }

    #[test]
    fn test_skips_reserved_dirs_and_ds_store() {
        let tmp = valid_dataset();
        touch(tmp.path(), ".DS_Store");
        touch(tmp.path(), "sub-amu01/.DS_Store");
        touch(
            tmp.path(),
            "derivatives/labels/sub-amu01/anat/sub-amu01_T1w_seg-manual.nii.gz",
        );
        touch(tmp.path(), "sourcedata/scan.dcm");
        let report = validate_dataset(tmp.path()).unwrap();
        assert!(report.is_clean(), "{:?}", report.warning_lines());
    }

    #[test]
    fn test_missing_directory() {
        let err = validate_dataset("/nonexistent_dir_12345").unwrap_err();
        assert!(matches!(err, SgError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_check_name() {
        let ok = check_name("sub-cardiff02_dwi_crop_moco_dwi_mean.nii.gz");
        assert_eq!(ok.subject.as_deref(), Some("sub-cardiff02"));
        assert_eq!(ok.datatype.as_deref(), Some("dwi"));
        assert_eq!(ok.extension, ".nii.gz");
        assert!(ok.error.is_none());

        let bad = check_name("participants.tsv");
        assert!(bad.subject.is_none());
        assert!(bad.error.unwrap().contains("participants.tsv"));
    }
}
