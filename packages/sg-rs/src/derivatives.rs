//! Building the `derivatives/labels/` tree from raw or processed files.

use crate::bids::{get_contrast, get_subject};
use crate::error::{Result, SgError};
use crate::naming::add_suffix;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Folder where manual labels live, relative to a BIDS dataset root.
pub const FOLDER_DERIVATIVES: &str = "derivatives/labels";

/// Extension of the images the derivative tools operate on.
pub const IMAGE_EXTENSION: &str = ".nii.gz";

/// Directory a file belongs to under `root`: `root/<subject>/<datatype>`.
pub fn subject_dir<P: AsRef<Path>>(root: P, filename: &str) -> Result<PathBuf> {
    let subject = get_subject(filename)?;
    let datatype = get_contrast(filename)?;
    Ok(root.as_ref().join(subject).join(datatype.as_str()))
}

/// Output path of a derivative: `root/<subject>/<datatype>/<filename + suffix>`.
///
/// `root` is usually `<dataset>/derivatives/labels`.
pub fn derivative_path<P: AsRef<Path>>(root: P, filename: &str, suffix: &str) -> Result<PathBuf> {
    Ok(subject_dir(root, filename)?.join(add_suffix(filename, suffix)))
}

/// Make sure `path_out` exists and that `path_out/folder` can be written to.
///
/// The derivatives folder is created when missing. Returns its path.
pub fn check_output_folder<P: AsRef<Path>>(path_out: P, folder: &str) -> Result<PathBuf> {
    let path_out = path_out.as_ref();
    if !path_out.is_dir() {
        return Err(SgError::DirectoryNotFound(path_out.to_path_buf()));
    }
    let path_deriv = path_out.join(folder);
    fs::create_dir_all(&path_deriv)?;

    let metadata = fs::metadata(&path_deriv)?;
    if metadata.permissions().readonly() {
        return Err(SgError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("No write permission on {}", path_deriv.display()),
        )));
    }
    Ok(path_deriv)
}

/// Copy `src` to `dst`, creating parent directories.
///
/// When `overwrite` is false and `dst` exists, returns
/// [`SgError::OutputExists`] without touching it.
pub fn copy_file(src: &Path, dst: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && dst.exists() {
        return Err(SgError::OutputExists(dst.to_path_buf()));
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// A file copied into a derivatives tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    pub copied: Vec<CopiedFile>,
    pub skipped: Vec<PathBuf>,
}

fn record(report: &mut CopyReport, src: &Path, dst: PathBuf, overwrite: bool) -> Result<()> {
    match copy_file(src, &dst, overwrite) {
        Ok(()) => {
            log::info!("{} -> {}", src.display(), dst.display());
            report.copied.push(CopiedFile {
                source: src.to_path_buf(),
                destination: dst,
            });
            Ok(())
        }
        Err(SgError::OutputExists(path)) => {
            log::warn!("Output already exists, skipping: {}", path.display());
            report.skipped.push(path);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Copy `<path_in>/sub-*/<datatype>/sub-*<suffix>.nii.gz` files to
/// `<path_out>/<folder>/<subject>/<datatype>/`, appending `suffix_out` to each
/// copied filename.
///
/// The run stops at the first file whose name cannot be resolved; the
/// output tree is only meaningful if every subject id is known.
pub fn copy_files_that_match_suffix<P: AsRef<Path>, Q: AsRef<Path>>(
    path_in: P,
    suffix: &str,
    path_out: Q,
    folder: &str,
    suffix_out: Option<&str>,
    overwrite: bool,
) -> Result<CopyReport> {
    let path_in = path_in.as_ref();
    if !path_in.is_dir() {
        return Err(SgError::DirectoryNotFound(path_in.to_path_buf()));
    }
    let path_deriv = check_output_folder(path_out, folder)?;
    let pattern_end = format!("{}{}", suffix, IMAGE_EXTENSION);

    let mut sources: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(path_in).min_depth(3).max_depth(3) {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();
        let in_subject_dir = entry
            .path()
            .parent()
            .and_then(|p| p.parent())
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().starts_with("sub-"))
            .unwrap_or(false);
        if entry.file_type().is_file()
            && in_subject_dir
            && name.starts_with("sub-")
            && name.ends_with(&pattern_end)
        {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    log::debug!("Found {} files matching *{}", sources.len(), pattern_end);

    let mut report = CopyReport::default();
    for src in sources {
        let filename = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let dst = derivative_path(&path_deriv, &filename, suffix_out.unwrap_or(""))?;
        record(&mut report, &src, dst, overwrite)?;
    }

    Ok(report)
}

/// Move manual corrections from a flat folder into their dataset location:
/// every `*.nii.gz` in `source_dir` goes to
/// `<dataset>/<folder>/<subject>/<datatype>/`.
pub fn populate_derivatives<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    dataset: Q,
    folder: &str,
    overwrite: bool,
) -> Result<CopyReport> {
    let source_dir = source_dir.as_ref();
    if !source_dir.is_dir() {
        return Err(SgError::DirectoryNotFound(source_dir.to_path_buf()));
    }
    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&source_dir.to_string_lossy()),
        IMAGE_EXTENSION
    );

    let mut sources: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("glob error: {}", e);
                None
            }
        })
        .filter(|p| p.is_file())
        .collect();
    sources.sort();

    let root = dataset.as_ref().join(folder);
    let mut report = CopyReport::default();
    for src in sources {
        let filename = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let dst = subject_dir(&root, &filename)?.join(&filename);
        record(&mut report, &src, dst, overwrite)?;
    }

    Ok(report)
}
