//! Bundling of the files listed in a correction config so a rater can work
//! on a machine without the processed dataset.

use crate::correction::{check_files_exist, plan, CorrectionConfig};
use crate::error::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const DEFAULT_ARCHIVE: &str = "data_to_correct.zip";

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub archive: PathBuf,
    /// Archive entry names, in write order.
    pub entries: Vec<String>,
}

/// Archive entry name for a file under `path_in`: its path relative to
/// `path_in`, `/`-separated.
fn entry_name(path_in: &Path, file: &Path) -> String {
    file.strip_prefix(path_in)
        .unwrap_or(file)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write every image (and automatic segmentation) referenced by `config_path`
/// into `archive`, plus the config itself at the archive root.
///
/// All inputs are checked before the archive is created.
pub fn package_for_correction<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    config_path: P,
    path_in: Q,
    archive: R,
) -> Result<PackageReport> {
    let config_path = config_path.as_ref();
    let path_in = path_in.as_ref();
    let config = CorrectionConfig::load(config_path)?;

    // Output paths are not used here; any derivatives root will do.
    let jobs = plan(&config, path_in, path_in)?;
    check_files_exist(&jobs)?;

    let mut files: Vec<&Path> = Vec::new();
    for job in &jobs {
        for input in job.inputs() {
            if !files.contains(&input) {
                files.push(input);
            }
        }
    }

    let output = File::create(archive.as_ref())?;
    let mut zip = ZipWriter::new(output);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut entries = Vec::new();
    for file in files {
        let name = entry_name(path_in, file);
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut File::open(file)?, &mut zip)?;
        log::info!("Added {}", name);
        entries.push(name);
    }

    let config_name = config_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "config.yml".to_string());
    zip.start_file(config_name.as_str(), options)?;
    zip.write_all(&std::fs::read(config_path)?)?;
    entries.push(config_name);

    zip.finish()?;

    Ok(PackageReport {
        archive: archive.as_ref().to_path_buf(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SgError;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "data").unwrap();
    }

    #[test]
    fn test_package_for_correction() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        touch(&data.join("sub-amu01/anat/sub-amu01_T1w_RPI_r.nii.gz"));
        touch(&data.join("sub-amu01/anat/sub-amu01_T1w_RPI_r_seg.nii.gz"));
        let config = tmp.path().join("qc_fail.yml");
        fs::write(
            &config,
            "FILES_SEG:\n- sub-amu01_T1w_RPI_r.nii.gz\nFILES_LABEL:\n- sub-amu01_T1w_RPI_r.nii.gz\n",
        )
        .unwrap();
        let archive = tmp.path().join(DEFAULT_ARCHIVE);

        let report = package_for_correction(&config, &data, &archive).unwrap();
        assert_eq!(
            report.entries,
            vec![
                "sub-amu01/anat/sub-amu01_T1w_RPI_r.nii.gz",
                "sub-amu01/anat/sub-amu01_T1w_RPI_r_seg.nii.gz",
                "qc_fail.yml",
            ]
        );

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 3);
        assert!(zip.by_name("qc_fail.yml").is_ok());
    }

    #[test]
    fn test_package_missing_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("qc_fail.yml");
        fs::write(&config, "FILES_GMSEG:\n- sub-amu01_T2star_rms.nii.gz\n").unwrap();
        let archive = tmp.path().join(DEFAULT_ARCHIVE);

        let err = package_for_correction(&config, tmp.path(), &archive).unwrap_err();
        assert!(matches!(err, SgError::MissingInputs(ref m) if m.len() == 2));
        assert!(!archive.exists());
    }
}
