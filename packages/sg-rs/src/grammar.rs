//! BIDS naming grammar for raw dataset files.
//!
//! Covers the subset of the BIDS specification that occurs in spine-generic
//! datasets: top-level metadata files and `sub-*/[ses-*/]<datatype>/` images
//! with their sidecars.

use crate::name::BidsName;
use crate::naming::split_extension;
use serde::Serialize;
use std::fmt;

pub const TOP_LEVEL_FILES: &[&str] = &[
    "dataset_description.json",
    "participants.tsv",
    "participants.json",
    "README",
    "README.md",
    "CHANGES",
    "LICENSE",
    ".bidsignore",
];

/// Entity keys in the order they must appear in a filename.
pub const ENTITY_ORDER: &[&str] = &[
    "sub", "ses", "task", "acq", "ce", "rec", "dir", "run", "mod", "echo", "flip", "inv", "mt",
    "part", "chunk",
];

pub const DATATYPE_SUFFIXES: &[(&str, &[&str])] = &[
    (
        "anat",
        &[
            "T1w", "T2w", "T2star", "T2starw", "FLAIR", "PD", "PDw", "PDT2", "MTS", "MTR",
            "T1map", "T2map", "UNIT1", "MP2RAGE", "defacemask",
        ],
    ),
    ("dwi", &["dwi", "sbref"]),
    ("func", &["bold", "sbref", "events", "physio"]),
    (
        "fmap",
        &[
            "phasediff", "magnitude1", "magnitude2", "phase1", "phase2", "fieldmap", "epi",
            "TB1map",
        ],
    ),
];

pub const EXTENSIONS: &[&str] = &[".nii.gz", ".nii", ".json", ".bval", ".bvec", ".tsv", ".tsv.gz"];

/// Why a path does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    UnknownTopLevelFile { name: String },
    BadLayout { path: String },
    SubjectMismatch { directory: String, filename: String },
    SessionMismatch { directory: String, filename: String },
    UnknownDatatype { datatype: String },
    MalformedName { reason: String },
    UnknownEntity { key: String },
    EntityOrder { key: String },
    UnknownSuffix { suffix: String, datatype: String },
    UnknownExtension { extension: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnknownTopLevelFile { name } => write!(f, "unknown top-level file '{}'", name),
            Violation::BadLayout { path } => write!(
                f,
                "'{}' is not under sub-<label>/[ses-<label>/]<datatype>/",
                path
            ),
            Violation::SubjectMismatch { directory, filename } => write!(
                f,
                "subject '{}' in filename does not match directory '{}'",
                filename, directory
            ),
            Violation::SessionMismatch { directory, filename } => write!(
                f,
                "session '{}' in filename does not match directory '{}'",
                filename, directory
            ),
            Violation::UnknownDatatype { datatype } => write!(f, "unknown datatype '{}'", datatype),
            Violation::MalformedName { reason } => write!(f, "{}", reason),
            Violation::UnknownEntity { key } => write!(f, "unknown entity '{}'", key),
            Violation::EntityOrder { key } => write!(f, "entity '{}' is out of order", key),
            Violation::UnknownSuffix { suffix, datatype } => {
                write!(f, "suffix '{}' is not valid for datatype '{}'", suffix, datatype)
            }
            Violation::UnknownExtension { extension } => {
                write!(f, "unknown extension '{}'", extension)
            }
        }
    }
}

fn suffixes_for(datatype: &str) -> Option<&'static [&'static str]> {
    DATATYPE_SUFFIXES
        .iter()
        .find(|(d, _)| *d == datatype)
        .map(|(_, s)| *s)
}

fn check_extension(name: &str) -> Result<(), Violation> {
    let ext = if name.ends_with(".tsv.gz") {
        ".tsv.gz"
    } else {
        split_extension(name).1
    };
    if EXTENSIONS.contains(&ext) {
        Ok(())
    } else {
        Err(Violation::UnknownExtension {
            extension: ext.to_string(),
        })
    }
}

/// Check entity keys against [`ENTITY_ORDER`].
fn check_entities(name: &BidsName) -> Result<(), Violation> {
    let mut last: Option<usize> = None;
    for entity in name.entities() {
        let pos = ENTITY_ORDER
            .iter()
            .position(|k| *k == entity.key)
            .ok_or_else(|| Violation::UnknownEntity {
                key: entity.key.clone(),
            })?;
        // Strictly increasing, so a repeated key is out of order too.
        if last.is_some_and(|l| pos <= l) {
            return Err(Violation::EntityOrder {
                key: entity.key.clone(),
            });
        }
        last = Some(pos);
    }
    Ok(())
}

/// Parse a filename for grammar checks. `.tsv.gz` is read as `.tsv` so the
/// suffix comes out clean; the naming helpers only know `.nii.gz` and
/// `.tar.gz` as compound.
fn parse_name(filename: &str) -> Result<BidsName, Violation> {
    let name = match filename.strip_suffix(".gz") {
        Some(tsv) if tsv.ends_with(".tsv") => tsv,
        _ => filename,
    };
    BidsName::parse(name).map_err(|e| Violation::MalformedName {
        reason: e.to_string(),
    })
}

/// Top-level inheritance sidecar such as `T1w.json` or `acq-sag_T2w.json`.
fn is_top_level_sidecar(name: &str) -> bool {
    let (stem, ext) = split_extension(name);
    if ext != ".json" {
        return false;
    }
    let mut segments: Vec<&str> = stem.split('_').collect();
    let suffix = match segments.pop() {
        Some(s) => s,
        None => return false,
    };
    let known_suffix = DATATYPE_SUFFIXES.iter().any(|(_, s)| s.contains(&suffix));
    known_suffix
        && segments.iter().all(|seg| match seg.split_once('-') {
            Some((key, value)) => key != "sub" && ENTITY_ORDER.contains(&key) && !value.is_empty(),
            None => false,
        })
}

/// Check a path relative to the dataset root, `/`-separated, with or
/// without a leading `/` (e.g. `/sub-01/anat/sub-01_T1w.nii.gz`).
pub fn check_path(relative: &str) -> Result<(), Violation> {
    let relative = relative.trim_start_matches('/');
    let parts: Vec<&str> = relative.split('/').collect();

    if parts.len() == 1 {
        let name = parts[0];
        if TOP_LEVEL_FILES.contains(&name) || is_top_level_sidecar(name) {
            return Ok(());
        }
        return Err(Violation::UnknownTopLevelFile {
            name: name.to_string(),
        });
    }

    let (subject_dir, session_dir, datatype, filename) = match parts.as_slice() {
        [sub, datatype, file] => (*sub, None, *datatype, *file),
        [sub, ses, datatype, file] if ses.starts_with("ses-") => (*sub, Some(*ses), *datatype, *file),
        [sub, file] if file.ends_with("_scans.tsv") || file.ends_with("_sessions.tsv") => {
            return check_subject_file(sub, file)
        }
        [sub, ses, file] if ses.starts_with("ses-") && file.ends_with("_scans.tsv") => {
            return check_subject_file(sub, file)
        }
        _ => {
            return Err(Violation::BadLayout {
                path: relative.to_string(),
            })
        }
    };

    if !subject_dir.starts_with("sub-") {
        return Err(Violation::BadLayout {
            path: relative.to_string(),
        });
    }

    let allowed_suffixes = suffixes_for(datatype).ok_or_else(|| Violation::UnknownDatatype {
        datatype: datatype.to_string(),
    })?;

    check_extension(filename)?;

    let name = parse_name(filename)?;

    if name.subject() != subject_dir {
        return Err(Violation::SubjectMismatch {
            directory: subject_dir.to_string(),
            filename: name.subject(),
        });
    }

    match (session_dir, name.session()) {
        (Some(dir), Some(ses)) if dir.strip_prefix("ses-") == Some(ses) => {}
        (None, None) => {}
        (dir, ses) => {
            return Err(Violation::SessionMismatch {
                directory: dir.unwrap_or("").to_string(),
                filename: ses.map(|s| format!("ses-{}", s)).unwrap_or_default(),
            })
        }
    }

    check_entities(&name)?;

    if !allowed_suffixes.contains(&name.suffix()) {
        return Err(Violation::UnknownSuffix {
            suffix: name.suffix().to_string(),
            datatype: datatype.to_string(),
        });
    }

    Ok(())
}

fn check_subject_file(subject_dir: &str, filename: &str) -> Result<(), Violation> {
    let name = parse_name(filename)?;
    if name.subject() != subject_dir {
        return Err(Violation::SubjectMismatch {
            directory: subject_dir.to_string(),
            filename: name.subject(),
        });
    }
    check_entities(&name)
}

/// `true` when `relative` follows the grammar.
pub fn is_bids_path(relative: &str) -> bool {
    check_path(relative).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_files() {
        assert!(is_bids_path("/dataset_description.json"));
        assert!(is_bids_path("participants.tsv"));
        assert!(is_bids_path("/README"));
        assert!(is_bids_path("/T1w.json"));
        assert!(is_bids_path("/acq-sag_T2w.json"));
        assert!(!is_bids_path("/notes.txt"));
        assert!(!is_bids_path("/sub-01_T1w.json"));
        assert!(matches!(
            check_path("/notes.txt"),
            Err(Violation::UnknownTopLevelFile { .. })
        ));
    }

    #[test]
    fn test_valid_subject_files() {
        for path in [
            "/sub-amu01/anat/sub-amu01_T1w.nii.gz",
            "/sub-amu01/anat/sub-amu01_T1w.json",
            "/sub-amu01/anat/sub-amu01_acq-MTon_MTS.nii.gz",
            "/sub-amu01/anat/sub-amu01_T2star.nii.gz",
            "/sub-amu01/dwi/sub-amu01_dwi.nii.gz",
            "/sub-amu01/dwi/sub-amu01_dwi.bval",
            "/sub-amu01/dwi/sub-amu01_dwi.bvec",
            "/sub-01/ses-02/anat/sub-01_ses-02_run-1_T2w.nii.gz",
            "/sub-01/sub-01_scans.tsv",
            "/sub-01/func/sub-01_task-rest_events.tsv",
        ] {
            assert_eq!(check_path(path), Ok(()), "{}", path);
        }
    }

    #[test]
    fn test_subject_mismatch() {
        assert!(matches!(
            check_path("/sub-01/anat/sub-02_T1w.nii.gz"),
            Err(Violation::SubjectMismatch { .. })
        ));
    }

    #[test]
    fn test_session_mismatch() {
        assert!(matches!(
            check_path("/sub-01/ses-01/anat/sub-01_ses-02_T1w.nii.gz"),
            Err(Violation::SessionMismatch { .. })
        ));
        assert!(matches!(
            check_path("/sub-01/anat/sub-01_ses-02_T1w.nii.gz"),
            Err(Violation::SessionMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_suffix_and_datatype() {
        assert_eq!(
            check_path("/sub-01/anat/sub-01_T1w_RPI_r.nii.gz"),
            Err(Violation::UnknownSuffix {
                suffix: "T1w_RPI_r".to_string(),
                datatype: "anat".to_string()
            })
        );
        assert!(matches!(
            check_path("/sub-01/dwi/sub-01_T1w.nii.gz"),
            Err(Violation::UnknownSuffix { .. })
        ));
        assert!(matches!(
            check_path("/sub-01/misc/sub-01_T1w.nii.gz"),
            Err(Violation::UnknownDatatype { .. })
        ));
    }

    #[test]
    fn test_entity_rules() {
        assert!(matches!(
            check_path("/sub-01/anat/sub-01_run-1_acq-sag_T2w.nii.gz"),
            Err(Violation::EntityOrder { .. })
        ));
        assert!(matches!(
            check_path("/sub-01/anat/sub-01_foo-bar_T2w.nii.gz"),
            Err(Violation::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_compressed_tsv_suffix() {
        assert_eq!(check_path("/sub-01/func/sub-01_task-rest_physio.tsv.gz"), Ok(()));
        assert_eq!(check_path("/sub-01/func/sub-01_task-rest_physio.json"), Ok(()));
        assert_eq!(
            check_path("/sub-01/anat/sub-01_physio.tsv.gz"),
            Err(Violation::UnknownSuffix {
                suffix: "physio".to_string(),
                datatype: "anat".to_string()
            })
        );
    }

    #[test]
    fn test_repeated_entity() {
        assert_eq!(
            check_path("/sub-01/ses-01/anat/sub-01_ses-01_ses-02_T1w.nii.gz"),
            Err(Violation::EntityOrder {
                key: "ses".to_string()
            })
        );
        assert_eq!(
            check_path("/sub-01/anat/sub-01_run-1_run-2_T1w.nii.gz"),
            Err(Violation::EntityOrder {
                key: "run".to_string()
            })
        );
    }

    #[test]
    fn test_extensions() {
        assert_eq!(
            check_path("/sub-01/anat/sub-01_T1w.mgz"),
            Err(Violation::UnknownExtension {
                extension: ".mgz".to_string()
            })
        );
    }

    #[test]
    fn test_bad_layout() {
        assert!(matches!(
            check_path("/sub-01/sub-01_T1w.nii.gz"),
            Err(Violation::BadLayout { .. })
        ));
        assert!(matches!(
            check_path("/subject01/anat/sub-01_T1w.nii.gz"),
            Err(Violation::BadLayout { .. })
        ));
        assert!(matches!(
            check_path("/sub-01/anat/deep/sub-01_T1w.nii.gz"),
            Err(Violation::BadLayout { .. })
        ));
    }
}
