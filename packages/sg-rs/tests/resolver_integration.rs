use sg_rs::derivatives::{copy_files_that_match_suffix, derivative_path, FOLDER_DERIVATIVES};
use sg_rs::{
    add_suffix, get_contrast, get_subject, remove_suffix, split_extension, BidsName, Datatype,
    SgError,
};
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// RESOLVER
// =============================================================================

#[test]
fn test_split_extension_concatenates_back() {
    for name in [
        "sub-01_T1w.nii.gz",
        "archive.tar.gz",
        "sub-01_T1w.json",
        "sub-01_T1w.nii",
        "participants.tsv",
        "README",
        ".bidsignore",
    ] {
        let (stem, ext) = split_extension(name);
        assert_eq!(format!("{}{}", stem, ext), name);
    }
    assert_eq!(split_extension("t2.nii.gz"), ("t2", ".nii.gz"));
    assert_eq!(split_extension("data.tar.gz"), ("data", ".tar.gz"));
}

#[test]
fn test_add_then_remove_restores_name() {
    for name in ["sub-01_T2w.nii.gz", "t2.nii", "sub-01_dwi.bval"] {
        assert_eq!(remove_suffix(&add_suffix(name, "_mean"), "_mean"), name);
    }
    assert_eq!(add_suffix("t2.nii.gz", "_mean"), "t2_mean.nii.gz");
    assert_eq!(add_suffix("t2.nii", "_mean"), "t2_mean.nii");
    assert_eq!(
        remove_suffix("sub-01_T1w_RPI_r_RPI_r.nii.gz", "_RPI_r"),
        "sub-01_T1w.nii.gz"
    );
}

#[test]
fn test_subject_and_contrast() {
    assert_eq!(get_subject("sub-amu01_T1w_RPI_r.nii.gz").unwrap(), "sub-amu01");
    assert_eq!(
        get_contrast("sub-cardiff02_dwi_moco_dwi_mean.nii.gz").unwrap(),
        Datatype::Dwi
    );
    assert_eq!(get_contrast("sub-amu01_T2star_rms.nii.gz").unwrap(), Datatype::Anat);
    assert!(matches!(
        get_contrast("sub-amu01.nii.gz"),
        Err(SgError::MalformedName { .. })
    ));
}

#[test]
fn test_bids_name_round_trip() {
    for name in [
        "sub-amu01_T1w.nii.gz",
        "sub-amu01_ses-02_acq-sag_run-1_T2w.json",
        "sub-amu01_T2star_rms_gmseg-manual.nii.gz",
        "sub-cardiff02_rec-average_dwi_seg-manual.nii.gz",
        "sub-01_labels-manual.nii.gz",
    ] {
        let parsed: BidsName = name.parse().unwrap();
        assert_eq!(parsed.to_string(), name);
        assert_eq!(parsed.subject(), get_subject(name).unwrap());
    }
}

#[test]
fn test_end_to_end_derivative_path() {
    let root = Path::new("ds").join(FOLDER_DERIVATIVES);
    assert_eq!(
        derivative_path(&root, "sub-amu01_T2star_rms.nii.gz", "_gmseg-manual").unwrap(),
        PathBuf::from("ds/derivatives/labels/sub-amu01/anat/sub-amu01_T2star_rms_gmseg-manual.nii.gz")
    );
}

// =============================================================================
// DERIVATIVE TREE
// =============================================================================

#[test]
fn test_copy_tree_routes_by_subject_and_datatype() {
    let data = tempfile::tempdir().unwrap();
    let dataset = tempfile::tempdir().unwrap();
    for rel in [
        "sub-amu01/anat/sub-amu01_T2w_RPI_r_seg.nii.gz",
        "sub-amu01/dwi/sub-amu01_dwi_moco_dwi_mean_seg.nii.gz",
        "sub-beijing01/anat/sub-beijing01_T2w_RPI_r_seg.nii.gz",
        "sub-beijing01/anat/sub-beijing01_T2w_RPI_r.nii.gz",
    ] {
        let path = data.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    let report = copy_files_that_match_suffix(
        data.path(),
        "_seg",
        dataset.path(),
        FOLDER_DERIVATIVES,
        Some("-manual"),
        false,
    )
    .unwrap();
    assert_eq!(report.copied.len(), 3);

    let labels = dataset.path().join(FOLDER_DERIVATIVES);
    assert!(labels
        .join("sub-amu01/dwi/sub-amu01_dwi_moco_dwi_mean_seg-manual.nii.gz")
        .is_file());
    assert!(labels
        .join("sub-beijing01/anat/sub-beijing01_T2w_RPI_r_seg-manual.nii.gz")
        .is_file());
}
