//! Extension-aware filename helpers used to derive companion and derivative
//! filenames (segmentations, manual corrections, QC outputs).
//!
//! These operate on strings, not on `Path`s: the tree builders pass both
//! bare filenames and relative paths, and the result must round-trip exactly.

/// Extensions made of two dot-separated parts that must never be split.
pub const COMPOUND_EXTENSIONS: &[&str] = &[".nii.gz", ".tar.gz"];

/// Split a filename (or path) into `(stem, extension)`.
///
/// `.nii.gz` and `.tar.gz` are kept whole; anything else is split once on the
/// last `.` of the final path component. Leading dots of a dotfile are not an
/// extension, and a name without a dot has an empty extension.
///
/// `stem + extension` always equals the input.
///
/// # Examples
/// ```
/// use sg_rs::naming::split_extension;
/// assert_eq!(split_extension("sub-01_T2star_rms.nii.gz"), ("sub-01_T2star_rms", ".nii.gz"));
/// assert_eq!(split_extension("sub-01_T1w.json"), ("sub-01_T1w", ".json"));
/// ```
pub fn split_extension(filename: &str) -> (&str, &str) {
    let name_start = filename
        .rfind(|c| c == '/' || c == std::path::MAIN_SEPARATOR)
        .map(|i| i + 1)
        .unwrap_or(0);
    let name = &filename[name_start..];

    for ext in COMPOUND_EXTENSIONS {
        if name.ends_with(ext) {
            return filename.split_at(filename.len() - ext.len());
        }
    }

    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(dot) => filename.split_at(name_start + leading_dots + dot),
        None => (filename, ""),
    }
}

/// Insert `suffix` right before the extension.
///
/// The suffix is inserted literally: `add_suffix("t2.nii", "_mean")` gives
/// `t2_mean.nii` but `add_suffix("t2.nii", "mean")` gives `t2mean.nii`.
pub fn add_suffix(filename: &str, suffix: &str) -> String {
    let (stem, ext) = split_extension(filename);
    format!("{}{}{}", stem, suffix, ext)
}

/// Remove every occurrence of `suffix` from the stem, keeping the extension.
///
/// This is a plain substring removal, not anchored to the end of the stem:
/// `remove_suffix("sub-01_T1w_RPI_r_RPI_r.nii.gz", "_RPI_r")` yields
/// `sub-01_T1w.nii.gz`. Existing derivative trees were named with this rule.
pub fn remove_suffix(filename: &str, suffix: &str) -> String {
    let (stem, ext) = split_extension(filename);
    if suffix.is_empty() {
        return filename.to_string();
    }
    format!("{}{}", stem.replace(suffix, ""), ext)
}

/// Path of the JSON sidecar for an image: same stem, `.json` extension.
pub fn sidecar_name(filename: &str) -> String {
    let (stem, _) = split_extension(filename);
    format!("{}.json", stem)
}
