//! Subject and datatype resolution from BIDS filenames.

use crate::error::{Result, SgError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// BIDS datatype folder a file is routed to.
///
/// Only anatomical and diffusion data exist in spine-generic datasets, so the
/// classification is two-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    Anat,
    Dwi,
}

impl Datatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Anat => "anat",
            Datatype::Dwi => "dwi",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return the subject token of a filename, e.g. `sub-amu01`.
///
/// This is the first `_`-delimited segment, returned verbatim. It is not
/// checked for a `sub-` prefix.
pub fn get_subject(filename: &str) -> Result<&str> {
    match filename.split_once('_') {
        Some((subject, _)) => Ok(subject),
        None => Err(SgError::malformed(
            filename,
            "no '_'-delimited subject token",
        )),
    }
}

/// Return the datatype of a filename from its second `_`-delimited segment.
///
/// `Dwi` if that segment is exactly `dwi`, `Anat` otherwise.
pub fn get_contrast(filename: &str) -> Result<Datatype> {
    match filename.split('_').nth(1) {
        Some("dwi") => Ok(Datatype::Dwi),
        Some(_) => Ok(Datatype::Anat),
        None => Err(SgError::malformed(
            filename,
            "index out of range: no second '_'-delimited segment",
        )),
    }
}

/// Return the datatype of a filename by looking for a `dwi` segment anywhere
/// in it. Used when curating derivatives, where the datatype token is not
/// always second (e.g. `sub-01_rec-average_dwi_seg-manual.nii.gz`).
///
/// The extension is not stripped first, so a trailing `dwi.nii.gz` segment
/// does not count. Existing derivative trees rely on this.
pub fn infer_datatype(filename: &str) -> Datatype {
    if filename.split('_').any(|segment| segment == "dwi") {
        Datatype::Dwi
    } else {
        Datatype::Anat
    }
}
