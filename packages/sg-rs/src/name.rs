//! Structured view of a BIDS filename.

use crate::bids::{get_contrast, Datatype};
use crate::error::{Result, SgError};
use crate::naming::split_extension;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A single `key-value` entity, e.g. `ses-02`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub key: String,
    pub value: String,
}

/// A filename split into entities, suffix and extension.
///
/// Entities are the leading run of `key-value` segments; the suffix is the
/// rest of the stem (it may itself contain `_`, e.g. `T2star_rms`). The last
/// segment always belongs to the suffix, so `seg-manual` in
/// `sub-01_seg-manual.nii.gz` is a suffix, not an entity.
///
/// `to_string()` reproduces the parsed input exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidsName {
    entities: Vec<Entity>,
    suffix: String,
    extension: String,
}

fn split_entity(segment: &str) -> Option<(&str, &str)> {
    let (key, value) = segment.split_once('-')?;
    let valid = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric());
    if valid(key) && valid(value) {
        Some((key, value))
    } else {
        None
    }
}

impl BidsName {
    /// Parse a bare filename. Anything before the last `/` is ignored.
    pub fn parse(filename: &str) -> Result<Self> {
        let name = filename.rsplit('/').next().unwrap_or(filename);
        let (stem, extension) = split_extension(name);
        let segments: Vec<&str> = stem.split('_').collect();

        if segments.len() < 2 {
            return Err(SgError::malformed(
                name,
                "expected 'sub-<label>_..._<suffix>'",
            ));
        }

        let mut entities = Vec::new();
        for segment in &segments[..segments.len() - 1] {
            match split_entity(segment) {
                Some((key, value)) => entities.push(Entity {
                    key: key.to_string(),
                    value: value.to_string(),
                }),
                None => break,
            }
        }

        match entities.first() {
            Some(first) if first.key == "sub" => {}
            _ => {
                return Err(SgError::malformed(
                    name,
                    "first segment must be 'sub-<label>'",
                ))
            }
        }

        let suffix = segments[entities.len()..].join("_");

        Ok(Self {
            entities,
            suffix,
            extension: extension.to_string(),
        })
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Value of an entity, e.g. `entity("ses") == Some("02")`.
    pub fn entity(&self, key: &str) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Subject directory name, including the `sub-` prefix.
    pub fn subject(&self) -> String {
        format!("sub-{}", self.entities[0].value)
    }

    pub fn session(&self) -> Option<&str> {
        self.entity("ses")
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Datatype folder, using the same rule as [`get_contrast`].
    pub fn datatype(&self) -> Datatype {
        // A parsed name always has at least two segments.
        get_contrast(&self.to_string()).unwrap_or(Datatype::Anat)
    }

    /// Append `extra` to the suffix, e.g. `_seg-manual`.
    pub fn with_suffix(&self, extra: &str) -> Self {
        let mut name = self.clone();
        name.suffix.push_str(extra);
        name
    }
}

impl fmt::Display for BidsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entity in &self.entities {
            write!(f, "{}-{}_", entity.key, entity.value)?;
        }
        write!(f, "{}{}", self.suffix, self.extension)
    }
}

impl FromStr for BidsName {
    type Err = SgError;

    fn from_str(s: &str) -> Result<Self> {
        BidsName::parse(s)
    }
}
