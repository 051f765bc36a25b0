use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SgError {
    #[error("Malformed BIDS name '{name}': {reason}")]
    MalformedName { name: String, reason: String },

    #[error("External tool not installed: {0}")]
    ToolNotFound(String),

    #[error("External tool '{tool}' failed: {status}")]
    ToolFailed { tool: String, status: String },

    #[error("Output already exists, skipping: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("Missing input files: {}", format_paths(.0))]
    MissingInputs(Vec<PathBuf>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Directory walk failed: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(#[from] glob::PatternError),
}

impl SgError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        SgError::MalformedName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, SgError>;
