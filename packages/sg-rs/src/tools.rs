//! External programs the correction and curation workflows hand off to.

use crate::error::{Result, SgError};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::PathBuf;
use tokio::process::Command;

/// A third-party program invoked by the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Software {
    /// FSLeyes viewer, used to edit segmentations.
    Fsleyes,
    /// Spinal Cord Toolbox (`sct_*` commands).
    Sct,
}

pub const REQUIRED_SOFTWARE: &[Software] = &[Software::Fsleyes, Software::Sct];

impl Software {
    pub fn name(&self) -> &'static str {
        match self {
            Software::Fsleyes => "fsleyes",
            Software::Sct => "sct",
        }
    }

    /// Executable looked up on `PATH` to decide whether the package is installed.
    pub fn probe_command(&self) -> &'static str {
        match self {
            Software::Fsleyes => "fsleyes",
            Software::Sct => "sct_version",
        }
    }

    pub fn locate(&self) -> Option<PathBuf> {
        which::which(self.probe_command()).ok()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SoftwareStatus {
    pub software: Software,
    pub path: Option<String>,
    pub installed: bool,
}

pub fn software_status(software: &[Software]) -> Vec<SoftwareStatus> {
    software
        .iter()
        .map(|s| {
            let path = s.locate();
            SoftwareStatus {
                software: *s,
                installed: path.is_some(),
                path: path.map(|p| p.display().to_string()),
            }
        })
        .collect()
}

/// Fail with [`SgError::ToolNotFound`] listing every missing package.
pub fn check_software_installed(software: &[Software]) -> Result<()> {
    let mut missing: Vec<&str> = Vec::new();
    for status in software_status(software) {
        match status.path {
            Some(path) => log::info!("'{}' is installed ({}).", status.software.name(), path),
            None => missing.push(status.software.name()),
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        for name in &missing {
            log::error!("'{}' is not installed. Please install it before using this software.", name);
        }
        Err(SgError::ToolNotFound(missing.join(", ")))
    }
}

/// Run an external program to completion.
///
/// The toolkit has no way of knowing whether an interactive edit succeeded;
/// it only reports a missing executable or a non-zero exit.
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let executable =
        which::which(program).map_err(|_| SgError::ToolNotFound(program.to_string()))?;

    let mut command = Command::new(&executable);
    command.args(args);
    log::debug!("Executing: {:?}", command);

    let start_time = std::time::Instant::now();
    let status = command.status().await.map_err(|e| SgError::ToolFailed {
        tool: program.to_string(),
        status: format!("failed to start: {}", e),
    })?;
    log::debug!(
        "{} finished in {:.2}s",
        program,
        start_time.elapsed().as_secs_f64()
    );

    if !status.success() {
        return Err(SgError::ToolFailed {
            tool: program.to_string(),
            status: status.to_string(),
        });
    }
    Ok(())
}
