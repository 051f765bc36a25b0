//! Report output and rater lookup shared by the subcommands.

use crate::exit_codes;
use std::io::{BufRead, Write};
use std::path::Path;

/// Write a JSON report to stdout, or to `output_path` when `-o` is given.
/// Missing parent directories of the output file are created.
fn write_output(json: &str, output_path: Option<&Path>) -> Result<(), String> {
    match output_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create directory '{}': {}", parent.display(), e)
                })?;
            }
            std::fs::write(path, format!("{}\n", json))
                .map_err(|e| format!("Failed to write report '{}': {}", path.display(), e))
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.map_err(|e| format!("JSON serialization failed: {}", e))
}

/// Print a `--json` report (pretty unless `--compact`) or save it with `-o`.
/// On failure the error is printed and `Err` carries the exit code.
pub fn emit_json<T: serde::Serialize>(
    value: &T,
    compact: bool,
    output_path: Option<&str>,
) -> Result<(), i32> {
    to_json(value, compact)
        .and_then(|json| write_output(&json, output_path.map(Path::new)))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            exit_codes::EXECUTION_ERROR
        })
}

/// Name written into the `Author` field of correction sidecars.
///
/// Taken from `--rater`/`$SG_RATER` first, then the config's `NAME`; blank
/// values are skipped. With neither, the rater is asked for on stderr.
pub fn resolve_rater(cli: Option<&str>, config: Option<&str>) -> Result<String, String> {
    if let Some(name) = [cli, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|n| !n.is_empty())
    {
        return Ok(name.to_string());
    }

    eprint!(
        "Enter your name (Firstname Lastname). It will be used to generate a json sidecar with each corrected file: "
    );
    std::io::stderr()
        .flush()
        .map_err(|e| format!("Failed to write prompt: {}", e))?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read rater name: {}", e))?;
    let name = line.trim();
    if name.is_empty() {
        Err("A rater name is required (use --rater or $SG_RATER)".to_string())
    } else {
        Ok(name.to_string())
    }
}
