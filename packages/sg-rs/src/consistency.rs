//! Cross-checks between `participants.tsv` and the subject folders of a
//! dataset, plus the column rules of `participants.tsv`.

use crate::error::{Result, SgError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const PARTICIPANTS_FILE: &str = "participants.tsv";

/// Columns whose values must not start or end with whitespace.
const TRIMMED_COLUMNS: &[&str] = &[
    "participant_id",
    "institution_id",
    "institution",
    "manufacturer",
    "manufacturers_model_name",
    "receive_coil_name",
    "software_versions",
    "researcher",
];

const SEX_VALUES: &[&str] = &["M", "F"];

/// Accepted age range, upper bound exclusive.
pub const AGE_RANGE: std::ops::Range<f64> = 18.0..60.0;

/// A cell of `participants.tsv` that breaks a column rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaError {
    /// Zero-based data row; `None` for table-level problems.
    pub row: Option<usize>,
    pub column: String,
    pub value: Option<String>,
    pub message: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, &self.value) {
            (Some(row), Some(value)) => write!(
                f,
                "{{row: {}, column: \"{}\"}}: \"{}\" {}",
                row, self.column, value, self.message
            ),
            _ => write!(f, "The column \"{}\" {}", self.column, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    /// `sub*` folders with no row in `participants.tsv`.
    pub missing_from_tsv: Vec<String>,
    /// Participants with no folder.
    pub missing_folders: Vec<String>,
    /// Expected sidecar path of every image that has none.
    pub missing_sidecars: Vec<PathBuf>,
    pub schema_errors: Vec<SchemaError>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.missing_from_tsv.is_empty()
            && self.missing_folders.is_empty()
            && self.missing_sidecars.is_empty()
            && self.schema_errors.is_empty()
    }
}

/// Parsed `participants.tsv`: header plus raw rows.
#[derive(Debug, Clone)]
pub struct ParticipantsTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParticipantsTable {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;
        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(|v| v.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

fn subject_folders(root: &Path) -> Result<BTreeSet<String>> {
    let mut subjects = BTreeSet::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_dir() && name.starts_with("sub") {
            subjects.insert(name);
        }
    }
    Ok(subjects)
}

/// Sidecar an image is expected to have: the part of the filename before its
/// first `.`, plus `.json`, in the same directory.
pub fn expected_sidecar(image: &Path) -> PathBuf {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let base = name.split('.').next().unwrap_or("");
    image.with_file_name(format!("{}.json", base))
}

fn missing_sidecars(root: &Path) -> Result<Vec<PathBuf>> {
    let mut missing = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(".nii.gz") {
            let sidecar = expected_sidecar(entry.path());
            if !sidecar.exists() {
                missing.push(sidecar);
            }
        }
    }
    Ok(missing)
}

fn cell_error(row: usize, column: &str, value: &str, message: impl Into<String>) -> SchemaError {
    SchemaError {
        row: Some(row),
        column: column.to_string(),
        value: Some(value.to_string()),
        message: message.into(),
    }
}

fn is_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn contains_digit_or_dash(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit() || c == '-')
}

/// Apply the column rules to every row. Missing columns are reported once.
pub fn check_participants_schema(table: &ParticipantsTable) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    let column = |name: &str, errors: &mut Vec<SchemaError>| -> Option<Vec<String>> {
        match table.column(name) {
            Some(values) => Some(values.into_iter().map(str::to_string).collect()),
            None => {
                errors.push(SchemaError {
                    row: None,
                    column: name.to_string(),
                    value: None,
                    message: "does not exist in the table".to_string(),
                });
                None
            }
        }
    };

    for &name in TRIMMED_COLUMNS {
        if let Some(values) = column(name, &mut errors) {
            for (row, value) in values.iter().enumerate() {
                if value.starts_with(char::is_whitespace) {
                    errors.push(cell_error(row, name, value, "contains leading whitespace"));
                }
                if value.ends_with(char::is_whitespace) {
                    errors.push(cell_error(row, name, value, "contains trailing whitespace"));
                }
            }
        }
    }

    if let Some(values) = column("sex", &mut errors) {
        for (row, value) in values.iter().enumerate() {
            if !SEX_VALUES.contains(&value.as_str()) {
                errors.push(cell_error(
                    row,
                    "sex",
                    value,
                    format!("is not in the list of legal options ({})", SEX_VALUES.join(", ")),
                ));
            }
        }
    }

    if let Some(values) = column("age", &mut errors) {
        for (row, value) in values.iter().enumerate() {
            let in_range = value
                .trim()
                .parse::<f64>()
                .map(|age| AGE_RANGE.contains(&age))
                .unwrap_or(false);
            if !in_range {
                errors.push(cell_error(
                    row,
                    "age",
                    value,
                    format!(
                        "was not in the range [{}, {})",
                        AGE_RANGE.start, AGE_RANGE.end
                    ),
                ));
            }
        }
    }

    for name in ["height", "weight"] {
        if let Some(values) = column(name, &mut errors) {
            for (row, value) in values.iter().enumerate() {
                if !contains_digit_or_dash(value) {
                    errors.push(cell_error(
                        row,
                        name,
                        value,
                        "does not match the pattern \"[0-9]|-\"",
                    ));
                }
            }
        }
    }

    if let Some(values) = column("date_of_scan", &mut errors) {
        for (row, value) in values.iter().enumerate() {
            if !is_date(value) && !value.contains('-') {
                errors.push(cell_error(
                    row,
                    "date_of_scan",
                    value,
                    "does not match the date format string \"%Y-%m-%d\"",
                ));
            }
        }
    }

    errors
}

/// Run every consistency check on a dataset.
pub fn check_data_consistency<P: AsRef<Path>>(path_in: P) -> Result<ConsistencyReport> {
    let root = path_in.as_ref();
    if !root.is_dir() {
        return Err(SgError::DirectoryNotFound(root.to_path_buf()));
    }

    let table = ParticipantsTable::read(root.join(PARTICIPANTS_FILE))?;
    let participants: BTreeSet<String> = table
        .column("participant_id")
        .ok_or_else(|| {
            SgError::InvalidConfig(format!("{} has no participant_id column", PARTICIPANTS_FILE))
        })?
        .into_iter()
        .map(str::to_string)
        .collect();
    let folders = subject_folders(root)?;
    log::debug!(
        "{} participants listed, {} subject folders",
        participants.len(),
        folders.len()
    );

    Ok(ConsistencyReport {
        missing_from_tsv: folders.difference(&participants).cloned().collect(),
        missing_folders: participants.difference(&folders).cloned().collect(),
        missing_sidecars: missing_sidecars(root)?,
        schema_errors: check_participants_schema(&table),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "participant_id\tsex\tage\theight\tweight\tdate_of_scan\tinstitution_id\tinstitution\tmanufacturer\tmanufacturers_model_name\treceive_coil_name\tsoftware_versions\tresearcher";

    fn write_tsv(root: &Path, rows: &[&str]) {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        fs::write(root.join(PARTICIPANTS_FILE), content).unwrap();
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    const GOOD_ROW: &str = "sub-amu01\tM\t28\t175\t70\t2019-06-06\tamu\tAMU\tSiemens\tVerio\tHeadNeck\tsyngo\tJD";

    #[test]
    fn test_clean_dataset() {
        let tmp = tempfile::tempdir().unwrap();
        write_tsv(tmp.path(), &[GOOD_ROW]);
        touch(&tmp.path().join("sub-amu01/anat/sub-amu01_T1w.nii.gz"));
        touch(&tmp.path().join("sub-amu01/anat/sub-amu01_T1w.json"));

        let report = check_data_consistency(tmp.path()).unwrap();
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn test_subject_mismatch_and_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        write_tsv(
            tmp.path(),
            &[
                GOOD_ROW,
                "sub-beijing01\tF\t30\t160\t55\t-\tbeijing\tBeijing\tGE\tDiscovery\tHNS\t27\tXY",
            ],
        );
        touch(&tmp.path().join("sub-amu01/anat/sub-amu01_T1w.nii.gz"));
        touch(&tmp.path().join("sub-zzz02/dwi/sub-zzz02_dwi.nii.gz"));
        touch(&tmp.path().join("sub-zzz02/dwi/sub-zzz02_dwi.json"));

        let report = check_data_consistency(tmp.path()).unwrap();
        assert_eq!(report.missing_from_tsv, vec!["sub-zzz02"]);
        assert_eq!(report.missing_folders, vec!["sub-beijing01"]);
        assert_eq!(
            report.missing_sidecars,
            vec![tmp.path().join("sub-amu01/anat/sub-amu01_T1w.json")]
        );
        assert!(report.schema_errors.is_empty());
    }

    #[test]
    fn test_expected_sidecar_uses_first_dot() {
        assert_eq!(
            expected_sidecar(Path::new("d/sub-01_acq-0.8mm_T1w.nii.gz")),
            PathBuf::from("d/sub-01_acq-0.json")
        );
    }

    #[test]
    fn test_schema_errors() {
        let tmp = tempfile::tempdir().unwrap();
        write_tsv(
            tmp.path(),
            &[
                " sub-amu01\tX\t60\tn/a\t70\t06/06/2019\tamu\tAMU \tSiemens\tVerio\tHeadNeck\tsyngo\tJD",
                "sub-amu02\tF\t18\t-\t-\t-\tamu\tAMU\tSiemens\tVerio\tHeadNeck\tsyngo\tJD",
            ],
        );
        let table = ParticipantsTable::read(tmp.path().join(PARTICIPANTS_FILE)).unwrap();
        let errors = check_participants_schema(&table);
        let columns: Vec<&str> = errors.iter().map(|e| e.column.as_str()).collect();
        assert_eq!(
            columns,
            vec![
                "participant_id",
                "institution",
                "sex",
                "age",
                "height",
                "date_of_scan"
            ]
        );
        assert!(errors.iter().all(|e| e.row == Some(0)));
        assert_eq!(
            errors[2].to_string(),
            "{row: 0, column: \"sex\"}: \"X\" is not in the list of legal options (M, F)"
        );
    }

    #[test]
    fn test_missing_column() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(PARTICIPANTS_FILE),
            "participant_id\tsex\nsub-01\tM\n",
        )
        .unwrap();
        let table = ParticipantsTable::read(tmp.path().join(PARTICIPANTS_FILE)).unwrap();
        let errors = check_participants_schema(&table);
        assert!(errors
            .iter()
            .any(|e| e.column == "age" && e.row.is_none()));
        assert_eq!(
            errors
                .iter()
                .find(|e| e.column == "age")
                .unwrap()
                .to_string(),
            "The column \"age\" does not exist in the table"
        );
    }
}
