use sg_rs::SgError;

pub const SUCCESS: i32 = 0;
/// Bad arguments, unreadable names or configs, missing inputs.
pub const INPUT_ERROR: i32 = 1;
pub const EXECUTION_ERROR: i32 = 2;
/// FSLeyes or the Spinal Cord Toolbox is not installed.
pub const TOOL_NOT_FOUND: i32 = 3;
/// Some items were processed, others were skipped.
pub const PARTIAL_FAILURE: i32 = 4;

/// Exit code for a library error.
pub fn for_error(err: &SgError) -> i32 {
    match err {
        SgError::ToolNotFound(_) => TOOL_NOT_FOUND,
        SgError::MalformedName { .. }
        | SgError::MissingInputs(_)
        | SgError::InvalidConfig(_)
        | SgError::DirectoryNotFound(_)
        | SgError::YamlError(_)
        | SgError::PatternError(_) => INPUT_ERROR,
        _ => EXECUTION_ERROR,
    }
}
