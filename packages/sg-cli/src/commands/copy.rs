use crate::cli::CopyArgs;
use crate::exit_codes;
use sg_rs::derivatives::copy_files_that_match_suffix;

pub fn execute(args: CopyArgs) -> i32 {
    let report = match copy_files_that_match_suffix(
        &args.path_in,
        &args.suffix,
        &args.path_out,
        &args.folder,
        args.suffix_out.as_deref(),
        args.overwrite,
    ) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    println!("Copied {} files", report.copied.len());
    if !report.skipped.is_empty() {
        println!(
            "Skipped {} existing files (use --overwrite to replace them)",
            report.skipped.len()
        );
        return exit_codes::PARTIAL_FAILURE;
    }
    exit_codes::SUCCESS
}
