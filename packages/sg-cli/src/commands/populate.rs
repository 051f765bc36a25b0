use crate::cli::PopulateArgs;
use crate::exit_codes;
use sg_rs::derivatives::populate_derivatives;

pub fn execute(args: PopulateArgs) -> i32 {
    let report = match populate_derivatives(
        &args.path_in,
        &args.path_dataset,
        &args.folder,
        args.overwrite,
    ) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    for copied in &report.copied {
        let name = copied
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let dir = copied
            .destination
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("{} -> {}/", name, dir);
    }
    for skipped in &report.skipped {
        println!("Skipped (exists): {}", skipped.display());
    }

    if report.skipped.is_empty() {
        exit_codes::SUCCESS
    } else {
        exit_codes::PARTIAL_FAILURE
    }
}
