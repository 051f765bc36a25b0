use crate::cli::PackageArgs;
use crate::exit_codes;
use sg_rs::package::package_for_correction;

pub fn execute(args: PackageArgs) -> i32 {
    match package_for_correction(&args.config, &args.path_in, &args.output) {
        Ok(report) => {
            println!(
                "Wrote {} files to {}",
                report.entries.len(),
                report.archive.display()
            );
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::for_error(&e)
        }
    }
}
