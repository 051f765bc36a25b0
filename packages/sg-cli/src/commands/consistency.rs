use crate::cli::ConsistencyArgs;
use crate::exit_codes;
use crate::output;
use sg_rs::consistency::check_data_consistency;

pub fn execute(args: ConsistencyArgs) -> i32 {
    let report = match check_data_consistency(&args.path_in) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        if let Err(code) = output::emit_json(&report, false, None) {
            return code;
        }
        return exit_codes::SUCCESS;
    }

    if !report.missing_from_tsv.is_empty() {
        println!("\nWarning missing following subjects from participants.tsv:");
        for subject in &report.missing_from_tsv {
            println!("  {}", subject);
        }
    }
    if !report.missing_folders.is_empty() {
        println!("\nWarning missing data for subjects listed in participants.tsv:");
        for subject in &report.missing_folders {
            println!("  {}", subject);
        }
    }
    for sidecar in &report.missing_sidecars {
        println!("Missing jsonSidecar: {}", sidecar.display());
    }

    println!("\nChecking the contents of participants.tsv");
    for error in &report.schema_errors {
        println!("{}", error);
    }
    if report.is_clean() {
        println!("No problems found :)");
    }

    exit_codes::SUCCESS
}
