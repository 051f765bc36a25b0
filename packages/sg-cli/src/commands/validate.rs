use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use sg_rs::validate_dataset;

pub fn execute(args: ValidateArgs) -> i32 {
    let report = match validate_dataset(&args.path_in) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        if let Err(code) = output::emit_json(&report, args.compact, args.output.as_deref()) {
            return code;
        }
    } else {
        println!("Now checking: {}", report.dataset);
        for line in report.warning_lines() {
            println!("{}", line);
        }
        if report.is_clean() {
            println!("No problems found :)");
        }
    }

    // Warnings are a report, not a failure.
    exit_codes::SUCCESS
}
