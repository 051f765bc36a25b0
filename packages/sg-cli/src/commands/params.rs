use crate::cli::ParamsArgs;
use crate::exit_codes;
use crate::output;
use sg_rs::params::{check_params, load_specs};

pub fn execute(args: ParamsArgs) -> i32 {
    let specs = match load_specs(&args.specs) {
        Ok(specs) => specs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    let report = match check_params(&args.path_in, &specs) {
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
    } else {
        for line in report.log_lines() {
            println!("{}", line);
        }
        log::info!(
            "Checked {} images, warnings written to {}",
            report.images_checked,
            report.log_file.display()
        );
    }

    exit_codes::SUCCESS
}
