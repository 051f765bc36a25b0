use crate::cli::CurateArgs;
use crate::exit_codes;
use crate::output;
use sg_rs::curate::curate_derivatives;
use std::path::Path;

pub async fn execute(args: CurateArgs) -> i32 {
    if !Path::new(&args.path_in).is_dir() {
        eprintln!("Error: Directory not found: {}", args.path_in);
        return exit_codes::INPUT_ERROR;
    }

    let rater = match output::resolve_rater(args.rater.as_deref(), None) {
        Ok(name) => name,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    match curate_derivatives(&args.path_in, &args.path_out, &rater).await {
        Ok(report) => {
            for file in &report.curated {
                println!("{} -> {}", file.source.display(), file.destination.display());
            }
            println!(
                "Curated {} files, list written to {}",
                report.curated.len(),
                report.list_file.display()
            );
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::for_error(&e)
        }
    }
}
