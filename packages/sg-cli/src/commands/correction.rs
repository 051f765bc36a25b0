use crate::cli::ManualCorrectionArgs;
use crate::exit_codes;
use crate::output;
use sg_rs::correction::{check_files_exist, plan, run_job, CorrectionConfig, CorrectionJob};
use sg_rs::derivatives::{check_output_folder, FOLDER_DERIVATIVES};
use sg_rs::tools::{check_software_installed, REQUIRED_SOFTWARE};
use sg_rs::SgError;
use std::path::Path;

fn print_plan(jobs: &[CorrectionJob]) {
    for job in jobs {
        let (program, args) = job.viewer_command();
        println!("[{}] {}", job.task.key(), job.file);
        if let Some(ref source) = job.source {
            println!("  copy {} -> {}", source.display(), job.output.display());
        }
        println!("  {} {}", program, args.join(" "));
    }
}

pub async fn execute(args: ManualCorrectionArgs) -> i32 {
    let config = match CorrectionConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    let path_deriv = Path::new(&args.path_out).join(FOLDER_DERIVATIVES);
    let jobs = match plan(&config, &args.path_in, &path_deriv) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if let Err(e) = check_files_exist(&jobs) {
        eprintln!("Error: {}", e);
        return exit_codes::for_error(&e);
    }

    if args.dry_run {
        if args.json {
            if let Err(code) = output::emit_json(&jobs, false, None) {
                return code;
            }
        } else {
            print_plan(&jobs);
        }
        return exit_codes::SUCCESS;
    }

    if let Err(e) = check_software_installed(REQUIRED_SOFTWARE) {
        eprintln!("Error: {}", e);
        return exit_codes::for_error(&e);
    }

    if let Err(e) = check_output_folder(&args.path_out, FOLDER_DERIVATIVES) {
        eprintln!("Error: {}", e);
        return exit_codes::for_error(&e);
    }

    let rater = match output::resolve_rater(args.rater.as_deref(), config.rater.as_deref()) {
        Ok(name) => name,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let mut failed = 0;
    for (i, job) in jobs.iter().enumerate() {
        log::info!("[{}/{}] {} {}", i + 1, jobs.len(), job.task.key(), job.file);
        match run_job(job, &rater, args.overwrite).await {
            Ok(()) => {}
            Err(e @ SgError::ToolNotFound(_)) => {
                eprintln!("Error: {}", e);
                return exit_codes::TOOL_NOT_FOUND;
            }
            Err(e) => {
                eprintln!("Error: {}: {}", job.file, e);
                failed += 1;
            }
        }
    }

    if failed == 0 {
        exit_codes::SUCCESS
    } else if failed < jobs.len() {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}
