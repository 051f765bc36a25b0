use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;
use serde::Serialize;
use sg_rs::tools::{software_status, SoftwareStatus, REQUIRED_SOFTWARE};

#[derive(Serialize)]
struct InfoOutput {
    cli_version: String,
    platform: String,
    arch: String,
    software: Vec<SoftwareStatus>,
}

pub fn execute(args: InfoArgs) -> i32 {
    let info = InfoOutput {
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        software: software_status(REQUIRED_SOFTWARE),
    };

    if args.json {
        if let Err(code) = output::emit_json(&info, false, None) {
            return code;
        }
    } else {
        println!("sg CLI v{}", info.cli_version);
        println!("Platform: {} ({})", info.platform, info.arch);
        println!();
        for status in &info.software {
            match status.path {
                Some(ref path) => println!("{}: {}", status.software.name(), path),
                None => println!(
                    "{}: not found ({} is not on PATH)",
                    status.software.name(),
                    status.software.probe_command()
                ),
            }
        }
    }

    exit_codes::SUCCESS
}
