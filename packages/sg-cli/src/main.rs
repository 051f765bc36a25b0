use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;

use cli::Cli;

/// Warnings (validator findings, parameter mismatches) show by default;
/// each `-v` adds a level down to per-file trace output.
fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose))
        .format_timestamp(None)
        .format_target(false)
        .init();
    log::debug!("sg {}", env!("CARGO_PKG_VERSION"));

    let exit_code = match cli.command {
        cli::Command::Parse(args) => commands::parse::execute(args),
        cli::Command::Info(args) => commands::info::execute(args),
        cli::Command::Validate(args) => commands::validate::execute(args),
        cli::Command::CheckConsistency(args) => commands::consistency::execute(args),
        cli::Command::CheckParams(args) => commands::params::execute(args),
        cli::Command::CopyToDerivatives(args) => commands::copy::execute(args),
        cli::Command::PopulateDerivatives(args) => commands::populate::execute(args),
        cli::Command::ManualCorrection(args) => commands::correction::execute(args).await,
        cli::Command::PackageForCorrection(args) => commands::package::execute(args),
        cli::Command::CurateDerivatives(args) => commands::curate::execute(args).await,
    };

    std::process::exit(exit_code);
}
