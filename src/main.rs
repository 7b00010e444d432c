// src/main.rs

use std::process::ExitCode;

use stagerun::cli;
use stagerun::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(e) = init_logging(args.log_level) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match stagerun::run(args).await {
        Ok(result) if result.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("stagerun: {e:#}");
            ExitCode::FAILURE
        }
    }
}
