// src/main.rs

use std::process::ExitCode;

use changetar::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("changetar: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Debug formatting keeps the full context chain.
            eprintln!("changetar error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
