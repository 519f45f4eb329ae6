// src/main.rs

use std::error::Error;
use std::process::ExitCode;

use console::style;

use assetdag::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("{} {err:#}", style("assetdag:").red().bold());
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", style("assetdag:").red().bold());
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
