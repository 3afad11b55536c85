use std::process::ExitCode;

use clap::Parser;
use whatstack::cli::{self, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_logging(args.verbose);

    let result = match args.into_config() {
        Ok(config) => cli::run(config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("{:?}", err);
            eprintln!("❌ {:#}", err);
            ExitCode::FAILURE
        }
    }
}
