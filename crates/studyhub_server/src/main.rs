//! StudyHub habit server entry point.

use std::process::ExitCode;
use studyhub_server::{run, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("studyhub-server: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Logging may not be up yet, so report on stderr as well.
            log::error!("event=server_exit module=server status=error error={err}");
            eprintln!("studyhub-server: {err}");
            ExitCode::FAILURE
        }
    }
}
