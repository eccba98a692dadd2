use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bulk_indexer::{Dependencies, Settings};
use bulk_indexer_pipeline::RunOutcome;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid settings");
            return ExitCode::FAILURE;
        }
    };

    let Dependencies { mut workgroup } = match Dependencies::new(&settings).await {
        Ok(dependencies) => dependencies,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return ExitCode::FAILURE;
        }
    };

    let stop = workgroup.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping bulk load");
            stop.request_stop();
        }
    });

    match workgroup.run().await {
        RunOutcome::Completed(stats) => {
            info!(
                indexed = stats.indexed,
                batches = stats.batches,
                elapsed_ms = stats.elapsed.as_millis() as u64,
                "Bulk load finished"
            );
            ExitCode::SUCCESS
        }
        RunOutcome::Cancelled(stats) => {
            warn!(indexed = stats.indexed, "Bulk load cancelled");
            ExitCode::from(130)
        }
        RunOutcome::Failed(e) => {
            error!(error = %e, "Bulk load failed");
            ExitCode::FAILURE
        }
    }
}
