#![feature(error_generic_member_access)]

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use sync::SyncReport;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

mod coordinate;
mod dal;
mod model;
mod statistics;
mod sync;

/// Fetches every stop from the Ayna transport API and replaces the contents
/// of the ayna.stops table with the fresh snapshot.
#[derive(Parser, Debug)]
struct Args {
    /// Stops endpoint to fetch from
    #[arg(long, default_value = "https://map-api.ayna.gov.az/api/stop/getAll")]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    _ = dotenv();
    let args = Args::parse();

    let _guard = init_tracing();

    match run(args).await {
        Ok(report) => {
            info!(
                "sync finished: fetched {} stops, persisted {}, table holds {}, took {:.2?}",
                report.fetched, report.persisted, report.total_in_table, report.elapsed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<SyncReport> {
    let db_url =
        env::var("DATABASE_URL").context("DATABASE_URL is not set, check your .env file")?;

    let pool = sqlx::PgPool::connect(&db_url)
        .await
        .context("error connecting to the database")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()
        .context("error building the http client")?;

    let report = sync::sync_stops(&pool, &client, &args.endpoint).await?;

    Ok(report)
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let appender = tracing_appender::rolling::daily("./logs", "ayna_stops_sync.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);

    // A layer that logs events to rolling files.
    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false)
        .pretty();

    Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(file_log)
        .with(env_filter)
        .init();

    guard
}
