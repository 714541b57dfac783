mod cli;

use clap::Parser;
use cli::{Cli, Commands, GetArgs};
use std::sync::Arc;

use grabbox::config::Config;
use grabbox::extractor::YtDlpExtractor;
use grabbox::jobs::{DownloadRequest, DownloadService, JobStatus};
use grabbox::observability::{Metrics, init_tracing};
use grabbox::{api, watch};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.telemetry.log_filter);

    match cli.command {
        Commands::Server(args) => api::run(config, args.address).await?,
        Commands::Get(args) => download(config, args).await?,
    }

    Ok(())
}

async fn download(config: Config, args: GetArgs) -> Result<(), AnyError> {
    let extractor = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    let service = DownloadService::from_config(&config, extractor, Arc::new(Metrics::new()));

    let request = DownloadRequest {
        url: args.url,
        destination_dir: args.output,
        format: args.format,
    };
    let job = watch::follow(&service, request, |job| println!("{}", watch::format_line(job))).await?;

    match job.status {
        JobStatus::Completed => Ok(()),
        _ => Err(job
            .error_detail
            .unwrap_or_else(|| job.progress_text.clone())
            .into()),
    }
}
