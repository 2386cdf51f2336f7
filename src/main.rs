//! sitesync: deploy a static site to S3 behind CloudFront.

mod aws;
mod cli;
mod create;
mod error;

use crate::aws::Clients;
use crate::cli::{Cli, Command, SyncArgs};
use crate::error::{ErrorKind, Result, escalate};
use clap::Parser;
use exn::ResultExt;
use sitesync_cdn::CdnHandle;
use sitesync_cdn::backend::CloudFront;
use sitesync_config::{Config, Loader};
use sitesync_engine::{SyncOptions, SyncReport, UploadSettings};
use sitesync_storage::StoreHandle;
use sitesync_storage::backend::S3Store;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CREDENTIALS_HELP: &str = "\
Access was denied, or no credentials were found.

Provide credentials in one of these ways:
  - set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY in the environment;
  - add a profile to ~/.aws/credentials and set `profile` in the configuration
    (or AWS_PROFILE);
  - set `credentials.key_id` and `credentials.key_secret` in the configuration.

The credentials need permission to list and put objects in the bucket, and to
list distributions and create invalidations on CloudFront.";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .or_raise(|| ErrorKind::Runtime)
        .and_then(|runtime| runtime.block_on(run(cli)));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_credentials() => {
            tracing::debug!(error = ?err, "Credential failure");
            eprintln!("{CREDENTIALS_HELP}");
            ExitCode::FAILURE
        },
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

/// `info` for sitesync crates, `warn` for everything else; each `-v` raises
/// sitesync's level one step. `RUST_LOG` replaces the whole filter.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("warn,sitesync={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut loader = Loader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let figment = cli.command.merge_overrides(loader.figment().or_raise(|| ErrorKind::Config)?);
    let config = Config::from_figment(&figment).or_raise(|| ErrorKind::Config)?;
    tracing::debug!(?config, "Loaded configuration");

    let clients = Clients::load(&config).await;
    match &cli.command {
        Command::Sync(args) => sync(&clients, &config, args).await,
        Command::Create(args) => create::create(&clients, &config.region, args).await,
    }
}

async fn sync(clients: &Clients, config: &Config, args: &SyncArgs) -> Result<()> {
    let mut options = SyncOptions::new(&args.path, &args.domain);
    options.upload = UploadSettings {
        policy: config.sync.compression.policy().or_raise(|| ErrorKind::Config)?,
        cache_control: config.sync.cache_control.clone(),
        acl: config.sync.acl().map(str::to_string),
        force: args.reupload,
    };
    options.concurrency = config.sync.concurrency;
    options.queue_capacity = config.sync.queue_capacity;
    options.dry_run = args.dry_run;

    let store: StoreHandle = Arc::new(S3Store::new(clients.s3.clone(), &args.domain));
    let cdn: CdnHandle = Arc::new(CloudFront::new(clients.cloudfront.clone()));
    let report = sitesync_engine::sync(store, cdn, &options).await.map_err(|err| {
        let credentials = err.is_credentials();
        escalate(err, credentials, ErrorKind::Sync)
    })?;
    print_summary(&report, args.dry_run);
    Ok(())
}

fn print_summary(report: &SyncReport, dry_run: bool) {
    let verb = if dry_run { "Would upload" } else { "Uploaded" };
    println!("{verb} {} file(s), {} unchanged, {} failed", report.changed.len(), report.unchanged, report.failed.len());
    for key in &report.failed {
        println!("Failed: {key}");
    }
    if let Some(receipt) = &report.invalidation {
        println!("Invalidation {} on distribution {}:", receipt.invalidation_id, receipt.distribution_id);
        for path in &receipt.paths {
            println!("  {path}");
        }
    }
}
