use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::eyre;
use tracing_subscriber::EnvFilter;
use visitq_core::app::{App, AppBuilder, Submission};
use visitq_core::config;
use visitq_core::domain::{DeviceProfile, MessageRef, OwnerId, ProxyAttempt, ResolveError};
use visitq_core::impls::{
    DeviceCatalog, InMemoryStore, LogMessenger, OffloadedResolver, StaticOwnerDirectory,
};
use visitq_core::ports::{BlockingResolver, Clock, Resolution, SystemClock, UlidGenerator};

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
struct Args {
    #[arg(long, short = 'c', value_name = "FILE")]
    config: std::path::PathBuf,

    /// Submitting owner for `--submit`; defaults to the first configured owner.
    #[arg(long, value_name = "ID")]
    owner: Option<i64>,

    /// Chat message text to submit at startup. Repeatable.
    #[arg(long, value_name = "TEXT")]
    submit: Vec<String>,

    /// Exit once the queue is empty instead of waiting for Ctrl-C.
    #[arg(long)]
    drain: bool,
}

/// Records the visit without leaving the process.
struct DryRunResolver;

impl BlockingResolver for DryRunResolver {
    fn resolve_blocking(&self, url: &str, device: &DeviceProfile) -> Result<Resolution, ResolveError> {
        tracing::info!(url, device = device.id, platform = %device.platform, "dry-run visit");
        Ok(Resolution {
            initial_url: url.to_string(),
            final_url: url.to_string(),
            ip: None,
            isp: None,
            attempts: vec![ProxyAttempt::new(1, None, None)],
        })
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let cfg = config::load(&args.config)?;
    let filter = EnvFilter::new(cfg.service.log_level.clone());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let devices = DeviceCatalog::load(&cfg.devices.catalog)?;
    tracing::info!(devices = devices.len(), catalog = %cfg.devices.catalog.display(), "device catalog loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(InMemoryStore::new(
        Arc::new(UlidGenerator::new(Arc::clone(&clock))),
        Arc::clone(&clock),
    ));
    let directory = StaticOwnerDirectory::new(cfg.owners.iter().cloned());

    let app = AppBuilder::new()
        .store(store)
        .resolver(Arc::new(OffloadedResolver::new(DryRunResolver)))
        .messenger(Arc::new(LogMessenger))
        .directory(Arc::new(directory))
        .devices(devices)
        .clock(clock)
        .configure(&cfg)?
        .build()?;

    if !args.submit.is_empty() {
        let owner = args
            .owner
            .map(OwnerId)
            .or_else(|| cfg.owners.first().map(|owner| owner.id))
            .ok_or_else(|| eyre!("--submit needs --owner or an [[owners]] entry"))?;
        submit_all(&app, owner, &args.submit).await?;
    }

    if args.drain {
        drain(&app).await?;
    } else {
        let handle = Arc::clone(&app.scheduler).spawn();
        tokio::signal::ctrl_c().await?;
        tracing::info!("shutdown requested");
        handle.shutdown_and_join().await;
    }

    let counts = app.counts().await?;
    tracing::info!(pending = counts.pending, in_progress = counts.in_progress, "exiting");
    Ok(())
}

async fn submit_all(app: &App, owner: OwnerId, texts: &[String]) -> color_eyre::Result<()> {
    for (n, text) in texts.iter().enumerate() {
        let submission = app.intake.submit(owner, MessageRef(n as i64 + 1), text).await?;
        match &submission {
            Submission::Queued(item) => {
                tracing::info!(item = %item.id, url = %item.url, scheduled = ?item.scheduled_time, "queued")
            }
            Submission::Rejected(outcome) => tracing::warn!(%outcome, text = %text, "rejected"),
            Submission::Ignored => tracing::warn!(%owner, "owner is not configured"),
        }
    }
    Ok(())
}

/// Tick until nothing is open. Items scheduled for later keep this waiting.
async fn drain(app: &App) -> color_eyre::Result<()> {
    loop {
        app.scheduler.tick().await?.join().await;
        if app.counts().await?.total() == 0 {
            return Ok(());
        }
        tokio::time::sleep(app.scheduler.interval()).await;
    }
}
