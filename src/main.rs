use clap::{Parser, Subcommand};
use gallery_sync::queue::{DryRunTransport, QueueDrainer, SpoolTransport, Transport, UploadQueue};
use gallery_sync::{config, output, photos, pipeline};
use std::path::PathBuf;

/// Shared flags for commands that run the index pipeline.
#[derive(clap::Args, Clone)]
struct IndexArgs {
    /// Photo document to ingest (JSON array of photo records)
    #[arg(long, default_value = "photos.json")]
    photos: PathBuf,

    /// Republish everything, bypassing the unchanged-content check
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
#[command(name = "gallery-sync")]
#[command(about = "Incremental site-index builder and uploader for photo galleries")]
#[command(long_about = "\
Incremental site-index builder and uploader for photo galleries

An exported photo document is the data source. Each record's URL-safe path
places it in the album tree, and its metadata feeds titles, keywords, GPS
locations, and navigation.

Pipeline:

  photos.json → gallery tree → virtual hierarchies → site index
              → diff against last snapshot → upload queue → remote

Virtual hierarchies:
  /albums/...      the real tree, one folder per path segment
  /keywords/a/...  every keyword, grouped by first letter
  /events/...      dated folders matching event rules (christmas, ...)

Only changes since the last run are uploaded. Changes are queued durably on
disk first, then delivered within a per-run quota; whatever doesn't fit
drains on the next run. Failed deliveries stay queued — nothing is dropped.

Run 'gallery-sync gen-config' to generate a documented gallery-sync.toml.")]
#[command(version = env!("SYNC_VERSION"))]
struct Cli {
    /// Config file
    #[arg(long, default_value = "gallery-sync.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: index, queue, and deliver changes
    Sync {
        #[command(flatten)]
        index: IndexArgs,

        /// Lift the per-run delivery quota
        #[arg(long)]
        no_quota: bool,
    },
    /// Build the index and queue changes without delivering
    Index(IndexArgs),
    /// Deliver whatever is already queued
    Drain {
        /// Lift the per-run delivery quota
        #[arg(long)]
        no_quota: bool,
    },
    /// Print a stock gallery-sync.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Sync { index, no_quota } => {
            let config = config::load_config(&cli.config)?;
            let records = photos::load_photos(&index.photos)?;
            let transport = make_transport(&config)?;
            let report = pipeline::run(
                &records,
                &config,
                transport.as_ref(),
                pipeline::RunOptions {
                    force: index.force,
                    no_quota,
                    drain: true,
                },
            )?;
            output::print_run_report(&report);
        }
        Command::Index(index) => {
            let config = config::load_config(&cli.config)?;
            let records = photos::load_photos(&index.photos)?;
            let transport = DryRunTransport;
            let report = pipeline::run(
                &records,
                &config,
                &transport,
                pipeline::RunOptions {
                    force: index.force,
                    no_quota: false,
                    drain: false,
                },
            )?;
            output::print_run_report(&report);
        }
        Command::Drain { no_quota } => {
            let config = config::load_config(&cli.config)?;
            let transport = make_transport(&config)?;
            let queue = UploadQueue::open(&config.queue_dir)?;
            let quota = if no_quota { None } else { config.sync.quota };
            let drainer = QueueDrainer::new(
                &queue,
                transport.as_ref(),
                quota,
                config.sync.retry_attempts,
            );
            let stats = drainer.drain()?;
            output::print_drain_report(&stats);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Transport from config: spool to disk when a spool directory is set,
/// otherwise log-only dry runs.
fn make_transport(
    config: &config::SyncConfig,
) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    match &config.sync.spool_dir {
        Some(dir) => Ok(Box::new(SpoolTransport::open(dir)?)),
        None => Ok(Box::new(DryRunTransport)),
    }
}

/// Log filtering defaults to info for this crate; `RUST_LOG` overrides.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gallery_sync=info")),
        )
        .with_target(false)
        .init();
}
