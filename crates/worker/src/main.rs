use anyhow::Context;
use clap::{Parser, Subcommand};
use finboard_core::refresh::{RefreshReport, SnapshotCoordinator};
use finboard_core::storage::recovery::{FileSnapshotSink, SnapshotSink};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "finboard_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild the economic snapshot from upstream sources now, ignoring freshness.
    Refresh {
        /// Fetch and report per-source outcomes without writing to the store or cache.
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the currently served snapshot to a file usable as BACKUP_SNAPSHOT_PATH.
    ExportBackup {
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let pool = match &args.command {
        Command::Refresh { dry_run: true } => None,
        _ => Some(connect_db(&settings).await?),
    };
    let coordinator = finboard_core::refresh::setup::build_coordinator(&settings, pool).await?;

    match args.command {
        Command::Refresh { dry_run: true } => {
            let (_, report) = coordinator.preview_refresh().await;
            log_report(&report, true);
        }
        Command::Refresh { dry_run: false } => {
            let result = refresh(&coordinator).await;
            if let Err(err) = &result {
                sentry_anyhow::capture_anyhow(err);
                tracing::error!(error = %format!("{err:#}"), "economic snapshot refresh failed");
            }
            result?;
        }
        Command::ExportBackup { out } => {
            let snapshot = coordinator.fetch_snapshot().await;
            FileSnapshotSink::new(&out)
                .write_snapshot(&snapshot)
                .await
                .with_context(|| format!("export backup to {} failed", out.display()))?;
            tracing::info!(path = %out.display(), news = snapshot.news.len(), "backup snapshot exported");
        }
    }

    Ok(())
}

async fn refresh(coordinator: &SnapshotCoordinator) -> anyhow::Result<()> {
    let (_, report) = coordinator.force_refresh().await?;
    log_report(&report, false);
    Ok(())
}

fn log_report(report: &RefreshReport, dry_run: bool) {
    for (field, reason) in &report.substituted {
        tracing::warn!(%field, reason = %reason, dry_run, "field served from backup");
    }
    tracing::info!(
        dry_run,
        live = report.live.len(),
        substituted = report.substituted.len(),
        fully_live = report.is_fully_live(),
        "refresh report"
    );
}

async fn connect_db(settings: &finboard_core::config::Settings) -> anyhow::Result<sqlx::PgPool> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    finboard_core::storage::migrate(&pool).await?;
    Ok(pool)
}

fn init_sentry(settings: &finboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
