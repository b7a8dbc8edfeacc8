//! Subsites server: connects to SurrealDB, applies migrations and
//! re-syncs cross-subsite link tracking for every page.

use std::process::ExitCode;

use subsites_cms::{LinkTracker, SubsitesConfig};
use subsites_core::repository::PageRepository;
use subsites_core::{PageQuery, SubsitesResult, TenantContext};
use subsites_db::repository::{
    SurrealCrossLinkRepository, SurrealPageRepository, SurrealSubsiteRepository,
};
use subsites_db::{DbConfig, DbError, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting subsites server...");

    match run().await {
        Ok(()) => {
            tracing::info!("Subsites server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Subsites server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SubsitesResult<()> {
    let db_config = DbConfig::from_env();
    let manager = DbManager::connect(&db_config)
        .await
        .map_err(DbError::from)?;
    let db = manager.client().clone();

    subsites_db::run_migrations(&db).await?;

    let config = SubsitesConfig::default();
    let pages = SurrealPageRepository::new(db.clone());
    let tracker = LinkTracker::new(
        SurrealPageRepository::new(db.clone()),
        SurrealCrossLinkRepository::new(db.clone()),
        SurrealSubsiteRepository::new(db),
        &config,
    );

    let mut ctx = TenantContext::new();
    let all_pages = pages
        .select(&PageQuery::draft().without_subsite_filter())
        .await?;

    let mut broken = 0usize;
    for mut page in all_pages {
        let report = tracker.sync_links(&mut ctx, &mut page).await?;
        if report.has_broken_link() {
            broken += 1;
        }
    }

    tracing::info!(pages_with_broken_links = broken, "Link tracking refreshed");
    Ok(())
}
