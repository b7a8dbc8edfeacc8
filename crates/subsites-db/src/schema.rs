//! The subsite store's tables and the versioned migrations creating them.
//!
//! Every table is SCHEMAFULL. UUIDs are stored as strings; the main site
//! is the nil UUID and has no `subsite` record.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Subsites and their domains
-- =======================================================================
DEFINE TABLE subsite SCHEMAFULL;
DEFINE FIELD title ON TABLE subsite TYPE string;
DEFINE FIELD is_default ON TABLE subsite TYPE bool DEFAULT false;
DEFINE FIELD theme ON TABLE subsite TYPE option<string>;
DEFINE FIELD page_type_blacklist ON TABLE subsite TYPE array<string> \
    DEFAULT [];
DEFINE FIELD created_at ON TABLE subsite TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE subsite TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE subsite_domain SCHEMAFULL;
DEFINE FIELD subsite_id ON TABLE subsite_domain TYPE string;
DEFINE FIELD domain ON TABLE subsite_domain TYPE string;
DEFINE FIELD is_primary ON TABLE subsite_domain TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE subsite_domain TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subsite_domain ON TABLE subsite_domain \
    COLUMNS subsite_id, domain UNIQUE;

-- =======================================================================
-- Pages, draft stage (subsite scope)
-- =======================================================================
DEFINE TABLE page SCHEMAFULL;
DEFINE FIELD page_type ON TABLE page TYPE string;
DEFINE FIELD parent_id ON TABLE page TYPE option<string>;
DEFINE FIELD subsite_id ON TABLE page TYPE string;
DEFINE FIELD title ON TABLE page TYPE string;
DEFINE FIELD url_segment ON TABLE page TYPE string;
DEFINE FIELD content ON TABLE page TYPE string DEFAULT '';
DEFINE FIELD has_broken_link ON TABLE page TYPE bool DEFAULT false;
DEFINE FIELD needs_publication_check ON TABLE page TYPE bool \
    DEFAULT false;
DEFINE FIELD master_page_id ON TABLE page TYPE option<string>;
DEFINE FIELD created_at ON TABLE page TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE page TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_page_subsite_segment ON TABLE page \
    COLUMNS subsite_id, url_segment;

-- =======================================================================
-- Pages, live stage (subsite scope, same record ids as draft)
-- =======================================================================
DEFINE TABLE page_live SCHEMAFULL;
DEFINE FIELD page_type ON TABLE page_live TYPE string;
DEFINE FIELD parent_id ON TABLE page_live TYPE option<string>;
DEFINE FIELD subsite_id ON TABLE page_live TYPE string;
DEFINE FIELD title ON TABLE page_live TYPE string;
DEFINE FIELD url_segment ON TABLE page_live TYPE string;
DEFINE FIELD content ON TABLE page_live TYPE string DEFAULT '';
DEFINE FIELD has_broken_link ON TABLE page_live TYPE bool DEFAULT false;
DEFINE FIELD needs_publication_check ON TABLE page_live TYPE bool \
    DEFAULT false;
DEFINE FIELD master_page_id ON TABLE page_live TYPE option<string>;
DEFINE FIELD created_at ON TABLE page_live TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE page_live TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_page_live_subsite_segment ON TABLE page_live \
    COLUMNS subsite_id, url_segment;

-- =======================================================================
-- Site configuration (one per subsite)
-- =======================================================================
DEFINE TABLE site_config SCHEMAFULL;
DEFINE FIELD subsite_id ON TABLE site_config TYPE string;
DEFINE FIELD title ON TABLE site_config TYPE string;
DEFINE FIELD tagline ON TABLE site_config TYPE string;
DEFINE FIELD created_at ON TABLE site_config TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE site_config TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_site_config_subsite ON TABLE site_config \
    COLUMNS subsite_id UNIQUE;

-- =======================================================================
-- Page-owned related records
-- =======================================================================
DEFINE TABLE related_record SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE related_record TYPE string;
DEFINE FIELD relation ON TABLE related_record TYPE string;
DEFINE FIELD data ON TABLE related_record TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE related_record TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_related_owner ON TABLE related_record \
    COLUMNS owner_id, relation;

-- =======================================================================
-- Subsite access grants (member -> subsite, per capability)
-- =======================================================================
DEFINE TABLE subsite_grant SCHEMAFULL;
DEFINE FIELD member_id ON TABLE subsite_grant TYPE string;
DEFINE FIELD subsite_id ON TABLE subsite_grant TYPE string;
DEFINE FIELD capability ON TABLE subsite_grant TYPE string;
DEFINE FIELD created_at ON TABLE subsite_grant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subsite_grant ON TABLE subsite_grant \
    COLUMNS member_id, subsite_id, capability UNIQUE;

-- =======================================================================
-- Page -> page links found in content (graph edge)
-- =======================================================================
DEFINE TABLE cross_subsite_link TYPE RELATION SCHEMAFULL;
DEFINE FIELD field_name ON TABLE cross_subsite_link TYPE string;
";

/// Bring the schema up to date.
///
/// Versions already recorded in `_migration` are skipped, so running this
/// on every start is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("cannot create _migration: {e}")))?;

    let applied = applied_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        debug!(version = applied, "Schema is current");
        return Ok(());
    }

    for migration in pending {
        info!(
            version = migration.version,
            name = migration.name,
            "Migrating subsite schema"
        );

        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!("v{} ({}): {e}", migration.version, migration.name))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!("v{} applied but not recorded: {e}", migration.version))
            })?;
    }

    let latest = MIGRATIONS.last().map_or(0, |m| m.version);
    info!(version = latest, "Subsite schema migrated");
    Ok(())
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.into_iter().next().map_or(0, |m| m.version))
}

/// DDL of the first schema version.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_page_stages_are_defined() {
        assert!(SCHEMA_V1.contains("DEFINE TABLE page SCHEMAFULL"));
        assert!(SCHEMA_V1.contains("DEFINE TABLE page_live SCHEMAFULL"));
    }

    #[test]
    fn versions_strictly_increase() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
        assert_eq!(MIGRATIONS.first().map(|m| m.version), Some(1));
    }
}
