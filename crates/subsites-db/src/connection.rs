//! Connecting to the SurrealDB instance that holds pages and subsites.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{debug, info};

/// Where the subsite store lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB WebSocket endpoint.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "localhost:8000".into(),
            namespace: "subsites".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Read `SUBSITES_DB_{URL,NAMESPACE,DATABASE,USERNAME,PASSWORD}`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: lookup("SUBSITES_DB_URL").unwrap_or(defaults.url),
            namespace: lookup("SUBSITES_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: lookup("SUBSITES_DB_DATABASE").unwrap_or(defaults.database),
            username: lookup("SUBSITES_DB_USERNAME").unwrap_or(defaults.username),
            password: lookup("SUBSITES_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// A signed-in client bound to the configured namespace and database.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, surrealdb::Error> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening subsite store"
        );

        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        debug!(username = %config.username, "Signed in to SurrealDB");

        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        info!("Subsite store ready");
        Ok(Self { db })
    }

    /// The client handed to every `Surreal*Repository`.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_only_what_is_set() {
        let config = DbConfig::from_lookup(|key| match key {
            "SUBSITES_DB_URL" => Some("db.internal:8000".into()),
            "SUBSITES_DB_DATABASE" => Some("staging".into()),
            _ => None,
        });
        assert_eq!(config.url, "db.internal:8000");
        assert_eq!(config.database, "staging");
        assert_eq!(config.namespace, "subsites");
        assert_eq!(config.username, "root");
    }
}
