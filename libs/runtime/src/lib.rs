//! Process bootstrap for services built on the query engine: layered
//! configuration, logging, and a ready-to-use DAO.

pub mod config;
pub mod logging;

pub use config::{AppConfig, FileSink, LoggingConfig};
pub use logging::init_logging;

use anyhow::{Context, Result};
use query_db::DynamicDao;
use sea_orm::DatabaseConnection;

/// Connects to the configured store and wraps the pool in a DAO that pages
/// with the configured limits.
pub async fn connect_dao(config: &AppConfig) -> Result<DynamicDao<DatabaseConnection>> {
    let conn = query_db::connect(&config.database)
        .await
        .with_context(|| format!("Failed to connect to {}", redact(&config.database.url)))?;
    Ok(DynamicDao::with_config(conn, config.query.clone()))
}

/// Hides the password part of a connection URL.
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };
    match rest.split_once('@') {
        Some((userinfo, host)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => url.to_owned(),
    }
}
