use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::DaoResult;

/// Opens a pooled connection for `cfg`.
///
/// An in-memory SQLite database lives and dies with its connection, so the
/// pool is pinned to a single connection for `:memory:` URLs.
pub async fn connect(cfg: &DatabaseConfig) -> DaoResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(cfg.url.clone());
    cfg.pool.apply(&mut opts);
    if is_sqlite_memory(&cfg.url) {
        debug!("pinning in-memory sqlite pool to one connection");
        opts.max_connections(1).min_connections(1);
    }
    opts.sqlx_logging(cfg.sql_logging);

    let conn = Database::connect(opts).await?;
    info!(backend = ?conn.get_database_backend(), "database connected");
    Ok(conn)
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}
