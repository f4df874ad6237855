use std::path::Path;
use sea_orm::{Database, DatabaseConnection, ConnectOptions};

use crate::config::DatabaseConfig;

pub async fn connect(db_path: &Path, config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    
    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout())
        .idle_timeout(config.idle_timeout())
        .sqlx_logging(config.sqlx_logging);
    
    let conn = Database::connect(opt).await?;
    
    tracing::info!("Database connected: {}", db_url);
    
    Ok(conn)
}
