pub mod connection;
pub mod entities;
pub mod migration;

use std::path::Path;
use sea_orm::DatabaseConnection;
use once_cell::sync::OnceCell;

use crate::config::DatabaseConfig;

static DATABASE: OnceCell<DatabaseConnection> = OnceCell::new();

/// 打开数据库并运行迁移
pub async fn open(db_path: &Path, config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let conn = connection::connect(db_path, config).await?;
    
    // 运行迁移
    migration::run_migrations(&conn).await?;
    
    Ok(conn)
}

pub async fn init_database(db_dir: &Path, config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let db_path = db_dir.join(&config.file_name);
    let conn = open(&db_path, config).await?;
    
    DATABASE.set(conn.clone())
        .map_err(|_| anyhow::anyhow!("Database already initialized"))?;
    
    tracing::info!("Database initialized at: {:?}", db_path);
    
    Ok(conn)
}

pub fn get_database() -> Option<&'static DatabaseConnection> {
    DATABASE.get()
}
