pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod modules;

#[cfg(test)]
mod testing;

use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

/// 全局应用根目录
static ROOT_PATH: OnceCell<PathBuf> = OnceCell::new();

/// 应用配置
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 获取应用配置
pub fn get_config() -> Option<&'static AppConfig> {
    CONFIG.get()
}

/// 应用是否已初始化
pub fn is_initialized() -> bool {
    ROOT_PATH.get().is_some()
}

/// 初始化应用
pub async fn init_application(root: impl AsRef<Path>) -> anyhow::Result<()> {
    let root_path = root.as_ref().to_path_buf();
    let config = AppConfig::load(&root_path).await?;

    // 初始化日志（只初始化一次）
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .try_init();
    
    // 设置路径
    ROOT_PATH.set(root_path.clone()).map_err(|_| anyhow::anyhow!("Root path already set"))?;
    
    let db_dir = root_path.join("database");
    let modules_dir = root_path.join("modules");
    
    // 创建目录
    tokio::fs::create_dir_all(&db_dir).await?;
    tokio::fs::create_dir_all(&modules_dir).await?;
    
    // 初始化数据库
    let db = database::init_database(&db_dir, &config.database).await?;
    
    // 初始化模块管理
    api::module_api::init_module_repository(db, &modules_dir)?;
    
    CONFIG.set(config).map_err(|_| anyhow::anyhow!("Config already set"))?;
    
    tracing::info!("Application initialized at: {}", root_path.display());
    
    Ok(())
}
