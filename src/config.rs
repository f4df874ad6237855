use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 应用配置
///
/// 从根目录下的 `config.json` 读取，缺失的字段使用默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// tracing 过滤规则，例如 `info` 或 `site_modules=debug`
    pub log_filter: String,
    pub database: DatabaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            database: DatabaseConfig::default(),
        }
    }
}

impl AppConfig {
    pub const FILE_NAME: &'static str = "config.json";

    /// 加载配置，文件不存在时返回默认配置
    pub async fn load(root: &Path) -> anyhow::Result<Self> {
        let path = root.join(Self::FILE_NAME);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub file_name: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file_name: "site.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 300,
            sqlx_logging: false,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(dir.path()).await.unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(
            dir.path().join(AppConfig::FILE_NAME),
            r#"{ "log_filter": "debug", "database": { "max_connections": 2 } }"#,
        )
        .await
        .unwrap();

        let config = AppConfig::load(dir.path()).await.unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.file_name, "site.db");
        assert_eq!(config.database.idle_timeout(), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join(AppConfig::FILE_NAME), "not json")
            .await
            .unwrap();

        assert!(AppConfig::load(dir.path()).await.is_err());
    }
}
