use std::path::PathBuf;

use sea_orm::DbErr;

use crate::cache::CacheError;

/// 模块管理错误
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Module name must not be empty")]
    EmptyName,

    #[error("Module already exists: {0}")]
    NameTaken(String),

    #[error("Failed to scaffold module {name}: {reason}")]
    Scaffold { name: String, reason: String },

    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Site not found: {0}")]
    SiteNotFound(i32),

    #[error("Admin of site {0} not found")]
    SiteAdminMissing(i32),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid definition file {}: {source}", path.display())]
    Definition {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type Result<T> = std::result::Result<T, ModuleError>;
