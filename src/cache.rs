use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::entities::cache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Cache value error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// 基于 `cache` 表的持久缓存
///
/// 没有自动失效，模块变更后由调用方显式 `forget`
#[derive(Clone)]
pub struct CacheStore {
    db: DatabaseConnection,
}

impl CacheStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 永久缓存
    pub async fn forever<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.save(key, value, None).await
    }

    /// 缓存指定时长
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        let expire_at = Utc::now().naive_utc() + ttl;
        self.save(key, value, Some(expire_at)).await
    }

    async fn save<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expire_at: Option<chrono::NaiveDateTime>,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_string(value)?;
        let now = Utc::now().naive_utc();

        // 检查是否已存在
        let existing = cache::Entity::find_by_id(key)
            .one(&self.db)
            .await?;

        if existing.is_some() {
            // 更新
            let active_model = cache::ActiveModel {
                cache_key: Set(key.to_string()),
                value: Set(value),
                expire_at: Set(expire_at),
                created_at: Set(now),
            };
            active_model.update(&self.db).await?;
        } else {
            // 插入
            let active_model = cache::ActiveModel {
                cache_key: Set(key.to_string()),
                value: Set(value),
                expire_at: Set(expire_at),
                created_at: Set(now),
            };
            active_model.insert(&self.db).await?;
        }

        tracing::debug!("Cache stored: {}", key);
        Ok(())
    }

    /// 读取缓存，过期记录视为不存在并被删除
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(entry) = cache::Entity::find_by_id(key).one(&self.db).await? else {
            return Ok(None);
        };

        if entry.is_expired(Utc::now().naive_utc()) {
            cache::Entity::delete_by_id(key).exec(&self.db).await?;
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&entry.value)?))
    }

    /// 删除缓存，返回是否存在过
    pub async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        let result = cache::Entity::delete_by_id(key).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
