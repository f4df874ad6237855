use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub cache_key: String,
    #[sea_orm(column_type = "Text")]
    pub value: String,                    // JSON
    pub expire_at: Option<NaiveDateTime>, // None 表示永久缓存
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expire_at.is_some_and(|expire_at| expire_at <= now)
    }
}
