use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use chrono::NaiveDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "modules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,         // 模块标识，首字母大写
    pub title: String,        // 模块名称
    pub local: bool,          // 是否已在本地生成
    #[sea_orm(column_type = "Text")]
    pub package: String,      // package.json 内容
    #[sea_orm(column_type = "Text")]
    pub permissions: String,  // 权限标识列表 (JSON)
    #[sea_orm(column_type = "Text")]
    pub menus: String,        // 菜单分组 (JSON，保持声明顺序)
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
