use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::database::entities::{site, site_permission};
use super::error::{ModuleError, Result};
use super::types::Module;

/// 模块权限判断
///
/// 必须是无副作用的全函数：相同输入总得到相同结果
pub trait ModuleAccess: Send + Sync {
    fn allows(&self, permission: &str, module: &str) -> bool;
}

/// 用户在某个站点内的权限集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePermissions {
    admin: bool,
    grants: HashMap<String, HashSet<String>>,
}

impl SitePermissions {
    /// 站长，拥有全部权限
    pub fn admin() -> Self {
        Self {
            admin: true,
            grants: HashMap::new(),
        }
    }

    /// 操作员，只拥有明确授予的 (模块, 权限)
    pub fn from_grants<I, M, P>(grants: I) -> Self
    where
        I: IntoIterator<Item = (M, P)>,
        M: Into<String>,
        P: Into<String>,
    {
        let mut map: HashMap<String, HashSet<String>> = HashMap::new();
        for (module, permission) in grants {
            map.entry(module.into()).or_default().insert(permission.into());
        }
        Self {
            admin: false,
            grants: map,
        }
    }

    /// 从数据库加载用户在站点内的权限
    pub async fn load<C: ConnectionTrait>(db: &C, site_id: i32, user_id: i32) -> Result<Self> {
        let site = site::Entity::find_by_id(site_id)
            .one(db)
            .await?
            .ok_or(ModuleError::SiteNotFound(site_id))?;
        Self::load_for_site(db, &site, user_id).await
    }

    pub(crate) async fn load_for_site<C: ConnectionTrait>(db: &C, site: &site::Model, user_id: i32) -> Result<Self> {
        if site.admin_id == user_id {
            return Ok(Self::admin());
        }

        let rows = site_permission::Entity::find()
            .filter(site_permission::Column::SiteId.eq(site.id))
            .filter(site_permission::Column::UserId.eq(user_id))
            .all(db)
            .await?;

        tracing::debug!("Loaded {} permissions for user {} on site {}", rows.len(), user_id, site.id);

        Ok(Self::from_grants(rows.into_iter().map(|row| (row.module, row.permission))))
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// 只保留有权限的菜单项，分组保留
    pub fn filter_menus(&self, module: &mut Module) {
        if self.admin {
            return;
        }
        let name = module.name.clone();
        module.menus.retain_items(|item| self.allows(&item.permission, &name));
    }
}

impl ModuleAccess for SitePermissions {
    fn allows(&self, permission: &str, module: &str) -> bool {
        self.admin
            || self
                .grants
                .get(module)
                .is_some_and(|permissions| permissions.contains(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_admin_allows_everything() {
        let access = SitePermissions::admin();
        assert!(access.allows("config", "Edu"));
        assert!(access.allows("anything", "Other"));
    }

    #[test]
    fn test_grants_are_module_scoped() {
        let access = SitePermissions::from_grants([("Edu", "lesson"), ("Edu", "config")]);
        assert!(access.allows("lesson", "Edu"));
        assert!(access.allows("config", "Edu"));
        assert!(!access.allows("lesson", "Wechat"));
        assert!(!access.allows("domain", "Edu"));
        assert!(!access.is_admin());
    }

    #[tokio::test]
    async fn test_load_from_database() {
        let (_dir, db) = testing::database().await;
        let admin = testing::insert_user(&db, "admin", None).await;
        let operator = testing::insert_user(&db, "operator", None).await;
        let site = testing::insert_site(&db, "demo", admin).await;
        testing::grant(&db, site, operator, "Edu", "lesson").await;
        testing::grant(&db, site + 1, operator, "Edu", "config").await;

        let access = SitePermissions::load(&db, site, operator).await.unwrap();
        assert!(access.allows("lesson", "Edu"));
        assert!(!access.allows("config", "Edu"));

        let access = SitePermissions::load(&db, site, admin).await.unwrap();
        assert!(access.is_admin());

        let missing = SitePermissions::load(&db, site + 100, admin).await;
        assert!(matches!(missing, Err(ModuleError::SiteNotFound(_))));
    }
}
