use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::CacheStore;
use crate::database::entities::{group_package, module, package_module, site, user};
use super::access::{ModuleAccess, SitePermissions};
use super::definition::{DefinitionFiles, ModuleDraft};
use super::error::{ModuleError, Result};
use super::lock::NameLocks;
use super::menu::{RouteResolver, RouteTable};
use super::scaffold::{DirectoryScaffolder, Scaffolder};
use super::types::{normalize_name, Module, ModuleInstall, ModulePackage};

/// 删除模块的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRemoval {
    pub name: String,
    pub record_deleted: bool,
    /// 未能删除的模块目录，需要人工清理
    pub leftover_dir: Option<PathBuf>,
}

/// 模块管理
///
/// 定义文件是 permissions/menus 的权威来源，数据库是 package 与标识的权威来源。
pub struct ModuleRepository {
    db: DatabaseConnection,
    cache: CacheStore,
    modules_dir: PathBuf,
    scaffolder: Arc<dyn Scaffolder>,
    routes: Arc<dyn RouteResolver>,
    locks: NameLocks,
}

impl ModuleRepository {
    pub fn new(db: DatabaseConnection, modules_dir: &Path) -> Self {
        Self {
            cache: CacheStore::new(db.clone()),
            db,
            modules_dir: modules_dir.to_path_buf(),
            scaffolder: Arc::new(DirectoryScaffolder::new(modules_dir)),
            routes: Arc::new(RouteTable::default()),
            locks: NameLocks::new(),
        }
    }

    pub fn with_scaffolder(mut self, scaffolder: Arc<dyn Scaffolder>) -> Self {
        self.scaffolder = scaffolder;
        self
    }

    pub fn with_routes(mut self, routes: Arc<dyn RouteResolver>) -> Self {
        self.routes = routes;
        self
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.modules_dir.join(name)
    }

    fn definition_files(&self, name: &str) -> DefinitionFiles {
        DefinitionFiles::new(&self.module_dir(name))
    }

    /// 所有已安装模块
    pub async fn list(&self) -> Result<Vec<Module>> {
        let models = module::Entity::find()
            .order_by_asc(module::Column::Id)
            .all(&self.db)
            .await?;
        models
            .into_iter()
            .map(|m| Module::try_from(m).map_err(ModuleError::from))
            .collect()
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Module>> {
        let model = module::Entity::find()
            .filter(module::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(model.map(Module::try_from).transpose()?)
    }

    /// 安装模块
    pub async fn create(&self, install: ModuleInstall) -> Result<Module> {
        let name = normalize_name(install.name());
        if name.is_empty() {
            return Err(ModuleError::EmptyName);
        }

        let _guard = self.locks.acquire(&name).await;

        // 先确认名称可用，避免留下无主的骨架
        if self.find_by_name(&name).await?.is_some() {
            return Err(ModuleError::NameTaken(name));
        }
        self.reclaim_leftover_dir(&name).await?;

        let mut attributes = install.attributes;
        attributes.insert("name".to_string(), Value::String(name.clone()));
        let mut package = ModulePackage::template().merged(&attributes)?;
        if package.title.is_empty() {
            package.title = name.clone();
        }

        self.scaffolder.make(&name).await?;

        let mut draft = ModuleDraft::new(package, install.permissions, install.menus);
        self.definition_files(&name).write(&draft).await?;
        draft.format_menus(self.routes.as_ref());

        let now = Utc::now().naive_utc();
        let active_model = module::ActiveModel {
            id: ActiveValue::NotSet,
            name: Set(name.clone()),
            title: Set(draft.package.title.clone()),
            local: Set(true),
            package: Set(serde_json::to_string(&draft.package)?),
            permissions: Set(serde_json::to_string(&draft.permissions)?),
            menus: Set(serde_json::to_string(&draft.menus)?),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active_model.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ModuleError::NameTaken(name.clone()),
            _ => ModuleError::Database(e),
        })?;

        tracing::info!("Module installed: {} ({})", model.name, model.title);

        Ok(Module::try_from(model)?)
    }

    /// 更新 package，permissions 与 menus 从定义文件重新加载
    pub async fn update(&self, module: &Module, attributes: Map<String, Value>) -> Result<Module> {
        let _guard = self.locks.acquire(&module.name).await;
        let module = self.reload(module).await?;

        let mut attributes = attributes;
        attributes.remove("name");
        let mut package = module.package.merged(&attributes)?;
        package.name = module.name.clone();

        let files = self.definition_files(&module.name);
        let permissions = files.read_permissions().await?;
        let menus = files.read_menus().await?;

        let mut draft = ModuleDraft::new(package, permissions, menus);
        files.write(&draft).await?;
        draft.format_menus(self.routes.as_ref());

        let updated = self.save(&module, &draft).await?;
        tracing::info!("Module updated: {}", updated.name);
        Ok(updated)
    }

    /// 手工修改定义文件后，将数据库记录同步为磁盘内容
    pub async fn refresh(&self, module: &Module) -> Result<Module> {
        let _guard = self.locks.acquire(&module.name).await;
        let module = self.reload(module).await?;

        let files = self.definition_files(&module.name);
        let mut package = ModulePackage::template().merged(&files.read_package().await?)?;
        package.name = module.name.clone();
        let permissions = files.read_permissions().await?;
        let menus = files.read_menus().await?;

        let mut draft = ModuleDraft::new(package, permissions, menus);
        draft.format_menus(self.routes.as_ref());

        let refreshed = self.save(&module, &draft).await?;
        tracing::info!("Module refreshed from disk: {}", refreshed.name);
        Ok(refreshed)
    }

    /// 持锁后重新读取记录，调用方手里的副本可能已过期
    async fn reload(&self, module: &Module) -> Result<Module> {
        let model = module::Entity::find_by_id(module.id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ModuleError::NotFound(module.name.clone()))?;
        Ok(Module::try_from(model)?)
    }

    /// 清除没有记录的残留模块目录（上次卸载未能删除）
    async fn reclaim_leftover_dir(&self, name: &str) -> Result<()> {
        // 只处理单层目录名，其余交给骨架生成去拒绝
        let mut components = Path::new(name).components();
        if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
            return Ok(());
        }

        let dir = self.module_dir(name);
        let metadata = match tokio::fs::symlink_metadata(&dir).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => return Err(ModuleError::Io { path: dir, source }),
        };
        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&dir).await
        } else {
            tokio::fs::remove_file(&dir).await
        };
        removed.map_err(|source| ModuleError::Io { path: dir.clone(), source })?;

        tracing::warn!("Removed leftover directory of uninstalled module: {}", dir.display());
        Ok(())
    }

    async fn save(&self, module: &Module, draft: &ModuleDraft) -> Result<Module> {
        let active_model = module::ActiveModel {
            id: ActiveValue::Unchanged(module.id),
            name: Set(module.name.clone()),
            title: Set(draft.package.title.clone()),
            local: Set(true),
            package: Set(serde_json::to_string(&draft.package)?),
            permissions: Set(serde_json::to_string(&draft.permissions)?),
            menus: Set(serde_json::to_string(&draft.menus)?),
            created_at: ActiveValue::NotSet,
            updated_at: Set(Utc::now().naive_utc()),
        };
        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => ModuleError::NotFound(module.name.clone()),
            e => ModuleError::Database(e),
        })?;
        Ok(Module::try_from(model)?)
    }

    /// 删除模块目录与数据库记录
    ///
    /// 目录删除失败时仍删除记录，并在结果中返回残留目录
    pub async fn delete(&self, module: &Module) -> Result<ModuleRemoval> {
        let _guard = self.locks.acquire(&module.name).await;

        let dir = self.module_dir(&module.name);
        let leftover_dir = match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to remove module directory {}: {}", dir.display(), e);
                Some(dir)
            }
        };

        let txn = self.db.begin().await?;
        package_module::Entity::delete_many()
            .filter(package_module::Column::ModuleId.eq(module.id))
            .exec(&txn)
            .await?;
        let result = module::Entity::delete_by_id(module.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("Module removed: {}", module.name);

        Ok(ModuleRemoval {
            name: module.name.clone(),
            record_deleted: result.rows_affected > 0,
            leftover_dir,
        })
    }

    /// 站点可用的所有模块：站长所在会员组的每个套餐中的模块，不去重
    pub async fn site_all_modules(&self, site_id: i32) -> Result<Vec<Module>> {
        let site = self.find_site(site_id).await?;
        self.modules_of_site(&site).await
    }

    /// 用户在站点中可见的模块，非站长只保留有权限的菜单项
    pub async fn site_modules_by_user(&self, site_id: i32, user_id: i32) -> Result<Vec<Module>> {
        let site = self.find_site(site_id).await?;
        let mut modules = self.modules_of_site(&site).await?;

        if site.admin_id != user_id {
            let access = SitePermissions::load_for_site(&self.db, &site, user_id).await?;
            for module in &mut modules {
                access.filter_menus(module);
            }
        }

        Ok(modules)
    }

    /// 用户在站点内的权限集合
    pub async fn user_access(&self, site_id: i32, user_id: i32) -> Result<SitePermissions> {
        let site = self.find_site(site_id).await?;
        SitePermissions::load_for_site(&self.db, &site, user_id).await
    }

    /// 当前用户有权限访问的第一个菜单链接
    pub fn module_first_url(&self, module: &Module, access: &dyn ModuleAccess) -> Option<String> {
        module
            .menus
            .items()
            .find(|item| access.allows(&item.permission, &module.name))
            .map(|item| item.url.clone())
    }

    /// 缓存站点当前使用的模块，不会自动失效
    pub async fn cache_module(&self, site_id: i32, module: &Module) -> Result<()> {
        self.cache.forever(&Self::cache_key(site_id), module).await?;
        Ok(())
    }

    pub async fn cached_module(&self, site_id: i32) -> Result<Option<Module>> {
        Ok(self.cache.get(&Self::cache_key(site_id)).await?)
    }

    pub async fn forget_cached_module(&self, site_id: i32) -> Result<bool> {
        Ok(self.cache.forget(&Self::cache_key(site_id)).await?)
    }

    pub fn cache_key(site_id: i32) -> String {
        format!("cache_admin_s{}_module", site_id)
    }

    async fn find_site(&self, site_id: i32) -> Result<site::Model> {
        site::Entity::find_by_id(site_id)
            .one(&self.db)
            .await?
            .ok_or(ModuleError::SiteNotFound(site_id))
    }

    async fn modules_of_site(&self, site: &site::Model) -> Result<Vec<Module>> {
        let admin = user::Entity::find_by_id(site.admin_id)
            .one(&self.db)
            .await?
            .ok_or(ModuleError::SiteAdminMissing(site.id))?;

        let Some(group_id) = admin.group_id else {
            return Ok(Vec::new());
        };

        let packages = group_package::Entity::find()
            .filter(group_package::Column::GroupId.eq(group_id))
            .order_by_asc(group_package::Column::PackageId)
            .all(&self.db)
            .await?;

        let mut modules = Vec::new();
        for package in packages {
            let module_ids: Vec<i32> = package_module::Entity::find()
                .filter(package_module::Column::PackageId.eq(package.package_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|row| row.module_id)
                .collect();
            if module_ids.is_empty() {
                continue;
            }

            let models = module::Entity::find()
                .filter(module::Column::Id.is_in(module_ids))
                .order_by_asc(module::Column::Id)
                .all(&self.db)
                .await?;
            for model in models {
                modules.push(Module::try_from(model)?);
            }
        }

        tracing::debug!("Site {} has {} modules", site.id, modules.len());
        Ok(modules)
    }
}
