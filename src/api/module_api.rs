use serde_json::{Map, Value};

use crate::modules::{Module, ModuleInstall, ModuleRemoval, ModuleRepository};

// 控制器层通过全局单例访问模块管理
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;
use sea_orm::DatabaseConnection;

static MODULE_REPOSITORY: OnceCell<Arc<ModuleRepository>> = OnceCell::new();

fn get_module_repository() -> anyhow::Result<&'static Arc<ModuleRepository>> {
    MODULE_REPOSITORY.get()
        .ok_or_else(|| anyhow::anyhow!("Module repository not initialized. Call init_application first."))
}

/// 初始化模块管理（内部使用）
pub(crate) fn init_module_repository(db: DatabaseConnection, modules_dir: &Path) -> anyhow::Result<()> {
    let repository = ModuleRepository::new(db, modules_dir);
    MODULE_REPOSITORY.set(Arc::new(repository))
        .map_err(|_| anyhow::anyhow!("Module repository already initialized"))?;
    Ok(())
}

async fn find_module(name: &str) -> anyhow::Result<Module> {
    let repository = get_module_repository()?;
    repository.find_by_name(name).await?
        .ok_or_else(|| anyhow::anyhow!("Module not found: {}", name))
}

/// 获取所有已安装的模块
pub async fn installed_modules() -> anyhow::Result<Vec<Module>> {
    let repository = get_module_repository()?;
    Ok(repository.list().await?)
}

/// 安装模块
pub async fn install_module(install: ModuleInstall) -> anyhow::Result<Module> {
    let repository = get_module_repository()?;
    Ok(repository.create(install).await?)
}

/// 修改模块包信息
pub async fn update_module(name: String, attributes: Map<String, Value>) -> anyhow::Result<Module> {
    let repository = get_module_repository()?;
    let module = find_module(&name).await?;
    Ok(repository.update(&module, attributes).await?)
}

/// 按磁盘上的定义文件刷新模块
pub async fn refresh_module(name: String) -> anyhow::Result<Module> {
    let repository = get_module_repository()?;
    let module = find_module(&name).await?;
    Ok(repository.refresh(&module).await?)
}

/// 卸载模块
pub async fn uninstall_module(name: String) -> anyhow::Result<ModuleRemoval> {
    let repository = get_module_repository()?;
    let module = find_module(&name).await?;
    Ok(repository.delete(&module).await?)
}

/// 站点所有模块
pub async fn site_modules(site_id: i32) -> anyhow::Result<Vec<Module>> {
    let repository = get_module_repository()?;
    Ok(repository.site_all_modules(site_id).await?)
}

/// 用户在站点中可使用的模块
pub async fn user_modules(site_id: i32, user_id: i32) -> anyhow::Result<Vec<Module>> {
    let repository = get_module_repository()?;
    Ok(repository.site_modules_by_user(site_id, user_id).await?)
}

/// 进入站点模块：返回用户有权限的第一个链接，并缓存为站点当前模块
pub async fn enter_module(site_id: i32, user_id: i32, name: String) -> anyhow::Result<Option<String>> {
    let repository = get_module_repository()?;
    let module = find_module(&name).await?;

    let access = repository.user_access(site_id, user_id).await?;

    let url = repository.module_first_url(&module, &access);
    if url.is_some() {
        repository.cache_module(site_id, &module).await?;
    }
    Ok(url)
}

/// 站点当前缓存的模块
pub async fn current_module(site_id: i32) -> anyhow::Result<Option<Module>> {
    let repository = get_module_repository()?;
    Ok(repository.cached_module(site_id).await?)
}

/// 清除站点的模块缓存
pub async fn forget_current_module(site_id: i32) -> anyhow::Result<bool> {
    let repository = get_module_repository()?;
    Ok(repository.forget_cached_module(site_id).await?)
}
