use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{ModuleError, Result};
use super::menu::{self, RouteResolver};
use super::types::{MenuGroups, ModulePackage};

/// 定义文件所在子目录
pub const CONFIG_DIR: &str = "Config";
pub const PACKAGE_FILE: &str = "package.json";
pub const PERMISSIONS_FILE: &str = "permissions.json";
pub const MENUS_FILE: &str = "menus.json";

/// 一次 create/update/refresh 过程中的模块状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleDraft {
    pub package: ModulePackage,
    pub permissions: Vec<String>,
    pub menus: MenuGroups,
}

impl ModuleDraft {
    pub fn new(package: ModulePackage, permissions: Vec<String>, menus: MenuGroups) -> Self {
        Self { package, permissions, menus }
    }

    /// 追加由功能开关派生的菜单，每个 draft 只应调用一次
    pub fn format_menus(&mut self, routes: &dyn RouteResolver) {
        menu::format_menus(&self.package, &mut self.menus, routes);
    }
}

/// 模块的三个定义文件：`<modules_dir>/<Name>/Config/{package,permissions,menus}.json`
///
/// 每次写入都整体覆盖文件
#[derive(Debug, Clone)]
pub struct DefinitionFiles {
    dir: PathBuf,
}

impl DefinitionFiles {
    pub fn new(module_dir: &Path) -> Self {
        Self {
            dir: module_dir.join(CONFIG_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// 读取原始 package 字段，由调用方决定如何合并
    pub async fn read_package(&self) -> Result<Map<String, Value>> {
        self.read_json(PACKAGE_FILE).await
    }

    pub async fn read_permissions(&self) -> Result<Vec<String>> {
        self.read_json(PERMISSIONS_FILE).await
    }

    pub async fn read_menus(&self) -> Result<MenuGroups> {
        self.read_json(MENUS_FILE).await
    }

    pub async fn write(&self, draft: &ModuleDraft) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ModuleError::Io { path: self.dir.clone(), source })?;

        self.write_json(PACKAGE_FILE, &draft.package).await?;
        self.write_json(PERMISSIONS_FILE, &draft.permissions).await?;
        self.write_json(MENUS_FILE, &draft.menus).await?;

        tracing::debug!("Definition files written: {}", self.dir.display());
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.path(file);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ModuleError::Io { path: path.clone(), source })?;
        serde_json::from_str(&content).map_err(|source| ModuleError::Definition { path, source })
    }

    async fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.path(file);
        let content = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| ModuleError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::types::MenuItem;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let files = DefinitionFiles::new(&dir.path().join("Edu"));

        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!("Edu"));
        attributes.insert("title".to_string(), json!("在线教育"));
        let package = ModulePackage::template().merged(&attributes).unwrap();

        let mut menus = MenuGroups::new();
        menus.push("课程管理", MenuItem::new("课程列表", "/edu/lesson", "lesson"));
        menus.push("会员订阅", MenuItem::new("订阅套餐", "/edu/subscribe", "subscribe"));

        let draft = ModuleDraft::new(package.clone(), vec!["lesson".into(), "subscribe".into()], menus.clone());
        files.write(&draft).await.unwrap();

        let raw = files.read_package().await.unwrap();
        assert_eq!(ModulePackage::default().merged(&raw).unwrap(), package);
        assert_eq!(files.read_permissions().await.unwrap(), vec!["lesson", "subscribe"]);
        assert_eq!(files.read_menus().await.unwrap(), menus);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let files = DefinitionFiles::new(&dir.path().join("Edu"));

        files
            .write(&ModuleDraft::new(ModulePackage::template(), vec!["a".into(), "b".into()], MenuGroups::new()))
            .await
            .unwrap();
        files
            .write(&ModuleDraft::new(ModulePackage::template(), vec!["c".into()], MenuGroups::new()))
            .await
            .unwrap();

        assert_eq!(files.read_permissions().await.unwrap(), vec!["c"]);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_files() {
        let dir = TempDir::new().unwrap();
        let files = DefinitionFiles::new(&dir.path().join("Edu"));

        assert!(matches!(files.read_menus().await, Err(ModuleError::Io { .. })));

        tokio::fs::create_dir_all(files.dir()).await.unwrap();
        tokio::fs::write(files.path(MENUS_FILE), "{ broken").await.unwrap();
        assert!(matches!(files.read_menus().await, Err(ModuleError::Definition { .. })));
    }
}
