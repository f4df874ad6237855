use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;

use super::definition::CONFIG_DIR;
use super::error::{ModuleError, Result};

/// 模块骨架生成
#[async_trait]
pub trait Scaffolder: Send + Sync {
    /// 为模块生成源码骨架，名称非法或模块已存在时失败
    async fn make(&self, name: &str) -> Result<()>;
}

/// 在模块目录下创建标准子目录
pub struct DirectoryScaffolder {
    modules_dir: PathBuf,
}

/// 骨架包含的子目录
const SKELETON_DIRS: [&str; 5] = [CONFIG_DIR, "Entities", "Http/Controllers", "Resources/views", "Routes"];

impl DirectoryScaffolder {
    pub fn new(modules_dir: &Path) -> Self {
        Self {
            modules_dir: modules_dir.to_path_buf(),
        }
    }

    fn validate_name(name: &str) -> Result<()> {
        let re = Regex::new(r"^[A-Z][A-Za-z0-9_]*$").map_err(|e| ModuleError::Scaffold {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        if !re.is_match(name) {
            return Err(ModuleError::Scaffold {
                name: name.to_string(),
                reason: "name must start with an uppercase letter and contain only letters, digits or '_'".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Scaffolder for DirectoryScaffolder {
    async fn make(&self, name: &str) -> Result<()> {
        Self::validate_name(name)?;

        tokio::fs::create_dir_all(&self.modules_dir)
            .await
            .map_err(|source| ModuleError::Io { path: self.modules_dir.clone(), source })?;

        let module_dir = self.modules_dir.join(name);
        if let Err(e) = tokio::fs::create_dir(&module_dir).await {
            let reason = if e.kind() == std::io::ErrorKind::AlreadyExists {
                "module directory already exists".to_string()
            } else {
                e.to_string()
            };
            return Err(ModuleError::Scaffold { name: name.to_string(), reason });
        }

        for sub in SKELETON_DIRS {
            let path = module_dir.join(sub);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| ModuleError::Io { path, source })?;
        }

        tracing::debug!("Module skeleton created: {}", module_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_make_creates_skeleton() {
        let dir = TempDir::new().unwrap();
        let scaffolder = DirectoryScaffolder::new(&dir.path().join("modules"));

        scaffolder.make("Edu").await.unwrap();

        for sub in SKELETON_DIRS {
            assert!(dir.path().join("modules/Edu").join(sub).is_dir(), "{}", sub);
        }
    }

    #[tokio::test]
    async fn test_make_rejects_existing_module() {
        let dir = TempDir::new().unwrap();
        let scaffolder = DirectoryScaffolder::new(dir.path());

        scaffolder.make("Edu").await.unwrap();
        let err = scaffolder.make("Edu").await.unwrap_err();
        assert!(matches!(err, ModuleError::Scaffold { .. }));
    }

    #[tokio::test]
    async fn test_make_rejects_invalid_names() {
        let dir = TempDir::new().unwrap();
        let scaffolder = DirectoryScaffolder::new(dir.path());

        for name in ["edu", "9Lives", "Edu Module", "../Edu"] {
            let err = scaffolder.make(name).await.unwrap_err();
            assert!(matches!(err, ModuleError::Scaffold { .. }), "{}", name);
        }
        assert!(!dir.path().join("edu").exists());
    }
}
