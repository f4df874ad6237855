//! 测试用的数据库与站点数据

use sea_orm::{ActiveModelTrait, DatabaseConnection, NotSet, Set};
use tempfile::TempDir;

use crate::config::DatabaseConfig;
use crate::database::{self, entities::{group, group_package, package, package_module, site, site_permission, user}};

/// 临时目录中的已迁移数据库
pub async fn database() -> (TempDir, DatabaseConnection) {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        max_connections: 1,
        ..DatabaseConfig::default()
    };
    let db = database::open(&dir.path().join("test.db"), &config).await.unwrap();
    (dir, db)
}

pub async fn insert_group(db: &DatabaseConnection, name: &str) -> i32 {
    group::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        site_num: Set(1),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_user(db: &DatabaseConnection, name: &str, group_id: Option<i32>) -> i32 {
    user::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        group_id: Set(group_id),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_site(db: &DatabaseConnection, name: &str, admin_id: i32) -> i32 {
    site::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        admin_id: Set(admin_id),
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// 创建套餐并关联模块，同时分配给会员组
pub async fn insert_package(db: &DatabaseConnection, name: &str, group_id: i32, module_ids: &[i32]) -> i32 {
    let package_id = package::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
    }
    .insert(db)
    .await
    .unwrap()
    .id;

    group_package::ActiveModel {
        id: NotSet,
        group_id: Set(group_id),
        package_id: Set(package_id),
    }
    .insert(db)
    .await
    .unwrap();

    for module_id in module_ids {
        package_module::ActiveModel {
            id: NotSet,
            package_id: Set(package_id),
            module_id: Set(*module_id),
        }
        .insert(db)
        .await
        .unwrap();
    }

    package_id
}

pub async fn grant(db: &DatabaseConnection, site_id: i32, user_id: i32, module: &str, permission: &str) {
    site_permission::ActiveModel {
        id: NotSet,
        site_id: Set(site_id),
        user_id: Set(user_id),
        module: Set(module.to_string()),
        permission: Set(permission.to_string()),
    }
    .insert(db)
    .await
    .unwrap();
}
