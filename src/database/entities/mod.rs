pub mod cache;
pub mod group;
pub mod group_package;
pub mod module;
pub mod package;
pub mod package_module;
pub mod site;
pub mod site_permission;
pub mod user;

pub use cache::Entity as CacheEntity;
pub use group::Entity as GroupEntity;
pub use group_package::Entity as GroupPackageEntity;
pub use module::Entity as ModuleEntity;
pub use package::Entity as PackageEntity;
pub use package_module::Entity as PackageModuleEntity;
pub use site::Entity as SiteEntity;
pub use site_permission::Entity as SitePermissionEntity;
pub use user::Entity as UserEntity;
