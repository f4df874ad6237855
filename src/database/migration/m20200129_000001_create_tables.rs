use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 会员组
        manager.create_table(
            Table::create()
                .table(Groups::Table)
                .if_not_exists()
                .col(ColumnDef::new(Groups::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(Groups::Name).string().not_null().unique_key())
                .col(ColumnDef::new(Groups::SiteNum).integer().not_null().default(1))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Users::Table)
                .if_not_exists()
                .col(ColumnDef::new(Users::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(Users::Name).string().not_null())
                .col(ColumnDef::new(Users::GroupId).integer().null())
                .to_owned()
        ).await?;

        // 套餐
        manager.create_table(
            Table::create()
                .table(Packages::Table)
                .if_not_exists()
                .col(ColumnDef::new(Packages::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(Packages::Name).string().not_null())
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(GroupPackage::Table)
                .if_not_exists()
                .col(ColumnDef::new(GroupPackage::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(GroupPackage::GroupId).integer().not_null())
                .col(ColumnDef::new(GroupPackage::PackageId).integer().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_group_package_group_id")
                .table(GroupPackage::Table)
                .col(GroupPackage::GroupId)
                .to_owned()
        ).await?;

        // 模块
        manager.create_table(
            Table::create()
                .table(Modules::Table)
                .if_not_exists()
                .col(ColumnDef::new(Modules::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(Modules::Name).string().not_null())
                .col(ColumnDef::new(Modules::Title).string().not_null())
                .col(ColumnDef::new(Modules::Local).boolean().not_null().default(false))
                .col(ColumnDef::new(Modules::Package).text().not_null())
                .col(ColumnDef::new(Modules::Permissions).text().not_null())
                .col(ColumnDef::new(Modules::Menus).text().not_null())
                .col(ColumnDef::new(Modules::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(Modules::UpdatedAt).date_time().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_modules_name")
                .table(Modules::Table)
                .col(Modules::Name)
                .unique()
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(PackageModule::Table)
                .if_not_exists()
                .col(ColumnDef::new(PackageModule::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(PackageModule::PackageId).integer().not_null())
                .col(ColumnDef::new(PackageModule::ModuleId).integer().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_package_module_package_id")
                .table(PackageModule::Table)
                .col(PackageModule::PackageId)
                .to_owned()
        ).await?;

        // 站点
        manager.create_table(
            Table::create()
                .table(Sites::Table)
                .if_not_exists()
                .col(ColumnDef::new(Sites::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(Sites::Name).string().not_null())
                .col(ColumnDef::new(Sites::AdminId).integer().not_null())
                .to_owned()
        ).await?;

        // 操作员模块权限
        manager.create_table(
            Table::create()
                .table(SitePermissions::Table)
                .if_not_exists()
                .col(ColumnDef::new(SitePermissions::Id).integer().not_null().auto_increment().primary_key())
                .col(ColumnDef::new(SitePermissions::SiteId).integer().not_null())
                .col(ColumnDef::new(SitePermissions::UserId).integer().not_null())
                .col(ColumnDef::new(SitePermissions::Module).string().not_null())
                .col(ColumnDef::new(SitePermissions::Permission).string().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx_site_permissions_site_user")
                .table(SitePermissions::Table)
                .col(SitePermissions::SiteId)
                .col(SitePermissions::UserId)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SitePermissions::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Sites::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(PackageModule::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Modules::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(GroupPackage::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Packages::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Groups::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    SiteNum,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    GroupId,
}

#[derive(Iden)]
enum Packages {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum GroupPackage {
    Table,
    Id,
    GroupId,
    PackageId,
}

#[derive(Iden)]
enum Modules {
    Table,
    Id,
    Name,
    Title,
    Local,
    Package,
    Permissions,
    Menus,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PackageModule {
    Table,
    Id,
    PackageId,
    ModuleId,
}

#[derive(Iden)]
enum Sites {
    Table,
    Id,
    Name,
    AdminId,
}

#[derive(Iden)]
enum SitePermissions {
    Table,
    Id,
    SiteId,
    UserId,
    Module,
    Permission,
}
