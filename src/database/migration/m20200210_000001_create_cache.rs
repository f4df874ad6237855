use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Cache::Table)
                .if_not_exists()
                .col(ColumnDef::new(Cache::CacheKey).string().not_null().primary_key())
                .col(ColumnDef::new(Cache::Value).text().not_null())
                .col(ColumnDef::new(Cache::ExpireAt).date_time().null())
                .col(ColumnDef::new(Cache::CreatedAt).date_time().not_null())
                .to_owned()
        ).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Cache::Table).to_owned()).await
    }
}

#[derive(Iden)]
enum Cache {
    Table,
    CacheKey,
    Value,
    ExpireAt,
    CreatedAt,
}
