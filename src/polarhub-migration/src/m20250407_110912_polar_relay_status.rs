use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PolarRelayStatus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PolarRelayStatus::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PolarRelayStatus::Time)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PolarRelayStatus::Category)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PolarRelayStatus::Event).string().not_null())
                    .col(ColumnDef::new(PolarRelayStatus::Source).string().null())
                    .col(ColumnDef::new(PolarRelayStatus::Device).string().null())
                    .col(ColumnDef::new(PolarRelayStatus::Fields).json().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PolarRelayStatus::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PolarRelayStatus {
    Table,
    Id,
    Time,
    Category,
    Event,
    Source,
    Device,
    Fields,
}
