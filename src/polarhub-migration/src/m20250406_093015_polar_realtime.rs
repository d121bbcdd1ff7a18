use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PolarRealtime::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PolarRealtime::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PolarRealtime::Device).string().not_null())
                    .col(
                        ColumnDef::new(PolarRealtime::Time)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PolarRealtime::Rmssd).double().not_null())
                    .col(ColumnDef::new(PolarRealtime::Sdnn).double().not_null())
                    .col(ColumnDef::new(PolarRealtime::Pnn50).double().not_null())
                    .col(ColumnDef::new(PolarRealtime::Hr).double().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_polar_realtime_device_time")
                    .table(PolarRealtime::Table)
                    .col(PolarRealtime::Device)
                    .col(PolarRealtime::Time)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PolarRealtime::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PolarRealtime {
    Table,
    Id,
    Device,
    Time,
    Rmssd,
    Sdnn,
    Pnn50,
    Hr,
}
