use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PolarRaw::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PolarRaw::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PolarRaw::Device).string().not_null())
                    // Epoch milliseconds
                    .col(ColumnDef::new(PolarRaw::Time).big_integer().not_null())
                    .col(ColumnDef::new(PolarRaw::RrInterval).double().null())
                    .col(ColumnDef::new(PolarRaw::HeartRate).double().null())
                    .col(ColumnDef::new(PolarRaw::Source).string().null())
                    .col(ColumnDef::new(PolarRaw::Path).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_polar_raw_device_time")
                    .table(PolarRaw::Table)
                    .col(PolarRaw::Device)
                    .col(PolarRaw::Time)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PolarRaw::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum PolarRaw {
    Table,
    Id,
    Device,
    Time,
    RrInterval,
    HeartRate,
    Source,
    Path,
}
