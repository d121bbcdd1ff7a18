use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PolarHrvSummary::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PolarHrvSummary::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PolarHrvSummary::Device)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PolarHrvSummary::Posture).string().null())
                    .col(
                        ColumnDef::new(PolarHrvSummary::Time)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PolarHrvSummary::Rmssd).double().not_null())
                    .col(ColumnDef::new(PolarHrvSummary::Sdnn).double().not_null())
                    .col(ColumnDef::new(PolarHrvSummary::Pnn50).double().not_null())
                    .col(
                        ColumnDef::new(PolarHrvSummary::HeartRate)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PolarHrvSummary::SampleCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PolarHrvSummary::ArtifactCount)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_polar_hrv_summary_device_time")
                    .table(PolarHrvSummary::Table)
                    .col(PolarHrvSummary::Device)
                    .col(PolarHrvSummary::Time)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PolarHrvSummary::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PolarHrvSummary {
    Table,
    Id,
    Device,
    Posture,
    Time,
    Rmssd,
    Sdnn,
    Pnn50,
    HeartRate,
    SampleCount,
    ArtifactCount,
}
