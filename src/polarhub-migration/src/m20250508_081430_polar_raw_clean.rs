use sea_orm_migration::prelude::*;

use crate::m20250406_091233_polar_raw::PolarRaw;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(PolarRaw::Table)
                    .add_column(ColumnDef::new(Clean::RrClean).double().null())
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(PolarRaw::Table)
                    .add_column(ColumnDef::new(Clean::HrClean).double().null())
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(PolarRaw::Table)
                    .add_column(ColumnDef::new(Clean::ArtifactType).string().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(PolarRaw::Table)
                    .drop_column(Clean::RrClean)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(PolarRaw::Table)
                    .drop_column(Clean::HrClean)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(PolarRaw::Table)
                    .drop_column(Clean::ArtifactType)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Clean {
    RrClean,
    HrClean,
    ArtifactType,
}
