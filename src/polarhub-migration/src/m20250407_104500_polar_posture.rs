use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PolarPosture::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PolarPosture::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PolarPosture::Time).big_integer().not_null())
                    .col(
                        ColumnDef::new(PolarPosture::FromPosture)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PolarPosture::ToPosture).string().not_null())
                    .col(ColumnDef::new(PolarPosture::Source).string().null())
                    .col(
                        ColumnDef::new(PolarPosture::FromDurationSeconds)
                            .double()
                            .null(),
                    )
                    .col(ColumnDef::new(PolarPosture::Confidence).double().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PolarPosture::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PolarPosture {
    Table,
    Id,
    Time,
    FromPosture,
    ToPosture,
    Source,
    FromDurationSeconds,
    Confidence,
}
