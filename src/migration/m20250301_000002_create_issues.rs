//! Create issues table.
//!
//! `test_case_ids` carries a unique index: it backstops the in-process
//! creation lock when several server processes share one database.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issue::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Issue::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Issue::TestcaseTitle).string().not_null())
                    .col(ColumnDef::new(Issue::TestcasePath).string_len(500).not_null())
                    .col(ColumnDef::new(Issue::Severity).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Issue::TestCaseIds)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Issue::Release).string_len(50))
                    .col(ColumnDef::new(Issue::Platform).string_len(50))
                    .col(ColumnDef::new(Issue::Build).string_len(50))
                    .col(ColumnDef::new(Issue::Target).string_len(100))
                    .col(ColumnDef::new(Issue::Description).text().not_null())
                    .col(ColumnDef::new(Issue::AdditionalComments).text())
                    .col(ColumnDef::new(Issue::ReporterName).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Issue::Status)
                            .string_len(20)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Issue::CcrNumber).string_len(50))
                    .col(
                        ColumnDef::new(Issue::Upvotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Issue::Downvotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Issue::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Issue::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_created_at")
                    .table(Issue::Table)
                    .col(Issue::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_status")
                    .table(Issue::Table)
                    .col(Issue::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_release_platform")
                    .table(Issue::Table)
                    .col(Issue::Release)
                    .col(Issue::Platform)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Issue::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Issue {
    #[sea_orm(iden = "issues")]
    Table,
    Id,
    TestcaseTitle,
    TestcasePath,
    Severity,
    TestCaseIds,
    Release,
    Platform,
    Build,
    Target,
    Description,
    AdditionalComments,
    ReporterName,
    Status,
    CcrNumber,
    Upvotes,
    Downvotes,
    CreatedAt,
    UpdatedAt,
}
