//! Create issue_tags join table.

use sea_orm_migration::prelude::*;

use super::m20250301_000002_create_issues::Issue;
use super::m20250301_000003_create_tags::Tag;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IssueTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(IssueTag::IssueId).uuid().not_null())
                    .col(ColumnDef::new(IssueTag::TagId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(IssueTag::IssueId)
                            .col(IssueTag::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(IssueTag::Table, IssueTag::IssueId)
                            .to(Issue::Table, Issue::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(IssueTag::Table, IssueTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issue_tags_tag_id")
                    .table(IssueTag::Table)
                    .col(IssueTag::TagId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IssueTag::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum IssueTag {
    #[sea_orm(iden = "issue_tags")]
    Table,
    IssueId,
    TagId,
}
