//! Create attachments table.

use sea_orm_migration::prelude::*;

use super::m20250301_000002_create_issues::Issue;
use super::m20250301_000005_create_comments::Comment;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachment::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attachment::IssueId).uuid().not_null())
                    .col(ColumnDef::new(Attachment::CommentId).uuid())
                    .col(ColumnDef::new(Attachment::Filename).string().not_null())
                    .col(ColumnDef::new(Attachment::FilePath).string_len(500).not_null())
                    .col(ColumnDef::new(Attachment::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Attachment::MimeType).string_len(100))
                    .col(ColumnDef::new(Attachment::UploadedBy).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Attachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attachment::Table, Attachment::IssueId)
                            .to(Issue::Table, Issue::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attachment::Table, Attachment::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attachments_issue_id")
                    .table(Attachment::Table)
                    .col(Attachment::IssueId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Attachment {
    #[sea_orm(iden = "attachments")]
    Table,
    Id,
    IssueId,
    CommentId,
    Filename,
    FilePath,
    FileSize,
    MimeType,
    UploadedBy,
    CreatedAt,
}
