//! Issue entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub testcase_title: String,
    pub testcase_path: String,
    pub severity: String,
    #[sea_orm(unique)]
    pub test_case_ids: String,
    pub release: Option<String>,
    pub platform: Option<String>,
    pub build: Option<String>,
    pub target: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub additional_comments: Option<String>,
    pub reporter_name: String,
    pub status: String,
    pub ccr_number: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::issue_tag::Entity")]
    IssueTags,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::issue_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::issue_tag::Relation::Issue.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
