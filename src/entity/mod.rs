//! SeaORM entity definitions.

pub mod attachment;
pub mod comment;
pub mod issue;
pub mod issue_tag;
pub mod tag;
pub mod user;
