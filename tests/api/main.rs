//! API integration test suite.
//!
//! Drives the full HTTP surface against an in-memory SQLite database and a
//! temporary attachment directory. No external services are needed.
//!
//! Run with: cargo test --test api


mod test_admin;
mod test_attachments;
mod test_auth;
mod test_comments;
mod test_issues;
mod test_search;
