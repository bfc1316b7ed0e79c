//! Triage board server library.
//!
//! Issue tracking for automated test-case failures: issues filed against a
//! test path, threaded comments with a single verified solution, votes, tags
//! and attachments, served over an Actix-web JSON API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
