//! Business logic services that do not touch the database.

pub mod catalog;
pub mod passwords;
pub mod path_parser;
pub mod session;
pub mod storage;
pub mod tags;
pub mod test_case_id;
pub mod uploads;
