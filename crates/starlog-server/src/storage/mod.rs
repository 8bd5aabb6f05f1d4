//! Storage layer
//!
//! Uses SQLite (embedded). The store is the only resource shared across
//! requests; handlers never cache records between requests.

pub mod db;

pub use db::Database;
