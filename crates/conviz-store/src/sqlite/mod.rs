//! `SQLite` persistence: connection pool, schema migrations, repositories.

pub mod connection;
pub mod migrations;
pub mod repositories;
