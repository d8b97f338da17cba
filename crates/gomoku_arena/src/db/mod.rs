//! SQLite persistence for accounts, sessions and move logs.

mod models;
mod repository;
mod schema;

pub use repository::Repository;
