//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and the caller-facing shapes
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the `UserStore` handle and its queries

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Address, NewAddress, NewUser, Password, Role, User};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, UserStore};
