//! SQL DDL for initializing the user store.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `address`: standalone rows, every text column defaults to `''`
/// - `users`: `address_id` references `address(id)`, `role` limited to
///   ADMIN/USER/GUEST and defaulting to USER
/// - `email_index`: unique index on `users.email`
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS address (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    street TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    province TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    password TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    address_id INTEGER NOT NULL REFERENCES address(id),
    role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('ADMIN', 'USER', 'GUEST'))
);

CREATE UNIQUE INDEX IF NOT EXISTS email_index ON users(email);
"#;
