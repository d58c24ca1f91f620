use crate::config::Config;
use crate::db::models::{Address, NewAddress, NewUser, Role, User};
use crate::db::schema::SQLITE_INIT;
use crate::error::UserError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, warn};

pub type SqlitePool = Pool<Sqlite>;

const USER_SELECT_SQL: &str = r#"
    SELECT u.id, u.email, u.first_name, u.last_name, u.role,
           a.id AS address_id, a.street, a.city, a.province
    FROM users u
    JOIN address a ON a.id = u.address_id"#;

/// Handle to the user/address tables. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `cfg.database_url`, creating the file if needed.
    pub async fn connect(cfg: &Config) -> Result<Self, UserError> {
        let connect_opts = SqliteConnectOptions::from_str(cfg.database_url.as_str())?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections.max(1))
            .connect_with(connect_opts)
            .await?;
        debug!(database_url = %cfg.database_url, "user store connected");
        Ok(Self::new(pool))
    }

    /// Private in-memory database. A single connection is kept alive for the
    /// pool's lifetime, since each SQLite memory connection is its own database.
    pub async fn connect_in_memory() -> Result<Self, UserError> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await?;
        Ok(Self::new(pool))
    }

    /// Close every pooled connection; later calls fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), UserError> {
        // execute multiple statements one by one; sqlx::query runs a single statement
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert one address row and return it with its generated id.
    pub async fn insert_address(&self, address: &NewAddress) -> Result<Address, UserError> {
        let mut conn = self.pool.acquire().await?;
        insert_address_row(&mut conn, address)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to insert address"))
    }

    /// Insert the address and then the user referencing it, in one transaction.
    ///
    /// On failure nothing is committed and the error carries the attempted
    /// payload with the password redacted.
    pub async fn insert_user(&self, user: &NewUser) -> Result<User, UserError> {
        let result = self.insert_user_tx(user).await;
        if let Err(e) = &result {
            warn!(email = %user.email, error = %e, "failed to insert user");
        }
        result.map_err(|e| e.with_attempted(user))
    }

    async fn insert_user_tx(&self, user: &NewUser) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await?;

        let address = insert_address_row(&mut tx, &user.address).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password, first_name, last_name, address_id, role)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, email, first_name, last_name, role
            "#,
        )
        .bind(&user.email)
        .bind(user.password.expose())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(address.id)
        .bind(user.role.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| UserError::storage("insert into users returned no row"))?;

        let id: i64 = row.try_get("id")?;
        let role_str: String = row.try_get("role")?;
        let created = User {
            id,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: parse_role(&role_str)?,
            address,
        };

        tx.commit().await?;
        debug!(id, email = %created.email, "user inserted");
        Ok(created)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!("{USER_SELECT_SQL} WHERE u.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_model).transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!("{USER_SELECT_SQL} WHERE u.email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_model).transpose()
    }

    /// Case-insensitive `LIKE` match on either name column, ordered by id.
    pub async fn get_users_with_name_like(
        &self,
        first_name_pattern: &str,
        last_name_pattern: &str,
    ) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query(&format!(
            "{USER_SELECT_SQL}
             WHERE lower(u.first_name) LIKE lower(?)
                OR lower(u.last_name) LIKE lower(?)
             ORDER BY u.id"
        ))
        .bind(first_name_pattern)
        .bind(last_name_pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query(&format!("{USER_SELECT_SQL} ORDER BY u.id"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    /// Rename the first user whose first name equals `current`.
    pub async fn update_first_name(
        &self,
        current: &str,
        new_first_name: &str,
    ) -> Result<Option<User>, UserError> {
        let rec: Option<(i64,)> = sqlx::query_as(
            r#"UPDATE users SET first_name = ?
               WHERE id = (SELECT id FROM users WHERE first_name = ? ORDER BY id LIMIT 1)
               RETURNING id"#,
        )
        .bind(new_first_name)
        .bind(current)
        .fetch_optional(&self.pool)
        .await?;
        match rec {
            Some((id,)) => self.get_user_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Upsert by unique email: a new user is inserted with a fresh address,
    /// an existing one only gets its first name replaced.
    /// Uses SQLite `INSERT ... ON CONFLICT(email) DO UPDATE`.
    ///
    /// The transaction opens with a write so that a concurrent writer makes it
    /// wait on the busy timeout instead of failing on a stale read snapshot.
    pub async fn upsert_first_name_by_email(&self, user: &NewUser) -> Result<User, UserError> {
        let mut tx = self.pool.begin().await?;

        let fresh = insert_address_row(&mut tx, &user.address).await?;

        let (id, address_id): (i64, i64) = sqlx::query_as(
            r#"
            INSERT INTO users (email, password, first_name, last_name, address_id, role)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET first_name = excluded.first_name
            RETURNING id, address_id
            "#,
        )
        .bind(&user.email)
        .bind(user.password.expose())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(fresh.id)
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        // existing user kept its address; drop the one written for the insert path
        if address_id != fresh.id {
            sqlx::query("DELETE FROM address WHERE id = ?")
                .bind(fresh.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_user_by_id(id)
            .await?
            .ok_or(UserError::Consistency { id })
    }

    /// Delete one user by email and return what was removed. The address row stays.
    pub async fn delete_user_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"DELETE FROM users WHERE email = ?
               RETURNING id, email, first_name, last_name, role, address_id"#,
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let address_id: i64 = row.try_get("address_id")?;
        let address: Address =
            sqlx::query_as("SELECT id, street, city, province FROM address WHERE id = ?")
                .bind(address_id)
                .fetch_one(&mut *tx)
                .await?;
        let role_str: String = row.try_get("role")?;
        let user = User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: parse_role(&role_str)?,
            address,
        };
        tx.commit().await?;
        Ok(Some(user))
    }

    pub async fn count_users_with_email(&self, email: &str) -> Result<i64, UserError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn count_addresses(&self) -> Result<i64, UserError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM address")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    /// Bulk delete every user. Returns the number of rows removed.
    pub async fn delete_all_users(&self) -> Result<u64, UserError> {
        let done = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    /// Bulk delete every address. Fails while any user still references one.
    pub async fn delete_all_addresses(&self) -> Result<u64, UserError> {
        let done = sqlx::query("DELETE FROM address").execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    fn row_to_model(row: SqliteRow) -> Result<User, UserError> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: parse_role(&role_str)?,
            address: Address {
                id: row.try_get("address_id")?,
                street: row.try_get("street")?,
                city: row.try_get("city")?,
                province: row.try_get("province")?,
            },
        })
    }
}

async fn insert_address_row(
    conn: &mut SqliteConnection,
    address: &NewAddress,
) -> Result<Address, UserError> {
    let inserted: Option<Address> = sqlx::query_as(
        r#"INSERT INTO address (street, city, province)
           VALUES (?, ?, ?)
           RETURNING id, street, city, province"#,
    )
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.province)
    .fetch_optional(&mut *conn)
    .await?;
    inserted.ok_or_else(|| UserError::storage("insert into address returned no row"))
}

fn parse_role(value: &str) -> Result<Role, UserError> {
    value
        .parse()
        .map_err(|e: String| UserError::storage(format!("invalid persisted role: {e}")))
}
