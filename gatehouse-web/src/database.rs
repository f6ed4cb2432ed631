//! SQLite persistence for accounts and sessions

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use gatehouse_core::{
    duplicate_error, storage_error, CredentialStore, DatabaseConfig, GatehouseError,
    GatehouseResult, NewUser, Role, SessionRecord, SessionStore, User, UserId,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::str::FromStr;
use tracing::{debug, info};

const USER_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL,
        user_role TEXT NOT NULL
    )
"#;

const SESSION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS session (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        user_role TEXT NOT NULL,
        created_at TEXT NOT NULL,
        last_seen TEXT NOT NULL
    )
"#;

const SESSION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_session_last_seen ON session(last_seen)";

/// Open a connection pool for `config.url`, creating the file if missing
pub async fn connect(config: &DatabaseConfig) -> GatehouseResult<SqlitePool> {
    info!("Connecting to database: {}", config.url);

    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| GatehouseError::storage("Invalid database URL", "database", e))?
        .create_if_missing(true);

    // Every connection to `:memory:` opens its own empty database, so an
    // in-memory pool is pinned to a single connection that never recycles.
    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| GatehouseError::storage("Failed to connect to database", "database", e))?;

    debug!("Database connection established");
    Ok(pool)
}

/// Create the `user` and `session` tables; safe to run repeatedly
pub async fn init_schema(pool: &SqlitePool) -> GatehouseResult<()> {
    for statement in [USER_TABLE, SESSION_TABLE, SESSION_INDEX] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| GatehouseError::storage("Failed to create tables", "database", e))?;
    }

    info!("Database schema ready");
    Ok(())
}

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> GatehouseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| GatehouseError::storage("Malformed timestamp in session table", "database", e))
}

fn decode_role(raw: &str) -> GatehouseResult<Role> {
    Role::from_str(raw).map_err(|message| storage_error!(message, "database"))
}

/// Accounts in the `user` table
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &SqliteRow) -> GatehouseResult<User> {
        let read = |e| GatehouseError::storage("Failed to read user row", "credential_store", e);
        let role: String = row.try_get("user_role").map_err(read)?;

        Ok(User {
            id: UserId(row.try_get("id").map_err(read)?),
            username: row.try_get("username").map_err(read)?,
            password_hash: row.try_get("password").map_err(read)?,
            role: decode_role(&role)?,
        })
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_username(&self, username: &str) -> GatehouseResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, password, user_role FROM user WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatehouseError::storage("Failed to look up user", "credential_store", e))?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> GatehouseResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, password, user_role FROM user WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatehouseError::storage("Failed to look up user", "credential_store", e))?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn insert(&self, user: NewUser) -> GatehouseResult<User> {
        let result = sqlx::query("INSERT INTO user (username, password, user_role) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => duplicate_error!(
                    format!("username '{}' already exists", user.username),
                    "credential_store"
                ),
                other => {
                    GatehouseError::storage("Failed to insert user", "credential_store", other)
                }
            })?;

        debug!("User inserted: {}", user.username);
        Ok(User {
            id: UserId(result.last_insert_rowid()),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        })
    }

    async fn count(&self) -> GatehouseResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GatehouseError::storage("Failed to count users", "credential_store", e))?;

        Ok(count as u64)
    }
}

/// Sessions in the `session` table
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &SqliteRow) -> GatehouseResult<SessionRecord> {
        let read = |e| GatehouseError::storage("Failed to read session row", "session_store", e);
        let role: String = row.try_get("user_role").map_err(read)?;
        let created_at: String = row.try_get("created_at").map_err(read)?;
        let last_seen: String = row.try_get("last_seen").map_err(read)?;

        Ok(SessionRecord {
            token: row.try_get("token").map_err(read)?,
            user_id: UserId(row.try_get("user_id").map_err(read)?),
            role: decode_role(&role)?,
            created_at: decode_timestamp(&created_at)?,
            last_seen: decode_timestamp(&last_seen)?,
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert(&self, record: SessionRecord) -> GatehouseResult<()> {
        sqlx::query(
            "INSERT INTO session (token, user_id, user_role, created_at, last_seen) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.token)
        .bind(record.user_id.0)
        .bind(record.role.as_str())
        .bind(encode_timestamp(record.created_at))
        .bind(encode_timestamp(record.last_seen))
        .execute(&self.pool)
        .await
        .map_err(|e| GatehouseError::storage("Failed to insert session", "session_store", e))?;

        Ok(())
    }

    async fn get(&self, token: &str) -> GatehouseResult<Option<SessionRecord>> {
        let row = sqlx::query(
            "SELECT token, user_id, user_role, created_at, last_seen FROM session WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatehouseError::storage("Failed to look up session", "session_store", e))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn touch(&self, token: &str, at: DateTime<Utc>) -> GatehouseResult<()> {
        sqlx::query("UPDATE session SET last_seen = ? WHERE token = ?")
            .bind(encode_timestamp(at))
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| GatehouseError::storage("Failed to refresh session", "session_store", e))?;

        Ok(())
    }

    async fn remove(&self, token: &str) -> GatehouseResult<bool> {
        let result = sqlx::query("DELETE FROM session WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| GatehouseError::storage("Failed to delete session", "session_store", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_idle_since(&self, cutoff: DateTime<Utc>) -> GatehouseResult<u64> {
        let result = sqlx::query("DELETE FROM session WHERE last_seen < ?")
            .bind(encode_timestamp(cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| GatehouseError::storage("Failed to purge sessions", "session_store", e))?;

        Ok(result.rows_affected())
    }
}
