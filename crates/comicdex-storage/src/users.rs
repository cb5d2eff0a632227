use comicdex_core::domain::User;
use comicdex_core::error::{Error, Result};
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
struct UserRow {
    username: String,
    role: i64,
    pass_hash: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            username: row.username,
            role: row.role,
            pass_hash: row.pass_hash,
        }
    }
}

/// `users(username PRIMARY KEY, role, pass_hash)`. Read-only from the
/// core's perspective; provisioning happens outside the HTTP surface.
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl comicdex_core::interfaces::UserRepository for SqliteUserStore {
    async fn by_username(&self, username: &str) -> Result<User> {
        log::debug!("[ user.by_username ] fetching user '{username}'");

        let row: Option<UserRow> = sqlx::query_as("SELECT username, role, pass_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                log::error!("[ user.by_username ] failed to query user '{username}': {err}");
                Error::internal(err)
            })?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                log::debug!("[ user.by_username ] user '{username}' not found");
                Err(Error::NotFound)
            }
        }
    }
}
