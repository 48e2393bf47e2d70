//! Repositories for database operations

use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::models::{CreateUserRequest, User, Username, UsernameWithUser};

pub mod payment;
pub mod product;
pub mod purchase;

pub use payment::PaymentRepository;
pub use product::ProductRepository;
pub use purchase::PurchaseRepository;

/// Load a user with aliases, purchases and payments
async fn load_user(
    conn: &mut SqliteConnection,
    id: i64,
    include_disabled: bool,
) -> DatabaseResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, display_name, is_disabled, created_at, updated_at
        FROM users
        WHERE id = ? AND (? OR is_disabled = FALSE)
        "#,
    )
    .bind(id)
    .bind(include_disabled)
    .fetch_optional(&mut *conn)
    .await?;

    match user {
        Some(user) => Ok(Some(with_relations(conn, user).await?)),
        None => Ok(None),
    }
}

async fn with_relations(conn: &mut SqliteConnection, mut user: User) -> DatabaseResult<User> {
    user.usernames = load_usernames(conn, user.id).await?;
    user.purchases = purchase::load_by_user(conn, user.id).await?;
    user.payments = payment::load_by_user(conn, user.id).await?;
    Ok(user)
}

async fn load_usernames(conn: &mut SqliteConnection, user_id: i64) -> DatabaseResult<Vec<Username>> {
    let usernames = sqlx::query_as::<_, Username>(
        r#"
        SELECT id, name, user_id, created_at, updated_at
        FROM usernames
        WHERE user_id = ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(usernames)
}

/// Whether an alias is already taken
pub(crate) async fn username_exists(conn: &mut SqliteConnection, name: &str) -> DatabaseResult<bool> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM usernames WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id.is_some())
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user together with its aliases
    pub async fn create(&self, payload: &CreateUserRequest) -> DatabaseResult<User> {
        info!("Creating new user: {}", payload.display_name);

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO users (display_name, is_disabled, created_at, updated_at) VALUES (?, FALSE, ?, ?)",
        )
        .bind(&payload.display_name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for name in &payload.usernames {
            sqlx::query(
                "INSERT INTO usernames (name, user_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(name)
            .bind(id)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut conn = self.pool.acquire().await?;
        load_user(&mut conn, id, true)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", id))
    }

    /// Get all enabled users
    pub async fn get_all(&self) -> DatabaseResult<Vec<User>> {
        let mut conn = self.pool.acquire().await?;
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, display_name, is_disabled, created_at, updated_at
            FROM users
            WHERE is_disabled = FALSE
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut loaded = Vec::with_capacity(users.len());
        for user in users {
            loaded.push(with_relations(&mut conn, user).await?);
        }

        Ok(loaded)
    }

    /// Find an enabled user by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        load_user(&mut conn, id, false).await
    }

    /// Find the user owning an alias
    pub async fn find_by_username(&self, name: &str) -> DatabaseResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        let user_id: Option<i64> = sqlx::query_scalar("SELECT user_id FROM usernames WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        match user_id {
            Some(user_id) => load_user(&mut conn, user_id, true).await,
            None => Ok(None),
        }
    }

    /// Soft-delete a user; purchases and payments stay queryable by id
    pub async fn disable(&self, id: i64) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE users SET is_disabled = TRUE, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("user", id));
        }

        info!("Disabled user {}", id);
        Ok(())
    }
}

/// Username repository for database operations
#[derive(Clone)]
pub struct UsernameRepository {
    pool: SqlitePool,
}

impl UsernameRepository {
    /// Create a new username repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all aliases
    pub async fn get_all(&self) -> DatabaseResult<Vec<Username>> {
        let usernames = sqlx::query_as::<_, Username>(
            r#"
            SELECT id, name, user_id, created_at, updated_at
            FROM usernames
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(usernames)
    }

    /// Find an alias by ID together with its owner
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<UsernameWithUser>> {
        let mut conn = self.pool.acquire().await?;
        let username = sqlx::query_as::<_, Username>(
            r#"
            SELECT id, name, user_id, created_at, updated_at
            FROM usernames
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(username) = username else {
            return Ok(None);
        };

        let user = load_user(&mut conn, username.user_id, true)
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", username.user_id))?;

        Ok(Some(UsernameWithUser { username, user }))
    }

    /// Append an alias to an existing user
    pub async fn add_to_user(&self, user_id: i64, name: &str) -> DatabaseResult<Username> {
        let mut tx = self.pool.begin().await?;

        let user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(DatabaseError::not_found("user", user_id));
        }

        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO usernames (name, user_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let username = sqlx::query_as::<_, Username>(
            r#"
            SELECT id, name, user_id, created_at, updated_at
            FROM usernames
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Added username {} to user {}", name, user_id);

        Ok(username)
    }

    /// Remove an alias
    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM usernames WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("username", id));
        }

        info!("Deleted username {}", id);
        Ok(())
    }
}
