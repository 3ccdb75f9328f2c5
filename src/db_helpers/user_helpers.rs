use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

use super::{is_unique_violation, USER_COLUMNS};

/// A user ready to be stored; `password` is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InsertUserError {
    #[error("A user with that username already exists.")]
    UsernameTaken,
    #[error(transparent)]
    Request(#[from] RequestError),
}

pub async fn insert_user(pool: &SqlitePool, user: &NewUser) -> Result<User, InsertUserError> {
    let mut tx = pool.begin().await.map_err(RequestError::from)?;
    let query = format!(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    );
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password)
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await;
    let user = match result {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => return Err(InsertUserError::UsernameTaken),
        Err(e) => return Err(RequestError::from(e).into()),
    };
    tx.commit().await.map_err(RequestError::from)?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user)
}

/// Removes a user together with their posts, comments and follow edges.
pub async fn delete_user_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    tx.commit().await?;
    Ok(())
}
