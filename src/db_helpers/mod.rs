use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

mod comment_helpers;
mod feed_helpers;
mod group_helpers;
mod post_helpers;
mod profile_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use feed_helpers::*;
pub use group_helpers::*;
pub use post_helpers::*;
pub use profile_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password, created_at";

// ----------------- Helper Functions -----------------

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

/// Same as [`get_user_by_username`] but a missing user is a 404.
pub async fn get_author_or_404(pool: &SqlitePool, username: &str) -> Result<User, RequestError> {
    get_user_by_username(pool, username)
        .await?
        .ok_or(RequestError::NotFound)
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}
