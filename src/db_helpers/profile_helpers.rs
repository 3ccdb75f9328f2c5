use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{Follow, User},
};

use super::{get_author_or_404, USER_COLUMNS};

/// What a follow request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    SelfFollow,
}

pub async fn is_following_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    author_id: i64,
) -> Result<bool, RequestError> {
    Ok(get_follow_in_db(pool, follower_id, author_id).await?.is_some())
}

pub async fn get_follow_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    author_id: i64,
) -> Result<Option<Follow>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Follow>(
        "SELECT id, user_id, author_id FROM follows WHERE user_id = $1 AND author_id = $2",
    )
    .bind(follower_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}

/// Loads the profile owner and whether `viewer_id` follows them.
pub async fn get_profile_by_username_in_db(
    pool: &SqlitePool,
    viewer_id: Option<i64>,
    username: &str,
) -> Result<(User, bool), RequestError> {
    let author = get_author_or_404(pool, username).await?;
    let following = match viewer_id {
        Some(id) => is_following_in_db(pool, id, author.id).await?,
        None => false,
    };
    Ok((author, following))
}

pub async fn follow_user_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    username: &str,
) -> Result<(User, FollowOutcome), RequestError> {
    let author = get_author_or_404(pool, username).await?;
    if author.id == follower_id {
        return Ok((author, FollowOutcome::SelfFollow));
    }

    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO follows (user_id, author_id)
        VALUES ($1, $2)
        "#,
    )
    .bind(follower_id)
    .bind(author.id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    let outcome = if result.rows_affected() == 0 {
        FollowOutcome::AlreadyFollowing
    } else {
        tracing::info!(follower_id, author_id = author.id, "follow created");
        FollowOutcome::Followed
    };
    Ok((author, outcome))
}

/// Returns the author and whether an edge was actually removed.
pub async fn unfollow_user_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    username: &str,
) -> Result<(User, bool), RequestError> {
    let author = get_author_or_404(pool, username).await?;

    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        DELETE FROM follows WHERE user_id = $1 AND author_id = $2
        "#,
    )
    .bind(follower_id)
    .bind(author.id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    let removed = result.rows_affected() > 0;
    if removed {
        tracing::info!(follower_id, author_id = author.id, "follow removed");
    }
    Ok((author, removed))
}

/// Users following `user_id`.
pub async fn followers_of_in_db(pool: &SqlitePool, user_id: i64) -> Result<Vec<User>, RequestError> {
    let query = format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE id IN (SELECT user_id FROM follows WHERE author_id = $1)
        ORDER BY username
        "#
    );
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(result)
}

/// Authors `user_id` follows.
pub async fn following_of_in_db(pool: &SqlitePool, user_id: i64) -> Result<Vec<User>, RequestError> {
    let query = format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE id IN (SELECT author_id FROM follows WHERE user_id = $1)
        ORDER BY username
        "#
    );
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(result)
}
