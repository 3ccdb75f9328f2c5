use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::errors::RequestError;
use crate::models::{FeedPost, Post};

use super::feed_helpers::FEED_SELECT;

const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id, image";

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Fields an edit may change. `image: None` keeps the stored image.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    NewPost {
        text,
        group_id,
        image,
    }: NewPost,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"
        INSERT INTO posts (text, pub_date, author_id, group_id, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {POST_COLUMNS}
        "#
    );
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(text)
        .bind(Utc::now())
        .bind(author_id)
        .bind(group_id)
        .bind(image)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    tracing::info!(post_id = post.id, author_id, "created post");
    Ok(post)
}

pub async fn get_post_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Post, RequestError> {
    let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
    sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RequestError::NotFound)
}

/// A single post with its author and group resolved.
pub async fn get_feed_post_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<FeedPost, RequestError> {
    let query = format!("{FEED_SELECT} WHERE posts.id = $1");
    sqlx::query_as::<Sqlite, FeedPost>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RequestError::NotFound)
}

/// Applies an edit on behalf of `author_id`. Only the post's author matches the
/// `WHERE` clause, anyone else gets `Ok(None)` and nothing changes.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    PostChanges {
        text,
        group_id,
        image,
    }: PostChanges,
) -> Result<Option<Post>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"
        UPDATE posts
        SET    text = $1,
               group_id = $2,
               image = COALESCE($3, image)
        WHERE  id = $4 AND author_id = $5
        RETURNING {POST_COLUMNS}
        "#
    );
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(text)
        .bind(group_id)
        .bind(image)
        .bind(post_id)
        .bind(author_id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    if post.is_some() {
        tracing::info!(post_id, author_id, "edited post");
    }
    Ok(post)
}

pub async fn delete_post_in_db(pool: &SqlitePool, post_id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    tx.commit().await?;
    Ok(())
}

pub async fn posts_count_for_author_in_db(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<i64, RequestError> {
    let count = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM posts WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_posts_in_db(pool: &SqlitePool) -> Result<i64, RequestError> {
    let count = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
