use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{Comment, CommentWithAuthor},
};

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    text: &str,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if post.is_none() {
        return Err(RequestError::NotFound);
    }

    let result = sqlx::query_as::<Sqlite, Comment>(
        r#"
        INSERT INTO comments (text, created, post_id, author_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, text, created, post_id, author_id
        "#,
    )
    .bind(text)
    .bind(Utc::now())
    .bind(post_id)
    .bind(author_id)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    tracing::info!(comment_id = result.id, post_id, author_id, "added comment");
    Ok(result)
}

pub async fn comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<CommentWithAuthor>, RequestError> {
    let result = sqlx::query_as::<Sqlite, CommentWithAuthor>(
        r#"
        SELECT comments.id,
               comments.text,
               comments.created,
               comments.post_id,
               comments.author_id,
               users.username AS "author_username"
        FROM   comments
            JOIN users
                ON comments.author_id = users.id
        WHERE  comments.post_id = $1
        ORDER  BY comments.created, comments.id
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn comments_count_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<i64, RequestError> {
    let count =
        sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
