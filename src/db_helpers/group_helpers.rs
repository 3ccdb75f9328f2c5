use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Group};

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

pub async fn create_group_in_db(pool: &SqlitePool, group: &NewGroup) -> Result<Group, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Group>(
        r#"
        INSERT INTO post_groups (title, slug, description)
        VALUES ($1, $2, $3)
        RETURNING id, title, slug, description
        "#,
    )
    .bind(&group.title)
    .bind(&group.slug)
    .bind(&group.description)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_group_by_slug_in_db(pool: &SqlitePool, slug: &str) -> Result<Group, RequestError> {
    sqlx::query_as::<Sqlite, Group>(
        "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(RequestError::NotFound)
}

pub async fn get_group_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Group>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Group>(
        "SELECT id, title, slug, description FROM post_groups WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}

pub async fn list_groups_in_db(pool: &SqlitePool) -> Result<Vec<Group>, RequestError> {
    let result = sqlx::query_as::<Sqlite, Group>(
        "SELECT id, title, slug, description FROM post_groups ORDER BY title",
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}

/// Deletes a group. Its posts stay, with their group cleared.
pub async fn delete_group_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM post_groups WHERE id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    tx.commit().await?;
    Ok(())
}
