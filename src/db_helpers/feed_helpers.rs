use sqlx::{Sqlite, SqlitePool};

use crate::errors::RequestError;
use crate::models::FeedPost;
use crate::pagination::{Page, Paginator};

/// Which posts a feed is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl FeedScope {
    fn binds(self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match self {
            FeedScope::All => (None, None, None),
            FeedScope::Group(id) => (Some(id), None, None),
            FeedScope::Author(id) => (None, Some(id), None),
            FeedScope::FollowedBy(id) => (None, None, Some(id)),
        }
    }
}

pub(crate) const FEED_SELECT: &str = r#"
            SELECT posts.id              AS "id",
                   posts.text            AS "text",
                   posts.pub_date        AS "pub_date",
                   posts.image           AS "image",
                   posts.author_id       AS "author_id",
                   users.username        AS "author_username",
                   users.first_name      AS "author_first_name",
                   users.last_name       AS "author_last_name",
                   posts.group_id        AS "group_id",
                   post_groups.slug      AS "group_slug",
                   post_groups.title     AS "group_title"
            FROM   posts
                JOIN users
                    ON posts.author_id = users.id
                LEFT JOIN post_groups
                    ON posts.group_id = post_groups.id
"#;

const FEED_FILTER: &str = r#"
            WHERE  ( posts.group_id = $1
                    OR $1 IS NULL )
                AND ( posts.author_id = $2
                    OR $2 IS NULL )
                AND ( $3 IS NULL
                    OR posts.author_id IN (SELECT follows.author_id
                                           FROM   follows
                                           WHERE  follows.user_id = $3) )
"#;

pub async fn count_feed_in_db(pool: &SqlitePool, scope: FeedScope) -> Result<i64, RequestError> {
    let (group_id, author_id, follower_id) = scope.binds();
    let query = format!("SELECT COUNT(*) FROM posts {FEED_FILTER}");
    let count = sqlx::query_scalar::<Sqlite, i64>(&query)
        .bind(group_id)
        .bind(author_id)
        .bind(follower_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn list_feed_in_db(
    pool: &SqlitePool,
    scope: FeedScope,
    limit: i64,
    offset: i64,
) -> Result<Vec<FeedPost>, RequestError> {
    let (group_id, author_id, follower_id) = scope.binds();
    let query = format!(
        "{FEED_SELECT} {FEED_FILTER} ORDER BY posts.pub_date DESC, posts.id DESC LIMIT $4 OFFSET $5"
    );
    let posts = sqlx::query_as::<Sqlite, FeedPost>(&query)
        .bind(group_id)
        .bind(author_id)
        .bind(follower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

/// Counts the feed, resolves the requested page and loads only that window.
pub async fn feed_page_in_db(
    pool: &SqlitePool,
    scope: FeedScope,
    per_page: u32,
    raw_page: Option<&str>,
) -> Result<Page<FeedPost>, RequestError> {
    let count = count_feed_in_db(pool, scope).await?;
    let window = Paginator::new(count.max(0) as u64, per_page).get_page(raw_page);
    let posts = list_feed_in_db(pool, scope, i64::from(window.limit), window.offset as i64).await?;
    tracing::debug!(?scope, page = window.number, count, "assembled feed page");
    Ok(Page::from_window(window, posts))
}
