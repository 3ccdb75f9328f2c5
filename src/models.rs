use std::fmt;

use chrono::{DateTime, Utc};

/// Number of characters shown when a post or comment is displayed inline.
pub const NUMBER_OF_CHAR: usize = 15;

fn preview(text: &str) -> &str {
    match text.char_indices().nth(NUMBER_OF_CHAR) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(preview(&self.text))
    }
}

/// A post joined with its author and group, as listed in every feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedPost {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: i64,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(preview(&self.text))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_with_text(text: &str) -> Post {
        Post {
            id: 1,
            text: text.to_string(),
            pub_date: Utc::now(),
            author_id: 1,
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn post_display_is_truncated() {
        let post = post_with_text("Тестовый текст поста");
        assert_eq!(post.to_string(), "Тестовый текст ");
        assert_eq!(post.to_string().chars().count(), NUMBER_OF_CHAR);
    }

    #[test]
    fn short_post_display_is_whole_text() {
        assert_eq!(post_with_text("short").to_string(), "short");
    }

    #[test]
    fn group_display_is_title() {
        let group = Group {
            id: 1,
            title: "Тестовое название группы".into(),
            slug: "test-slug".into(),
            description: "Тестовое описание группы".into(),
        };
        assert_eq!(group.to_string(), group.title);
    }

    #[test]
    fn comment_display_is_truncated() {
        let comment = Comment {
            id: 1,
            text: "A comment that is quite long".into(),
            created: Utc::now(),
            post_id: 1,
            author_id: 1,
        };
        assert_eq!(comment.to_string(), "A comment that ");
    }
}
