use serde::Serialize;

use crate::media::media_url;
use crate::models::{CommentWithAuthor, FeedPost, Group, User};
use crate::pagination::Page;

use super::wrapper::{FormErrors, FormField};

// ----------------- Shared pieces -----------------

#[derive(Serialize, Debug, Clone)]
pub struct AuthorResponse {
    pub username: String,
    pub full_name: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct GroupResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct PostResponse {
    pub id: i64,
    pub text: String,
    pub pub_date: String,
    pub image: Option<String>,
    pub author: AuthorResponse,
    pub group: Option<GroupRef>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub created: String,
    pub post_id: i64,
    pub author: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ProfileResponse {
    pub username: String,
    pub full_name: String,
    pub posts_count: i64,
    pub followers_count: usize,
    pub following_count: usize,
}

impl From<FeedPost> for PostResponse {
    fn from(
        FeedPost {
            id,
            text,
            pub_date,
            image,
            author_username,
            author_first_name,
            author_last_name,
            group_id,
            group_slug,
            group_title,
            ..
        }: FeedPost,
    ) -> Self {
        let group = match (group_id, group_slug, group_title) {
            (Some(id), Some(slug), Some(title)) => Some(GroupRef { id, slug, title }),
            _ => None,
        };
        PostResponse {
            id,
            text,
            pub_date: pub_date.to_rfc3339(),
            image: image.as_deref().map(media_url),
            author: AuthorResponse {
                full_name: format!("{author_first_name} {author_last_name}")
                    .trim()
                    .to_string(),
                username: author_username,
            },
            group,
        }
    }
}

impl From<Group> for GroupResponse {
    fn from(
        Group {
            id,
            title,
            slug,
            description,
        }: Group,
    ) -> Self {
        GroupResponse {
            id,
            title,
            slug,
            description,
        }
    }
}

impl From<CommentWithAuthor> for CommentResponse {
    fn from(comment: CommentWithAuthor) -> Self {
        CommentResponse {
            id: comment.id,
            text: comment.text,
            created: comment.created.to_rfc3339(),
            post_id: comment.post_id,
            author: comment.author_username,
        }
    }
}

impl ProfileResponse {
    pub fn new(
        user: &User,
        posts_count: i64,
        followers_count: usize,
        following_count: usize,
    ) -> Self {
        ProfileResponse {
            username: user.username.clone(),
            full_name: user.full_name(),
            posts_count,
            followers_count,
            following_count,
        }
    }
}

// ----------------- Pages -----------------

#[derive(Serialize, Debug)]
pub struct FeedPage {
    pub page_obj: Page<PostResponse>,
}

#[derive(Serialize, Debug)]
pub struct GroupPage {
    pub group: GroupResponse,
    pub page_obj: Page<PostResponse>,
}

#[derive(Serialize, Debug)]
pub struct ProfilePage {
    pub author: ProfileResponse,
    pub following: bool,
    pub page_obj: Page<PostResponse>,
}

#[derive(Serialize, Debug)]
pub struct FormContext<T> {
    pub fields: Vec<FormField>,
    pub data: T,
    pub errors: FormErrors,
}

#[derive(Serialize, Debug, Default)]
pub struct CommentFormData {
    pub text: String,
}

#[derive(Serialize, Debug)]
pub struct PostDetailPage {
    pub post: PostResponse,
    pub title: String,
    pub author_posts_count: i64,
    pub comments: Vec<CommentResponse>,
    pub form: FormContext<CommentFormData>,
    pub csrf_token: Option<String>,
}

#[derive(Serialize, Debug, Default)]
pub struct PostFormData {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct PostFormPage {
    pub form: FormContext<PostFormData>,
    pub groups: Vec<GroupResponse>,
    pub is_edit: bool,
    pub post_id: Option<i64>,
    pub csrf_token: Option<String>,
}

#[derive(Serialize, Debug, Default)]
pub struct LoginFormData {
    pub username: String,
}

#[derive(Serialize, Debug)]
pub struct LoginPage {
    pub form: FormContext<LoginFormData>,
    pub next: Option<String>,
}

#[derive(Serialize, Debug, Default)]
pub struct SignupFormData {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

#[derive(Serialize, Debug)]
pub struct SignupPage {
    pub form: FormContext<SignupFormData>,
}

#[derive(Serialize, Debug, Default)]
pub struct StaticPage {}

pub fn post_form_fields() -> Vec<FormField> {
    vec![
        FormField::char_field("text", true),
        FormField {
            name: "group",
            kind: "ModelChoiceField",
            required: false,
        },
        FormField {
            name: "image",
            kind: "ImageField",
            required: false,
        },
    ]
}

pub fn comment_form_fields() -> Vec<FormField> {
    vec![FormField::char_field("text", true)]
}

pub fn login_form_fields() -> Vec<FormField> {
    vec![
        FormField::char_field("username", true),
        FormField::char_field("password", true),
    ]
}

pub fn signup_form_fields() -> Vec<FormField> {
    vec![
        FormField::char_field("first_name", false),
        FormField::char_field("last_name", false),
        FormField::char_field("username", true),
        FormField {
            name: "email",
            kind: "EmailField",
            required: false,
        },
        FormField::char_field("password1", true),
        FormField::char_field("password2", true),
    ]
}
