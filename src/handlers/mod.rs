use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::data_formats::{ErrorPage, Rendered, StaticPage};

mod post_handlers;
mod profile_handlers;
mod user_handlers;

pub use post_handlers::*;
pub use profile_handlers::*;
pub use user_handlers::*;

pub const INDEX_TEMPLATE: &str = "posts/index.html";
pub const GROUP_TEMPLATE: &str = "posts/group_list.html";
pub const PROFILE_TEMPLATE: &str = "posts/profile.html";
pub const DETAIL_TEMPLATE: &str = "posts/post_detail.html";
pub const POST_FORM_TEMPLATE: &str = "posts/create_post.html";
pub const FOLLOW_TEMPLATE: &str = "posts/follow.html";

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// Serves an already serialized page context.
fn json_body(content: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        content,
    )
        .into_response()
}

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Rendered::new(
            "core/404.html",
            ErrorPage::with_path("Not Found", uri.path()),
        ),
    )
        .into_response()
}

// ----------------- About Handlers -----------------
pub async fn about_author() -> Rendered<StaticPage> {
    Rendered::new("about/author.html", StaticPage::default())
}

pub async fn about_tech() -> Rendered<StaticPage> {
    Rendered::new("about/tech.html", StaticPage::default())
}
