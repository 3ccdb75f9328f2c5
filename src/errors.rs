use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::data_formats::{ErrorPage, Rendered};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("not found")]
    NotFound,
    #[error("not authorized: {0}")]
    NotAuthorized(&'static str),
    #[error("login required to access {0}")]
    LoginRequired(String),
    #[error("CSRF verification failed")]
    CsrfFailure,
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error("internal server error")]
    ServerError,
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub const LOGIN_URL: &str = "/auth/login/";

/// Builds `/auth/login/?next=<path>`, leaving slashes readable.
pub fn login_redirect_url(next: &str) -> String {
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("{LOGIN_URL}?next={next}")
}

/// 302 with a `Location` header, what the browser-facing flows expect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status_code, page) = match self {
            RequestError::NotFound => (
                StatusCode::NOT_FOUND,
                Rendered::new("core/404.html", ErrorPage::new("Not Found")),
            ),
            RequestError::NotAuthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Rendered::new("core/401.html", ErrorPage::new(message)),
            ),
            RequestError::LoginRequired(next) => return found(&login_redirect_url(&next)),
            RequestError::CsrfFailure => (
                StatusCode::FORBIDDEN,
                Rendered::new("core/403csrf.html", ErrorPage::new("CSRF verification failed")),
            ),
            RequestError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Rendered::new("core/400.html", ErrorPage::new(message)),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Rendered::new("core/500.html", ErrorPage::new("Internal Server Error")),
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Rendered::new("core/500.html", ErrorPage::new("Internal Server Error")),
                )
            }
        };
        (status_code, Json(page)).into_response()
    }
}
