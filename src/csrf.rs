use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    authentication::{AuthUser, TokenSource},
    errors::RequestError,
};

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

const CSRF_TOKEN_LENGTH: usize = 32;

pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn csrf_cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(CSRF_COOKIE).map(|cookie| cookie.value().to_string())
}

/// Double-submit check for state-changing requests made with a cookie
/// session. The submitted token comes from the form field or the
/// `X-CSRFToken` header and must equal the `csrftoken` cookie.
pub fn verify_csrf(
    user: &AuthUser,
    jar: &CookieJar,
    headers: &HeaderMap,
    form_token: Option<&str>,
) -> Result<(), RequestError> {
    if user.source == TokenSource::Header {
        return Ok(());
    }
    let expected = match jar.get(CSRF_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value(),
        _ => {
            tracing::warn!(user = %user.username, "csrf cookie missing");
            return Err(RequestError::CsrfFailure);
        }
    };
    let submitted = form_token.or_else(|| {
        headers
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
    });
    match submitted {
        Some(token) if token == expected => Ok(()),
        _ => {
            tracing::warn!(user = %user.username, "csrf token mismatch");
            Err(RequestError::CsrfFailure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;

    fn user(source: TokenSource) -> AuthUser {
        AuthUser {
            id: 1,
            username: "auth".into(),
            source,
        }
    }

    fn jar_with_cookie(value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{CSRF_COOKIE}={value}")).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn header_auth_is_exempt() {
        let jar = CookieJar::from_headers(&HeaderMap::new());
        assert!(verify_csrf(&user(TokenSource::Header), &jar, &HeaderMap::new(), None).is_ok());
    }

    #[test]
    fn session_requires_matching_form_token() {
        let jar = jar_with_cookie("abc123");
        let session = user(TokenSource::Session);
        assert!(verify_csrf(&session, &jar, &HeaderMap::new(), Some("abc123")).is_ok());
        assert!(matches!(
            verify_csrf(&session, &jar, &HeaderMap::new(), Some("nope")),
            Err(RequestError::CsrfFailure)
        ));
        assert!(matches!(
            verify_csrf(&session, &jar, &HeaderMap::new(), None),
            Err(RequestError::CsrfFailure)
        ));
    }

    #[test]
    fn session_accepts_header_token() {
        let jar = jar_with_cookie("abc123");
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static("abc123"));
        assert!(verify_csrf(&user(TokenSource::Session), &jar, &headers, None).is_ok());
    }

    #[test]
    fn session_without_cookie_fails() {
        let jar = CookieJar::from_headers(&HeaderMap::new());
        assert!(matches!(
            verify_csrf(&user(TokenSource::Session), &jar, &HeaderMap::new(), Some("x")),
            Err(RequestError::CsrfFailure)
        ));
    }

    #[test]
    fn generated_tokens_are_distinct() {
        let a = generate_csrf_token();
        assert_eq!(a.len(), CSRF_TOKEN_LENGTH);
        assert_ne!(a, generate_csrf_token());
    }
}
