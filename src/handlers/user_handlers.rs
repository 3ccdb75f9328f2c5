use std::sync::Arc;

use axum::{
    extract::Query,
    response::{IntoResponse, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use validator::Validate;

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, SESSION_COOKIE,
    },
    csrf::{generate_csrf_token, CSRF_COOKIE},
    data_formats::{
        login_form_fields, signup_form_fields, FormContext, FormErrors, LoginForm, LoginFormData,
        LoginPage, LoginQuery, Rendered, SignupForm, SignupFormData, SignupPage, StaticPage,
        NON_FIELD_ERRORS,
    },
    db_helpers::{get_user_by_username, insert_user, InsertUserError, NewUser},
    errors::{found, RequestError},
    AppState,
};

const LOGIN_TEMPLATE: &str = "users/login.html";
const SIGNUP_TEMPLATE: &str = "users/signup.html";
const LOGGED_OUT_TEMPLATE: &str = "users/logged_out.html";

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Only same-site paths are followed after login. Browsers read `/\` as
/// `//`, a scheme-relative URL, and drop control characters.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(char::is_control)
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, value)
        .path("/")
        .http_only(true)
        .finish()
}

fn csrf_cookie(value: String) -> Cookie<'static> {
    Cookie::build(CSRF_COOKIE, value).path("/").finish()
}

// ----------------- Signup Handlers -----------------

fn signup_page(data: SignupFormData, errors: FormErrors) -> Rendered<SignupPage> {
    Rendered::new(
        SIGNUP_TEMPLATE,
        SignupPage {
            form: FormContext {
                fields: signup_form_fields(),
                data,
                errors,
            },
        },
    )
}

pub async fn signup_form() -> Rendered<SignupPage> {
    signup_page(SignupFormData::default(), FormErrors::default())
}

pub async fn signup(
    Extension(app): Extension<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Response, RequestError> {
    let data = SignupFormData {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        username: form.username.clone(),
        email: form.email.clone(),
    };
    if let Err(e) = form.validate() {
        return Ok(signup_page(data, FormErrors::from(e)).into_response());
    }

    let password = hash_password_argon2(form.password1).await.map_err(|e| {
        tracing::error!(error = %e, "failed to hash password");
        RequestError::ServerError
    })?;
    let new_user = NewUser {
        username: form.username.trim().to_string(),
        email: form.email,
        first_name: form.first_name,
        last_name: form.last_name,
        password,
    };
    match insert_user(&app.pool, &new_user).await {
        Ok(_) => Ok(found("/")),
        Err(InsertUserError::UsernameTaken) => {
            let mut errors = FormErrors::default();
            errors.add("username", InsertUserError::UsernameTaken.to_string());
            Ok(signup_page(data, errors).into_response())
        }
        Err(InsertUserError::Request(e)) => Err(e),
    }
}

// ----------------- Login Handlers -----------------

fn login_page(username: String, errors: FormErrors, next: Option<String>) -> Rendered<LoginPage> {
    Rendered::new(
        LOGIN_TEMPLATE,
        LoginPage {
            form: FormContext {
                fields: login_form_fields(),
                data: LoginFormData { username },
                errors,
            },
            next,
        },
    )
}

pub async fn login_form(Query(LoginQuery { next }): Query<LoginQuery>) -> Rendered<LoginPage> {
    login_page(String::new(), FormErrors::default(), next)
}

pub async fn login(
    Extension(app): Extension<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, RequestError> {
    if let Err(e) = form.validate() {
        return Ok(login_page(form.username, FormErrors::from(e), form.next).into_response());
    }

    let user = get_user_by_username(&app.pool, &form.username).await?;
    let verified = match &user {
        Some(user) => verify_password_argon2(form.password, &user.password)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to verify password");
                RequestError::ServerError
            })?,
        None => false,
    };
    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::info!(username = %form.username, "failed login");
            let mut errors = FormErrors::default();
            errors.add(NON_FIELD_ERRORS, INVALID_LOGIN);
            return Ok(login_page(form.username, errors, form.next).into_response());
        }
    };

    let token = get_jwt_token(&app.config.jwt_secret, user.id).map_err(|e| {
        tracing::error!(error = %e, "failed to issue session token");
        RequestError::ServerError
    })?;
    let jar = jar
        .add(session_cookie(token))
        .add(csrf_cookie(generate_csrf_token()));
    tracing::info!(user_id = user.id, "logged in");
    Ok((jar, found(safe_next(form.next.as_deref()))).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar
        .remove(session_cookie(String::new()))
        .remove(csrf_cookie(String::new()));
    (
        jar,
        Rendered::new(LOGGED_OUT_TEMPLATE, StaticPage::default()),
    )
}
