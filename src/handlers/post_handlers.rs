use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::{
    authentication::AuthUser,
    cache::CacheKey,
    csrf::{csrf_cookie_value, verify_csrf},
    data_formats::{
        comment_form_fields, post_form_fields, CommentForm, CommentFormData, CommentResponse,
        FeedPage, FormContext, FormErrors, GroupPage, GroupResponse, PageQuery, PostDetailPage,
        PostForm, PostFormData, PostFormPage, PostResponse, Rendered,
    },
    db_helpers::{
        add_comment_to_post_in_db, comments_for_post_in_db, create_post_in_db, feed_page_in_db,
        get_feed_post_by_id_in_db, get_group_by_id_in_db, get_group_by_slug_in_db,
        get_post_by_id_in_db, list_groups_in_db, posts_count_for_author_in_db, update_post_in_db,
        FeedScope, NewPost, PostChanges,
    },
    errors::{found, RequestError},
    media::{media_url, validate_image, MediaError},
    models::Post,
    pagination::requested_page,
    AppState,
};

use super::{
    json_body, post_detail_url, profile_url, DETAIL_TEMPLATE, GROUP_TEMPLATE, INDEX_TEMPLATE,
    POST_FORM_TEMPLATE,
};

const INVALID_GROUP_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

// ----------------- Feed Handlers -----------------

/// Global feed. The serialized page is cached as-is, so nothing in it may
/// depend on the viewer.
pub async fn index(
    Extension(app): Extension<Arc<AppState>>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<Response, RequestError> {
    let key = CacheKey::index_page(requested_page(page.as_deref()));
    if let Some(content) = app.cache.get(&key).await {
        tracing::debug!(key = key.as_str(), "index served from cache");
        return Ok(json_body(content));
    }

    let page_obj = feed_page_in_db(
        &app.pool,
        FeedScope::All,
        app.config.posts_per_page,
        page.as_deref(),
    )
    .await?;
    let rendered = Rendered::new(
        INDEX_TEMPLATE,
        FeedPage {
            page_obj: page_obj.map(PostResponse::from),
        },
    );
    let content = serde_json::to_string(&rendered).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize index page");
        RequestError::ServerError
    })?;
    app.cache
        .set(key, content.clone(), app.config.index_cache_ttl)
        .await;
    Ok(json_body(content))
}

pub async fn group_posts(
    Extension(app): Extension<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<Rendered<GroupPage>, RequestError> {
    let group = get_group_by_slug_in_db(&app.pool, &slug).await?;
    let page_obj = feed_page_in_db(
        &app.pool,
        FeedScope::Group(group.id),
        app.config.posts_per_page,
        page.as_deref(),
    )
    .await?;
    Ok(Rendered::new(
        GROUP_TEMPLATE,
        GroupPage {
            group: GroupResponse::from(group),
            page_obj: page_obj.map(PostResponse::from),
        },
    ))
}

// ----------------- Post Handlers -----------------

pub async fn post_detail(
    Extension(app): Extension<Arc<AppState>>,
    Path(post_id): Path<i64>,
    jar: CookieJar,
) -> Result<Rendered<PostDetailPage>, RequestError> {
    let post = get_feed_post_by_id_in_db(&app.pool, post_id).await?;
    let author_posts_count = posts_count_for_author_in_db(&app.pool, post.author_id).await?;
    let comments = comments_for_post_in_db(&app.pool, post_id)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    let title: String = post.text.chars().take(30).collect();

    Ok(Rendered::new(
        DETAIL_TEMPLATE,
        PostDetailPage {
            post: PostResponse::from(post),
            title,
            author_posts_count,
            comments,
            form: FormContext {
                fields: comment_form_fields(),
                data: CommentFormData::default(),
                errors: FormErrors::default(),
            },
            csrf_token: csrf_cookie_value(&jar),
        },
    ))
}

async fn render_post_form(
    app: &AppState,
    jar: &CookieJar,
    data: PostFormData,
    errors: FormErrors,
    editing: Option<i64>,
) -> Result<Rendered<PostFormPage>, RequestError> {
    let groups = list_groups_in_db(&app.pool)
        .await?
        .into_iter()
        .map(GroupResponse::from)
        .collect();
    Ok(Rendered::new(
        POST_FORM_TEMPLATE,
        PostFormPage {
            form: FormContext {
                fields: post_form_fields(),
                data,
                errors,
            },
            groups,
            is_edit: editing.is_some(),
            post_id: editing,
            csrf_token: csrf_cookie_value(jar),
        },
    ))
}

/// Checks everything but the CSRF token. Returns the resolved group id.
async fn validate_post_form(
    app: &AppState,
    form: &PostForm,
) -> Result<(Option<i64>, FormErrors), RequestError> {
    let mut errors = match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(e) => FormErrors::from(e),
    };
    let group_id = match form.group_id() {
        Ok(None) => None,
        Ok(Some(id)) => match get_group_by_id_in_db(&app.pool, id).await? {
            Some(group) => Some(group.id),
            None => {
                errors.add("group", INVALID_GROUP_CHOICE);
                None
            }
        },
        Err(()) => {
            errors.add("group", INVALID_GROUP_CHOICE);
            None
        }
    };
    if let Some(bytes) = &form.image {
        if let Err(e) = validate_image(bytes) {
            errors.add("image", e.to_string());
        }
    }
    Ok((group_id, errors))
}

async fn store_image(app: &AppState, image: Option<&[u8]>) -> Result<Option<String>, RequestError> {
    match image {
        None => Ok(None),
        Some(bytes) => match app.media.save_post_image(bytes).await {
            Ok(path) => Ok(Some(path)),
            Err(MediaError::InvalidImage) => Err(RequestError::BadRequest("Upload a valid image.")),
            Err(MediaError::Io(e)) => {
                tracing::error!(error = %e, "failed to store post image");
                Err(RequestError::ServerError)
            }
        },
    }
}

/// Drops an image stored for a post that never got saved.
async fn discard_image(app: &AppState, image: Option<&str>) {
    if let Some(relative) = image {
        if let Err(e) = app.media.remove(relative).await {
            tracing::warn!(error = %e, path = relative, "failed to remove orphaned image");
        }
    }
}

fn form_data(form: &PostForm) -> PostFormData {
    PostFormData {
        text: form.text.clone(),
        group: form.group.clone(),
        image: None,
    }
}

pub async fn post_create_form(
    Extension(app): Extension<Arc<AppState>>,
    _user: AuthUser,
    jar: CookieJar,
) -> Result<Rendered<PostFormPage>, RequestError> {
    render_post_form(&app, &jar, PostFormData::default(), FormErrors::default(), None).await
}

pub async fn post_create(
    Extension(app): Extension<Arc<AppState>>,
    user: AuthUser,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    let form = PostForm::from_multipart(multipart).await?;
    verify_csrf(&user, &jar, &headers, form.csrf_token.as_deref())?;

    let (group_id, errors) = validate_post_form(&app, &form).await?;
    if !errors.is_empty() {
        tracing::debug!(user = %user.username, ?errors, "post form rejected");
        return Ok(render_post_form(&app, &jar, form_data(&form), errors, None)
            .await?
            .into_response());
    }

    let image = store_image(&app, form.image.as_deref()).await?;
    let created = create_post_in_db(
        &app.pool,
        user.id,
        NewPost {
            text: form.text,
            group_id,
            image: image.clone(),
        },
    )
    .await;
    if let Err(e) = created {
        discard_image(&app, image.as_deref()).await;
        return Err(e);
    }
    Ok(found(&profile_url(&user.username)))
}

fn edit_form_data(post: &Post) -> PostFormData {
    PostFormData {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()),
        image: post.image.as_deref().map(media_url),
    }
}

pub async fn post_edit_form(
    Extension(app): Extension<Arc<AppState>>,
    user: AuthUser,
    jar: CookieJar,
    Path(post_id): Path<i64>,
) -> Result<Response, RequestError> {
    let post = get_post_by_id_in_db(&app.pool, post_id).await?;
    if post.author_id != user.id {
        return Ok(found(&post_detail_url(post_id)));
    }
    Ok(render_post_form(
        &app,
        &jar,
        edit_form_data(&post),
        FormErrors::default(),
        Some(post_id),
    )
    .await?
    .into_response())
}

pub async fn post_edit(
    Extension(app): Extension<Arc<AppState>>,
    user: AuthUser,
    jar: CookieJar,
    headers: HeaderMap,
    Path(post_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    let post = get_post_by_id_in_db(&app.pool, post_id).await?;
    if post.author_id != user.id {
        tracing::info!(post_id, user = %user.username, "refused edit by non-author");
        return Ok(found(&post_detail_url(post_id)));
    }

    let form = PostForm::from_multipart(multipart).await?;
    verify_csrf(&user, &jar, &headers, form.csrf_token.as_deref())?;

    let (group_id, errors) = validate_post_form(&app, &form).await?;
    if !errors.is_empty() {
        let mut data = form_data(&form);
        data.image = post.image.as_deref().map(media_url);
        return Ok(render_post_form(&app, &jar, data, errors, Some(post_id))
            .await?
            .into_response());
    }

    let image = store_image(&app, form.image.as_deref()).await?;
    let changes = PostChanges {
        text: form.text,
        group_id,
        image: image.clone(),
    };
    let error = match update_post_in_db(&app.pool, user.id, post_id, changes).await {
        Ok(Some(_)) => return Ok(found(&post_detail_url(post_id))),
        // the post changed hands or vanished between the check and the update
        Ok(None) => RequestError::NotFound,
        Err(e) => e,
    };
    discard_image(&app, image.as_deref()).await;
    Err(error)
}

// ----------------- Comment Handlers -----------------

pub async fn add_comment(
    Extension(app): Extension<Arc<AppState>>,
    user: AuthUser,
    jar: CookieJar,
    headers: HeaderMap,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response, RequestError> {
    get_post_by_id_in_db(&app.pool, post_id).await?;
    verify_csrf(&user, &jar, &headers, form.csrfmiddlewaretoken.as_deref())?;

    match form.validate() {
        Ok(()) => {
            add_comment_to_post_in_db(&app.pool, user.id, post_id, &form.text).await?;
        }
        Err(e) => {
            tracing::debug!(post_id, errors = ?FormErrors::from(e), "comment rejected");
        }
    }
    Ok(found(&post_detail_url(post_id)))
}

/// GET on the comment URL has nothing to submit, send the user to the post.
pub async fn comment_redirect(
    Extension(app): Extension<Arc<AppState>>,
    _user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Response, RequestError> {
    get_post_by_id_in_db(&app.pool, post_id).await?;
    Ok(found(&post_detail_url(post_id)))
}
