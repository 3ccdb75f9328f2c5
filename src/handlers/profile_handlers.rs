use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::Response,
    Extension,
};

use crate::{
    authentication::{AuthUser, MaybeUser},
    data_formats::{FeedPage, PageQuery, PostResponse, ProfilePage, ProfileResponse, Rendered},
    db_helpers::{
        feed_page_in_db, follow_user_in_db, followers_of_in_db, following_of_in_db,
        get_profile_by_username_in_db, posts_count_for_author_in_db, unfollow_user_in_db,
        FeedScope, FollowOutcome,
    },
    errors::{found, RequestError},
    AppState,
};

use super::{profile_url, FOLLOW_TEMPLATE, PROFILE_TEMPLATE};

// ----------------- Profile Handlers -----------------

pub async fn profile(
    Extension(app): Extension<Arc<AppState>>,
    maybe_user: MaybeUser,
    Path(username): Path<String>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<Rendered<ProfilePage>, RequestError> {
    let (author, following) =
        get_profile_by_username_in_db(&app.pool, maybe_user.get_id(), &username).await?;
    let posts_count = posts_count_for_author_in_db(&app.pool, author.id).await?;
    let followers = followers_of_in_db(&app.pool, author.id).await?;
    let followed = following_of_in_db(&app.pool, author.id).await?;
    let page_obj = feed_page_in_db(
        &app.pool,
        FeedScope::Author(author.id),
        app.config.posts_per_page,
        page.as_deref(),
    )
    .await?;

    Ok(Rendered::new(
        PROFILE_TEMPLATE,
        ProfilePage {
            author: ProfileResponse::new(&author, posts_count, followers.len(), followed.len()),
            following,
            page_obj: page_obj.map(PostResponse::from),
        },
    ))
}

pub async fn profile_follow(
    Extension(app): Extension<Arc<AppState>>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Response, RequestError> {
    let (author, outcome) = follow_user_in_db(&app.pool, user.id, &username).await?;
    if outcome == FollowOutcome::SelfFollow {
        tracing::debug!(user = %user.username, "ignored self-follow");
    }
    Ok(found(&profile_url(&author.username)))
}

pub async fn profile_unfollow(
    Extension(app): Extension<Arc<AppState>>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Response, RequestError> {
    let (author, _) = unfollow_user_in_db(&app.pool, user.id, &username).await?;
    Ok(found(&profile_url(&author.username)))
}

// ----------------- Follow Feed Handlers -----------------

pub async fn follow_index(
    Extension(app): Extension<Arc<AppState>>,
    user: AuthUser,
    Query(PageQuery { page }): Query<PageQuery>,
) -> Result<Rendered<FeedPage>, RequestError> {
    let page_obj = feed_page_in_db(
        &app.pool,
        FeedScope::FollowedBy(user.id),
        app.config.posts_per_page,
        page.as_deref(),
    )
    .await?;
    Ok(Rendered::new(
        FOLLOW_TEMPLATE,
        FeedPage {
            page_obj: page_obj.map(PostResponse::from),
        },
    ))
}
