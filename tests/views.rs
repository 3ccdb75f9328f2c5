mod common;

use common::{page_items, page_post_ids, spawn_app, POSTS_PER_PAGE};
use feedline::db_helpers::{
    add_comment_to_post_in_db, comments_count_for_post_in_db, count_posts_in_db,
    delete_group_in_db, delete_post_in_db, delete_user_in_db, follow_user_in_db,
    followers_of_in_db, following_of_in_db,
};
use reqwest::StatusCode;

const EXTRA_POSTS: u32 = 3;

#[tokio::test]
async fn index_shows_post_fields() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let group = app.create_group("test-slug").await;
    let post = app.create_post(&author, Some(&group), "Тестовый текст").await;

    let (_, body) = app.get_json("/", None).await;
    let first = &page_items(&body)[0];
    assert_eq!(first["id"], post.id);
    assert_eq!(first["text"], "Тестовый текст");
    assert_eq!(first["author"]["username"], "auth");
    assert_eq!(first["group"]["slug"], "test-slug");
    assert_eq!(first["image"], serde_json::Value::Null);
}

#[tokio::test]
async fn group_page_shows_group_and_only_its_posts() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let group = app.create_group("test-slug").await;
    let other = app.create_group("other-slug").await;
    let in_group = app.create_post(&author, Some(&group), "В группе").await;
    let elsewhere = app.create_post(&author, Some(&other), "В другой группе").await;
    app.create_post(&author, None, "Без группы").await;

    let (_, body) = app.get_json("/group/test-slug/", None).await;
    assert_eq!(body["group"]["title"], "Тестовое название группы");
    assert_eq!(body["group"]["slug"], "test-slug");
    assert_eq!(body["group"]["description"], "Тестовое описание группы");
    assert_eq!(page_post_ids(&body), vec![in_group.id]);

    let (_, body) = app.get_json("/group/other-slug/", None).await;
    assert_eq!(page_post_ids(&body), vec![elsewhere.id]);
}

#[tokio::test]
async fn profile_shows_author_and_counts() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let (other, _) = app.create_user("other").await;
    app.create_post(&author, None, "Первый").await;
    let latest = app.create_post(&author, None, "Второй").await;
    app.create_post(&other, None, "Чужой").await;

    let (_, body) = app.get_json("/profile/auth/", None).await;
    assert_eq!(body["author"]["username"], "auth");
    assert_eq!(body["author"]["posts_count"], 2);
    assert_eq!(body["following"], false);
    assert_eq!(page_post_ids(&body)[0], latest.id);
    assert_eq!(body["page_obj"]["count"], 2);
}

#[tokio::test]
async fn post_detail_shows_one_post() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let post = app
        .create_post(&author, None, "Очень длинный тестовый текст поста для заголовка")
        .await;

    let (_, body) = app.get_json(&format!("/posts/{}/", post.id), None).await;
    assert_eq!(body["post"]["id"], post.id);
    assert_eq!(body["author_posts_count"], 1);
    assert_eq!(body["title"].as_str().unwrap().chars().count(), 30);
    assert_eq!(body["form"]["fields"][0]["name"], "text");
    assert_eq!(body["comments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_form_lists_fields() {
    let app = spawn_app().await;
    let (_, token) = app.create_user("auth").await;
    app.create_group("test-slug").await;

    let (_, body) = app.get_json("/create/", Some(&token)).await;
    let kinds: Vec<(&str, &str)> = body["form"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| (f["name"].as_str().unwrap(), f["kind"].as_str().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("text", "CharField"),
            ("group", "ModelChoiceField"),
            ("image", "ImageField"),
        ]
    );
    assert_eq!(body["is_edit"], false);
    assert_eq!(body["groups"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn new_post_appears_first_where_it_belongs() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let group = app.create_group("test-slug").await;
    let other = app.create_group("other-slug").await;
    app.create_post(&author, Some(&group), "Старый пост").await;
    let post = app.create_post(&author, Some(&group), "Новый пост").await;

    for path in ["/", "/group/test-slug/", "/profile/auth/"] {
        let (_, body) = app.get_json(path, None).await;
        assert_eq!(page_post_ids(&body)[0], post.id, "{path}");
    }

    let (_, body) = app.get_json(&format!("/group/{}/", other.slug), None).await;
    assert!(!page_post_ids(&body).contains(&post.id));
}

#[tokio::test]
async fn feeds_are_paginated() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let (reader, reader_token) = app.create_user("reader").await;
    follow_user_in_db(&app.state.pool, reader.id, "auth")
        .await
        .unwrap();
    let group = app.create_group("test-slug").await;
    for i in 0..POSTS_PER_PAGE + EXTRA_POSTS {
        app.create_post(&author, Some(&group), &format!("Пост {i}"))
            .await;
    }

    for path in ["/", "/group/test-slug/", "/profile/auth/", "/follow/"] {
        let (status, body) = app.get_json(path, Some(&reader_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page_items(&body).len(), POSTS_PER_PAGE as usize, "{path}");
        assert_eq!(body["page_obj"]["has_next"], true);

        let (_, body) = app
            .get_json(&format!("{path}?page=2"), Some(&reader_token))
            .await;
        assert_eq!(page_items(&body).len(), EXTRA_POSTS as usize, "{path}");
        assert_eq!(body["page_obj"]["number"], 2);
        assert_eq!(body["page_obj"]["has_next"], false);
        assert_eq!(body["page_obj"]["previous_page_number"], 1);
    }
}

#[tokio::test]
async fn odd_page_numbers_are_forgiven() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    for i in 0..POSTS_PER_PAGE + EXTRA_POSTS {
        app.create_post(&author, None, &format!("Пост {i}")).await;
    }

    let (_, body) = app.get_json("/profile/auth/?page=abc", None).await;
    assert_eq!(body["page_obj"]["number"], 1);
    let (_, body) = app.get_json("/profile/auth/?page=99", None).await;
    assert_eq!(body["page_obj"]["number"], 2);
    let (_, body) = app.get_json("/profile/auth/?page=0", None).await;
    assert_eq!(body["page_obj"]["number"], 2);
}

#[tokio::test]
async fn empty_feed_has_a_single_empty_page() {
    let app = spawn_app().await;
    let (status, body) = app.get_json("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page_items(&body).is_empty());
    assert_eq!(body["page_obj"]["number"], 1);
    assert_eq!(body["page_obj"]["num_pages"], 1);
}

#[tokio::test]
async fn deleting_a_group_keeps_its_posts() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let group = app.create_group("test-slug").await;
    let post = app.create_post(&author, Some(&group), "Тестовый текст").await;

    delete_group_in_db(&app.state.pool, group.id).await.unwrap();

    let (status, _) = app.get_json("/group/test-slug/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get_json(&format!("/posts/{}/", post.id), None).await;
    assert_eq!(body["post"]["group"], serde_json::Value::Null);
}

#[tokio::test]
async fn deleting_an_author_removes_their_content() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let (reader, _) = app.create_user("reader").await;
    let own_post = app.create_post(&author, None, "Пост автора").await;
    let other_post = app.create_post(&reader, None, "Пост читателя").await;
    let pool = &app.state.pool;

    add_comment_to_post_in_db(pool, author.id, other_post.id, "Комментарий автора")
        .await
        .unwrap();
    add_comment_to_post_in_db(pool, reader.id, other_post.id, "Комментарий читателя")
        .await
        .unwrap();
    follow_user_in_db(pool, reader.id, "auth").await.unwrap();
    follow_user_in_db(pool, author.id, "reader").await.unwrap();

    delete_user_in_db(pool, author.id).await.unwrap();

    assert_eq!(count_posts_in_db(pool).await.unwrap(), 1);
    let (status, _) = app.get_json(&format!("/posts/{}/", own_post.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        comments_count_for_post_in_db(pool, other_post.id)
            .await
            .unwrap(),
        1
    );
    assert!(following_of_in_db(pool, reader.id).await.unwrap().is_empty());
    assert!(followers_of_in_db(pool, reader.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_post_removes_its_comments() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let post = app.create_post(&author, None, "Тестовый текст").await;
    let pool = &app.state.pool;
    add_comment_to_post_in_db(pool, author.id, post.id, "Комментарий")
        .await
        .unwrap();

    delete_post_in_db(pool, post.id).await.unwrap();

    assert_eq!(comments_count_for_post_in_db(pool, post.id).await.unwrap(), 0);
    let (status, _) = app.get_json(&format!("/posts/{}/", post.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
