mod common;

use common::spawn_app;
use feedline::db_helpers::delete_post_in_db;

#[tokio::test]
async fn index_is_served_from_cache_until_cleared() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    let post = app.create_post(&author, None, "Тестовый текст").await;

    let first = app.get("/").send().await.unwrap().text().await.unwrap();
    assert!(first.contains("Тестовый текст"));

    delete_post_in_db(&app.state.pool, post.id).await.unwrap();

    let cached = app.get("/").send().await.unwrap().text().await.unwrap();
    assert_eq!(first, cached);

    app.state.cache.clear().await;

    let fresh = app.get("/").send().await.unwrap().text().await.unwrap();
    assert_ne!(first, fresh);
    assert!(!fresh.contains("Тестовый текст"));
}

#[tokio::test]
async fn each_index_page_is_cached_separately() {
    let app = spawn_app().await;
    let (author, _) = app.create_user("auth").await;
    for i in 0..11 {
        app.create_post(&author, None, &format!("Пост {i}")).await;
    }

    let (_, first) = app.get_json("/", None).await;
    let (_, second) = app.get_json("/?page=2", None).await;
    assert_eq!(first["page_obj"]["number"], 1);
    assert_eq!(second["page_obj"]["number"], 2);
    assert_ne!(first, second);
}
