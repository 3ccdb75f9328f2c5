#![allow(dead_code)]

use std::{net::TcpListener, sync::Arc, time::Duration};

use feedline::{
    authentication::get_jwt_token,
    build_state,
    config::Config,
    db_helpers::{create_group_in_db, create_post_in_db, insert_user, NewGroup, NewPost, NewUser},
    make_router,
    models::{Group, Post, User},
    serve, AppState,
};
use reqwest::{header, redirect::Policy, Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tempfile::TempDir;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const POSTS_PER_PAGE: u32 = 10;

pub const GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x01\x00\x01\x00\x00\x00\x00\x21\xf9\x04\
\x01\x0a\x00\x01\x00\x2c\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02\x4c\x01\x00\x3b";

pub struct TestApp {
    pub address: String,
    pub state: Arc<AppState>,
    pub client: Client,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config {
        database_url: format!("sqlite://{}", dir.path().join("test.db").display()),
        jwt_secret: JWT_SECRET.to_string(),
        bind_address: "127.0.0.1:0".parse().unwrap(),
        media_root: dir.path().join("media"),
        posts_per_page: POSTS_PER_PAGE,
        index_cache_ttl: Duration::from_secs(20),
    };
    let state = build_state(config).await.expect("app state");
    let listener = TcpListener::bind("127.0.0.1:0").expect("free port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(serve(listener, make_router(state.clone())));

    let client = Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("http client");

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        state,
        client,
        _dir: dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub async fn create_user(&self, username: &str) -> (User, String) {
        let user = insert_user(
            &self.state.pool,
            &NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                // not a valid argon2 hash, so nobody can log in with it
                password: "!".to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("insert user");
        let token = get_jwt_token(JWT_SECRET, user.id).expect("jwt");
        (user, token)
    }

    pub async fn create_group(&self, slug: &str) -> Group {
        create_group_in_db(
            &self.state.pool,
            &NewGroup {
                title: "Тестовое название группы".to_string(),
                slug: slug.to_string(),
                description: "Тестовое описание группы".to_string(),
            },
        )
        .await
        .expect("insert group")
    }

    pub async fn create_post(&self, author: &User, group: Option<&Group>, text: &str) -> Post {
        create_post_in_db(
            &self.state.pool,
            author.id,
            NewPost {
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            },
        )
        .await
        .expect("insert post")
    }

    pub async fn get_json(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = self.get(path);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let response = request.send().await.expect("request");
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }
}

pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn page_items(body: &Value) -> &Vec<Value> {
    body["page_obj"]["items"]
        .as_array()
        .expect("page_obj.items is an array")
}

pub fn page_post_ids(body: &Value) -> Vec<i64> {
    page_items(body)
        .iter()
        .map(|post| post["id"].as_i64().expect("post id"))
        .collect()
}
