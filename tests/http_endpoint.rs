//! HTTP round-trips against a live server on an ephemeral port.

use byline::access::AccessPolicy;
use byline::config::AccessConfig;
use byline::nonce::NonceKeeper;
use byline::preferences::RANGE_OPTION;
use byline::selection::{RangeSelection, ReportSettings};
use byline::server::{router, AppState, PAGE_PATH, RANGE_PATH};
use byline::storage::{Database, NewPost};
use chrono::{Months, Utc};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

const USER_HEADER: &str = "x-remote-user";
const FORM: &str = "application/x-www-form-urlencoded";

struct TestServer {
    base: String,
    db: Database,
    client: reqwest::Client,
}

async fn spawn_server() -> TestServer {
    let db = Database::open(":memory:").await.unwrap();
    let author = db.insert_author("Ana").await.unwrap();
    let recent = Utc::now().naive_utc() - chrono::Duration::days(3);
    let old = Utc::now().naive_utc() - Months::new(30);
    db.insert_post(&NewPost::published(author, "Fresh piece", recent))
        .await
        .unwrap();
    db.insert_post(&NewPost::published(author, "Archive piece", old))
        .await
        .unwrap();

    spawn_server_with(db).await
}

async fn spawn_server_with(db: Database) -> TestServer {
    let settings = ReportSettings {
        excluded_categories: vec![75862, 9178],
        post_type: "post".to_string(),
        site_url: Url::parse("https://news.example.org/").unwrap(),
        query_timeout: Duration::from_secs(5),
    };
    let nonces = NonceKeeper::new(&SecretString::from("http-test".to_string()), 24).unwrap();
    let policy = AccessPolicy::new(&AccessConfig {
        user_header: USER_HEADER.to_string(),
        admins: vec!["ana".to_string()],
    });
    let state = Arc::new(AppState {
        selection: RangeSelection::new(db.clone(), nonces, settings),
        policy,
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        db,
        client: reqwest::Client::new(),
    }
}

fn token_from_page(html: &str) -> String {
    let start = html.find("data-security='").unwrap() + "data-security='".len();
    let end = start + html[start..].find('\'').unwrap();
    html[start..end].to_string()
}

impl TestServer {
    async fn page(&self, user: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{PAGE_PATH}", self.base));
        if let Some(user) = user {
            req = req.header(USER_HEADER, user);
        }
        req.send().await.unwrap()
    }

    async fn change(&self, user: Option<&str>, body: String) -> reqwest::Response {
        let mut req = self
            .client
            .post(format!("{}{RANGE_PATH}", self.base))
            .header("content-type", FORM)
            .body(body);
        if let Some(user) = user {
            req = req.header(USER_HEADER, user);
        }
        req.send().await.unwrap()
    }

    async fn token(&self) -> String {
        token_from_page(&self.page(Some("ana")).await.text().await.unwrap())
    }
}

#[tokio::test]
async fn test_page_requires_admin() {
    let server = spawn_server().await;

    let res = server.page(None).await;
    assert_eq!(res.status().as_u16(), 403);
    assert!(res.text().await.unwrap().is_empty());

    assert_eq!(server.page(Some("mallory")).await.status().as_u16(), 403);
}

#[tokio::test]
async fn test_page_shows_default_range_and_report() {
    let server = spawn_server().await;

    let res = server.page(Some("ana")).await;
    assert_eq!(res.status().as_u16(), 200);
    let html = res.text().await.unwrap();
    assert!(html.contains("value='1 year ago' checked>"));
    assert!(html.contains("<h3>Ana (1 articles)</h3>"));
    assert!(html.contains("Fresh piece"));
    assert!(!html.contains("Archive piece"));
    assert_eq!(token_from_page(&html).len(), 64);
}

#[tokio::test]
async fn test_change_with_valid_token_returns_fragment_and_persists() {
    let server = spawn_server().await;
    let token = server.token().await;

    let res = server
        .change(Some("ana"), format!("range=all+time&security={token}"))
        .await;
    assert_eq!(res.status().as_u16(), 200);
    let fragment = res.text().await.unwrap();
    assert!(fragment.starts_with("<h2>Articles published at any time sorted by author</h2>"));
    assert!(fragment.contains("<h3>Ana (2 articles)</h3>"));
    assert!(!fragment.contains("<html"));

    assert_eq!(
        server.db.get_option(RANGE_OPTION).await.unwrap().as_deref(),
        Some("all time")
    );
    let page = server.page(Some("ana")).await.text().await.unwrap();
    assert!(page.contains("value='all time' checked>"));
}

#[tokio::test]
async fn test_change_with_bad_token_is_forbidden_and_persists_nothing() {
    let server = spawn_server().await;

    let res = server
        .change(Some("ana"), "range=all+time&security=00ff".to_string())
        .await;
    assert_eq!(res.status().as_u16(), 403);
    assert!(res.text().await.unwrap().is_empty());

    let res = server.change(Some("ana"), "range=all+time".to_string()).await;
    assert_eq!(res.status().as_u16(), 403);

    assert_eq!(server.db.get_option(RANGE_OPTION).await.unwrap(), None);
}

#[tokio::test]
async fn test_change_without_capability_is_forbidden() {
    let server = spawn_server().await;
    let token = server.token().await;

    let res = server
        .change(None, format!("range=all+time&security={token}"))
        .await;
    assert_eq!(res.status().as_u16(), 403);
    assert_eq!(server.db.get_option(RANGE_OPTION).await.unwrap(), None);
}

#[tokio::test]
async fn test_unknown_label_falls_back_to_default() {
    let server = spawn_server().await;
    let token = server.token().await;

    let res = server
        .change(Some("ana"), format!("range=next+week&security={token}"))
        .await;
    assert_eq!(res.status().as_u16(), 200);
    assert!(res
        .text()
        .await
        .unwrap()
        .contains("Articles published since 1 year ago"));
    assert_eq!(
        server.db.get_option(RANGE_OPTION).await.unwrap().as_deref(),
        Some("1 year ago")
    );
}

#[tokio::test]
async fn test_store_failure_is_a_plain_500() {
    let path = std::env::temp_dir().join(format!("byline_http_test_{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let path_str = path.to_str().unwrap().to_string();

    let db = Database::open(&path_str).await.unwrap();
    let author = db.insert_author("Ana").await.unwrap();
    db.insert_post(&NewPost::published(
        author,
        "Fresh piece",
        Utc::now().naive_utc() - chrono::Duration::days(3),
    ))
    .await
    .unwrap();

    // A post_date the report cannot read, written behind the library's back.
    let raw = sqlx::SqlitePool::connect(&format!("sqlite:{path_str}"))
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO posts (post_author, post_title, post_date) VALUES (?, 'Bad', '2999-13-99 xx')",
    )
    .bind(author)
    .execute(&raw)
    .await
    .unwrap();
    raw.close().await;

    let server = spawn_server_with(db).await;
    let res = server.page(Some("ana")).await;
    assert_eq!(res.status().as_u16(), 500);
    let body = res.text().await.unwrap();
    assert_eq!(body, "Could not load the author report.\n");
    assert!(!body.contains("<h3>"));

    let _ = std::fs::remove_file(&path);
}
