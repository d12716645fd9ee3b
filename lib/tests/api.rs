#![cfg(feature = "axum")]

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use tower::ServiceExt;

use byline::config::User as SeedUser;
use byline::{Collector, Config, Counter, Database, Metrics, Role, Router};

const BOUNDARY: &str = "byline-test-boundary";

struct TestApp {
    router: Router,
    metrics: Arc<Collector>,
}

impl TestApp {
    fn new() -> Self {
        let mut config = Config::default();
        config.users = vec![SeedUser {
            email: "admin@x.com".to_string(),
            password: "admin-secret".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
        }];
        let db = Database::temporary().unwrap();
        byline::init::initialize(&config, &db).unwrap();

        let metrics = Arc::new(Collector::new());
        let shared: Arc<dyn Metrics> = metrics.clone();
        let router = byline::app(Router::new(), config, db, shared);
        Self { router, metrics }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, header::HeaderMap) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec(), headers)
    }

    async fn json(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(api(path));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        let (status, bytes, _) = self.send(request).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn upload(
        &self,
        path: &str,
        token: &str,
        field: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(api(path))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart(field, content_type, bytes)))
            .unwrap();
        let (status, bytes, _) = self.send(request).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, email: &str, name: &str) -> (String, String) {
        let (status, body) = self
            .json(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"email": email, "password": "secret1", "name": name})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "admin@x.com", "password": "admin-secret"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers an account and promotes it to author.
    async fn author(&self, email: &str, name: &str) -> (String, String) {
        let (token, id) = self.register(email, name).await;
        let admin = self.admin_token().await;
        let (status, _) = self
            .json(
                Method::PUT,
                &format!("/users/{id}/role"),
                Some(&admin),
                Some(json!({"role": "author"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        (token, id)
    }

    async fn publish(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .json(
                Method::POST,
                "/blog/posts",
                Some(token),
                Some(json!({
                    "title": title,
                    "content": "Some words about things.",
                    "status": "published",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn api(path: &str) -> String {
    format!("{}{}", byline::routes::API, path)
}

fn multipart(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let grid = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    grid.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn jpeg_dimensions(bytes: &[u8]) -> (u32, u32) {
    assert_eq!(image::guess_format(bytes).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(bytes).unwrap();
    (decoded.width(), decoded.height())
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();
    let (status, body) = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
    let app = TestApp::new();
    app.register("a@x.com", "Alice").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "A@x.com", "password": "secret1", "name": "Other"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "b@x.com", "password": "123", "name": "Bob"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.metrics.get(Counter::LoginFailed), 1);
    assert_eq!(app.metrics.get(Counter::UserRegistered), 1);
}

#[tokio::test]
async fn avatar_becomes_square_jpeg_data_uri() {
    let app = TestApp::new();
    let (token, _) = app.register("a@x.com", "Alice").await;

    let (status, profile) = app
        .upload("/profile/avatar", &token, "avatar", "image/png", &png(300, 500))
        .await;
    assert_eq!(status, StatusCode::OK, "{profile}");

    let avatar = profile["avatar"].as_str().unwrap();
    let encoded = avatar.strip_prefix("data:image/jpeg;base64,").unwrap();
    let bytes = STANDARD.decode(encoded).unwrap();
    assert_eq!(jpeg_dimensions(&bytes), (256, 256));

    let (_, me) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["profile"]["avatar"].as_str(), Some(avatar));
    assert_eq!(app.metrics.get(Counter::AvatarUpload), 1);
}

#[tokio::test]
async fn avatar_rejects_unsupported_and_missing_files() {
    let app = TestApp::new();
    let (token, _) = app.register("a@x.com", "Alice").await;

    let (status, _) = app
        .upload("/profile/avatar", &token, "avatar", "text/plain", b"hello")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .upload("/profile/avatar", &token, "avatar", "image/png", b"not an image")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .upload("/profile/avatar", &token, "picture", "image/png", &png(10, 10))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_uploads_are_rejected_before_storing() {
    let app = TestApp::new();
    let (token, _) = app.register("a@x.com", "Alice").await;

    let max_bytes = Config::default().uploads.max_bytes;
    // One byte over reaches the pipeline; 6 MiB trips the request body limit.
    for size in [max_bytes + 1, 6 << 20] {
        let bytes = vec![0u8; size];
        for (path, field) in [("/blog/upload", "image"), ("/profile/avatar", "avatar")] {
            let (status, body) = app.upload(path, &token, field, "image/png", &bytes).await;
            assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{path} {size}: {body}");
        }
    }

    assert_eq!(app.metrics.get(Counter::PostImageUpload), 0);
    assert_eq!(app.metrics.get(Counter::AvatarUpload), 0);
    let (_, me) = app.json(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(me["profile"]["avatar"].as_str(), Some(""));
}

#[tokio::test]
async fn post_image_is_not_upscaled_and_served_with_cache_headers() {
    let app = TestApp::new();
    let (token, _) = app.register("a@x.com", "Alice").await;

    let (status, body) = app
        .upload("/blog/upload", &token, "image", "image/png", &png(300, 500))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/api/v1/blog/images/"));

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let (status, bytes, headers) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "public, max-age=604800, immutable"
    );
    assert_eq!(
        headers[header::CONTENT_LENGTH],
        bytes.len().to_string().as_str()
    );
    assert_eq!(jpeg_dimensions(&bytes), (300, 500));
}

#[tokio::test]
async fn image_lookup_distinguishes_bad_and_missing_ids() {
    let app = TestApp::new();
    let (status, _) = app
        .json(Method::GET, "/blog/images/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/blog/images/{}", uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cover_upload_produces_one_variant_per_size() {
    let app = TestApp::new();
    let (token, _) = app.register("a@x.com", "Alice").await;

    let (status, body) = app
        .upload("/blog/upload/cover", &token, "image", "image/png", &png(1300, 100))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let group = body["group_id"].as_str().unwrap();
    let images = body["images"].as_array().unwrap();
    let widths = images
        .iter()
        .map(|i| (i["size_label"].as_str().unwrap(), i["width"].as_u64().unwrap()))
        .collect::<Vec<_>>();
    assert_eq!(widths, vec![("thumb", 400), ("card", 800), ("banner", 1200)]);

    let request = Request::builder()
        .uri(api(&format!("/blog/images/group/{group}/card")))
        .body(Body::empty())
        .unwrap();
    let (status, bytes, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(jpeg_dimensions(&bytes).0, 800);

    let (status, _) = app
        .json(
            Method::GET,
            &format!("/blog/images/group/{group}/poster"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_authors_publish_and_drafts_stay_private() {
    let app = TestApp::new();
    let (reader, _) = app.register("r@x.com", "Reader").await;
    let (status, _) = app
        .json(
            Method::POST,
            "/blog/posts",
            Some(&reader),
            Some(json!({"title": "Hello", "content": "text"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (author, _) = app.author("w@x.com", "Writer").await;
    let (status, draft) = app
        .json(
            Method::POST,
            "/blog/posts",
            Some(&author),
            Some(json!({"title": "Work in progress", "content": "text"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["status"], "draft");
    let path = format!("/blog/posts/{}", draft["slug"].as_str().unwrap());

    let (status, _) = app.json(Method::GET, &path, Some(&reader), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.json(Method::GET, &path, Some(&author), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json(Method::POST, &format!("{path}/view"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = app.json(Method::GET, "/blog/posts", None, None).await;
    assert_eq!(listing["total"], 0);
    let (_, mine) = app
        .json(Method::GET, "/blog/posts/me", Some(&author), None)
        .await;
    assert_eq!(mine["total"], 1);
}

#[tokio::test]
async fn duplicate_titles_get_numbered_slugs() {
    let app = TestApp::new();
    let (author, _) = app.author("w@x.com", "Writer").await;
    let first = app.publish(&author, "Same Title").await;
    let second = app.publish(&author, "Same Title").await;
    assert_eq!(first["slug"], "same-title");
    assert_eq!(second["slug"], "same-title-2");
    assert_eq!(first["author"]["name"], "Writer");
}

#[tokio::test]
async fn views_likes_and_comments_stay_consistent() {
    let app = TestApp::new();
    let (author, _) = app.author("w@x.com", "Writer").await;
    let (alice, _) = app.register("a@x.com", "Alice").await;
    let (bob, _) = app.register("b@x.com", "Bob").await;

    let post = app.publish(&author, "Counting things").await;
    let base = format!("/blog/posts/{}", post["slug"].as_str().unwrap());

    for token in [Some(alice.as_str()), Some(alice.as_str()), None] {
        let (status, body) = app
            .json(Method::POST, &format!("{base}/view"), token, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "View recorded");
    }

    let (_, liked) = app
        .json(Method::POST, &format!("{base}/like"), Some(&alice), None)
        .await;
    assert_eq!(liked, json!({"liked": true, "like_count": 1}));
    let (_, liked) = app
        .json(Method::POST, &format!("{base}/like"), Some(&bob), None)
        .await;
    assert_eq!(liked, json!({"liked": true, "like_count": 2}));
    let (_, unliked) = app
        .json(Method::POST, &format!("{base}/like"), Some(&bob), None)
        .await;
    assert_eq!(unliked, json!({"liked": false, "like_count": 1}));

    let (status, comment) = app
        .json(
            Method::POST,
            &format!("{base}/comments"),
            Some(&bob),
            Some(json!({"content": "  Nice post  "})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["content"], "Nice post");
    assert_eq!(comment["author_name"], "Bob");

    let (status, _) = app
        .json(
            Method::POST,
            &format!("{base}/comments"),
            Some(&bob),
            Some(json!({"content": "   "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stats) = app
        .json(Method::GET, &format!("{base}/stats"), Some(&alice), None)
        .await;
    assert_eq!(
        stats,
        json!({
            "view_count": 3,
            "unique_view_count": 1,
            "like_count": 1,
            "comment_count": 1,
            "liked": true,
        })
    );
    let (_, anonymous) = app
        .json(Method::GET, &format!("{base}/stats"), None, None)
        .await;
    assert_eq!(anonymous["liked"], false);

    let comment_path = format!("{base}/comments/{}", comment["id"].as_str().unwrap());
    let (status, _) = app
        .json(Method::DELETE, &comment_path, Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app
        .json(Method::DELETE, &comment_path, Some(&author), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Comment deleted");

    let (_, listing) = app
        .json(Method::GET, &format!("{base}/comments"), None, None)
        .await;
    assert_eq!(listing["total"], 0);
    assert_eq!(listing["limit"], 20);

    let (_, single) = app.json(Method::GET, &base, None, None).await;
    assert_eq!(single["comment_count"], 0);
    assert_eq!(single["like_count"], 1);

    assert_eq!(app.metrics.get(Counter::PostView), 3);
    assert_eq!(app.metrics.get(Counter::PostLike), 2);
    assert_eq!(app.metrics.get(Counter::PostUnlike), 1);
}

#[tokio::test]
async fn concurrent_likes_from_many_users_all_count() {
    let app = Arc::new(TestApp::new());
    let (author, _) = app.author("w@x.com", "Writer").await;
    let post = app.publish(&author, "Popular").await;
    let like = format!("/blog/posts/{}/like", post["slug"].as_str().unwrap());

    let mut tokens = Vec::new();
    for i in 0..8 {
        let (token, _) = app.register(&format!("u{i}@x.com"), "Reader").await;
        tokens.push(token);
    }

    let handles = tokens
        .into_iter()
        .map(|token| {
            let app = app.clone();
            let like = like.clone();
            tokio::spawn(async move { app.json(Method::POST, &like, Some(&token), None).await })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let stats = like.replace("/like", "/stats");
    let (_, body) = app.json(Method::GET, &stats, None, None).await;
    assert_eq!(body["like_count"], 8);
}

#[tokio::test]
async fn deleting_a_post_purges_its_engagement() {
    let app = TestApp::new();
    let (author, _) = app.author("w@x.com", "Writer").await;
    let (reader, _) = app.register("r@x.com", "Reader").await;
    let post = app.publish(&author, "Short lived").await;
    let base = format!("/blog/posts/{}", post["slug"].as_str().unwrap());

    app.json(Method::POST, &format!("{base}/like"), Some(&reader), None)
        .await;
    let (status, _) = app
        .json(Method::DELETE, &base, Some(&reader), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.json(Method::DELETE, &base, Some(&author), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post deleted");

    let (status, _) = app
        .json(Method::GET, &format!("{base}/stats"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reconcile_requires_admin() {
    let app = TestApp::new();
    let (author, _) = app.author("w@x.com", "Writer").await;
    let post = app.publish(&author, "Audited").await;
    let path = format!("/blog/posts/{}/reconcile", post["slug"].as_str().unwrap());

    let (status, _) = app.json(Method::POST, &path, Some(&author), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, counters) = app.json(Method::POST, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counters["like_count"], 0);
}

#[tokio::test]
async fn admin_lists_and_filters_users() {
    let app = TestApp::new();
    app.register("a@x.com", "Alice").await;
    app.register("b@x.com", "Bob").await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .json(Method::GET, "/users?search=ali", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["email"], "a@x.com");

    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/users/{}/role", uuid::Uuid::new_v4()),
            Some(&admin),
            Some(json!({"role": "author"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
