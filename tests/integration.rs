use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

use cloud_files_server::config::ServerConfig;
use cloud_files_server::{AppState, build_router};

const AUTH_COOKIE: &str = "cloud_auth=ok";
const BOUNDARY: &str = "----cloudfilesboundary7MA4YWxk";
const MB: usize = 1024 * 1024;

struct TestApp {
    _temp: TempDir,
    root: PathBuf,
    staging: PathBuf,
    router: Router,
}

fn app() -> TestApp {
    app_with(|_| {})
}

fn app_with(customize: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("store");
    let mut config = ServerConfig::for_store_root(store.to_str().unwrap()).unwrap();
    config.startup.staging_dir = temp.path().join("staging").to_string_lossy().into_owned();
    config.startup.app_password = Some("secret".into());
    customize(&mut config);

    let state = AppState::new(config).unwrap();
    let root = state.tree.root().to_path_buf();
    let staging = state.staging.dir().to_path_buf();
    TestApp {
        _temp: temp,
        root,
        staging,
        router: build_router(state),
    }
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

fn authed(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, AUTH_COOKIE)
        .body(Body::empty())
        .unwrap()
}

/// Builds a multipart/form-data body with text fields followed by `files` parts
fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (file_name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api")
        .header(header::COOKIE, AUTH_COOKIE)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn staging_is_empty(app: &TestApp) -> bool {
    fs::read_dir(&app.staging).unwrap().next().is_none()
}

#[tokio::test]
async fn empty_root_lists_as_empty() {
    let app = app();
    let response = send(&app, authed(Method::GET, "/api/files?directory=")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([]));

    let response = send(&app, authed(Method::GET, "/api/files?directory=missing/dir")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn traversal_is_rejected_with_generic_message() {
    let app = app();
    let response = send(&app, authed(Method::GET, "/api/files?directory=../etc")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json(),
        json!({"status": "error", "message": "Invalid path"})
    );

    let response = send(&app, authed(Method::GET, "/api/files?directory=%2Fetc")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_directory_twice_then_delete() {
    let app = app();
    for _ in 0..2 {
        let response = send(&app, authed(Method::POST, "/api/createdir?directory=photos")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!({"status": "ok"}));
    }

    let listing = send(&app, authed(Method::GET, "/api/files?directory=")).await;
    assert_eq!(
        listing.json(),
        json!([{"name": "photos", "isFile": false, "size": 0}])
    );

    let response = send(&app, authed(Method::DELETE, "/api/deletedir?directory=photos")).await;
    assert_eq!(response.status, StatusCode::OK);

    let listing = send(&app, authed(Method::GET, "/api/files?directory=")).await;
    assert_eq!(listing.json(), json!([]));
}

#[tokio::test]
async fn create_directory_requires_a_name() {
    let app = app();
    let response = send(&app, authed(Method::POST, "/api/createdir?directory=")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let response = send(&app, authed(Method::POST, "/api/createdir")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn no_folders_hides_directories() {
    let app = app();
    fs::create_dir_all(app.root.join("p/sub")).unwrap();
    fs::write(app.root.join("p/a.txt"), b"abc").unwrap();

    let response = send(&app, authed(Method::GET, "/api/files?directory=p&noFolders=true")).await;
    assert_eq!(
        response.json(),
        json!([{"name": "a.txt", "isFile": true, "size": 3}])
    );
}

#[tokio::test]
async fn directory_size_sums_nested_files() {
    let app = app();
    fs::create_dir_all(app.root.join("proj/sub")).unwrap();
    fs::write(app.root.join("proj/a"), vec![0u8; 10]).unwrap();
    fs::write(app.root.join("proj/b"), vec![0u8; 20]).unwrap();
    fs::write(app.root.join("proj/sub/c"), vec![0u8; 5]).unwrap();

    let response = send(&app, authed(Method::GET, "/api/dirsize?directory=proj")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"status": "ok", "size": 35}));

    let response = send(&app, authed(Method::GET, "/api/dirsize?directory=nope")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(&app, authed(Method::GET, "/api/dirsize")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
#[tokio::test]
async fn disk_usage_reports_space() {
    let app = app();
    let response = send(&app, authed(Method::GET, "/api/disk")).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["total"].as_u64().unwrap() > 0);
    assert!(body["free"].as_u64().unwrap() <= body["total"].as_u64().unwrap());
}

#[tokio::test]
async fn delete_file_via_get_and_delete() {
    let app = app();
    fs::write(app.root.join("one.txt"), b"1").unwrap();
    fs::write(app.root.join("two.txt"), b"2").unwrap();

    let response = send(&app, authed(Method::GET, "/api/deletefile?filePath=one.txt")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({"status": "ok", "message": "File deleted"})
    );

    let response = send(&app, authed(Method::DELETE, "/api/deletefile?filePath=two.txt")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!app.root.join("two.txt").exists());

    let response = send(&app, authed(Method::GET, "/api/deletefile?filePath=one.txt")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_refuses_to_overwrite() {
    let app = app();
    fs::create_dir_all(app.root.join("d")).unwrap();
    fs::write(app.root.join("d/a.txt"), b"a").unwrap();
    fs::write(app.root.join("d/b.txt"), b"b").unwrap();

    let response = send(&app, authed(Method::POST, "/api/rename?path=d/a.txt&name=b.txt")).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(fs::read(app.root.join("d/a.txt")).unwrap(), b"a");
    assert_eq!(fs::read(app.root.join("d/b.txt")).unwrap(), b"b");

    let response = send(&app, authed(Method::POST, "/api/rename?path=d/a.txt&name=c.txt")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"status": "ok", "path": "d/c.txt"}));
    assert!(app.root.join("d/c.txt").is_file());

    let response = send(&app, authed(Method::POST, "/api/rename?path=d/c.txt&name=../x")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_stores_text_and_serves_it() {
    let app = app();
    let content: &[u8] = b"hello from the browser\n";
    let response = send(
        &app,
        multipart(&[("directory", "docs/notes")], &[("note.txt", "text/plain", content)]),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let urls: Vec<String> = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with("/uploads/docs/notes/"));
    assert!(urls[0].ends_with(".txt"));
    assert!(staging_is_empty(&app));

    let stored = urls[0].trim_start_matches("/uploads/");
    assert_eq!(fs::read(app.root.join(stored)).unwrap(), content);

    // Public URLs need no cookie
    let request = Request::builder()
        .uri(urls[0].as_str())
        .body(Body::empty())
        .unwrap();
    let served = send(&app, request).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.body, content);
}

#[tokio::test]
async fn empty_directory_uploads_to_the_root() {
    let app = app();
    let response = send(
        &app,
        multipart(
            &[("directory", ""), ("project", "ignored")],
            &[("top.txt", "text/plain", "top".as_bytes())],
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let urls: Vec<String> = serde_json::from_slice(&response.body).unwrap();
    let stored = urls[0].trim_start_matches("/uploads/");
    assert!(!stored.contains('/'));
    assert!(stored.ends_with(".txt"));
    assert_eq!(fs::read(app.root.join(stored)).unwrap(), b"top");
    assert!(!app.root.join("ignored").exists());
}

#[tokio::test]
async fn legacy_fields_and_multiple_files() {
    let app = app();
    let response = send(
        &app,
        multipart(
            &[("project", "polovinka"), ("folder", "temp")],
            &[
                ("a.txt", "text/plain", "first".as_bytes()),
                ("b.csv", "text/csv", "x,y".as_bytes()),
            ],
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let urls: Vec<String> = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls[0].starts_with("/uploads/polovinka/temp/") && urls[0].ends_with(".txt"));
    assert!(urls[1].ends_with(".csv"));
    assert_ne!(urls[0], urls[1]);
}

#[tokio::test]
async fn upload_without_target_or_files_is_rejected() {
    let app = app();
    let response = send(&app, multipart(&[], &[("a.txt", "text/plain", "a".as_bytes())])).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(staging_is_empty(&app));

    let response = send(&app, multipart(&[("directory", "x")], &[])).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_document_is_rejected() {
    let app = app_with(|config| config.upload.max_document_size_mb = 1);
    let big = vec![0u8; 2 * MB];
    let response = send(
        &app,
        multipart(
            &[("directory", "docs")],
            &[("report.docx", "application/octet-stream", big.as_slice())],
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json()["status"], "error");
    let listing = send(&app, authed(Method::GET, "/api/files?directory=docs")).await;
    assert_eq!(listing.json(), json!([]));
    assert!(staging_is_empty(&app));
}

#[tokio::test]
async fn upload_over_the_size_cap_is_rejected() {
    let app = app_with(|config| config.upload.max_upload_size_mb = 1);
    let big = vec![b'x'; 2 * MB];
    let response = send(
        &app,
        multipart(&[("directory", "big")], &[("huge.txt", "text/plain", big.as_slice())]),
    )
    .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(staging_is_empty(&app));
    assert!(!app.root.join("big").exists());
}

#[tokio::test]
async fn static_mount_refuses_escape() {
    let app = app();
    let request = Request::builder()
        .uri("/uploads/%2E%2E/secret.txt")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/uploads/missing.txt")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_requires_the_auth_cookie() {
    let app = app();
    let request = Request::builder()
        .uri("/api/files?directory=")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json(),
        json!({"status": "error", "message": "Unauthorized"})
    );

    let request = Request::builder()
        .uri("/api/files?directory=")
        .header(header::COOKIE, "cloud_auth=forged")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disabled_auth_opens_the_api() {
    let app = app_with(|config| config.startup.auth_enabled = false);
    let request = Request::builder()
        .uri("/api/files?directory=")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::OK);
}

fn login_request(password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "password": password }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn login_me_logout_flow() {
    let app = app();

    let response = send(&app, login_request("wrong")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.headers.get(header::SET_COOKIE).is_none());

    let response = send(&app, login_request("secret")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({"ok": true}));
    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("cloud_auth=ok;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));

    let me = send(&app, authed(Method::GET, "/api/auth/me")).await;
    assert_eq!(me.json(), json!({"authenticated": true}));

    let request = Request::builder()
        .uri("/api/auth/me")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.json(), json!({"authenticated": false}));

    let response = send(&app, authed(Method::POST, "/api/auth/logout")).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn percent_encoded_auth_cookie_is_accepted() {
    let app = app();
    let request = Request::builder()
        .uri("/api/files?directory=")
        .header(header::COOKIE, "theme=dark; cloud_auth=o%6B")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::OK);

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, "cloud_auth=%6Fk")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.json(), json!({"authenticated": true}));
}

#[tokio::test]
async fn login_without_configured_password_fails() {
    let app = app_with(|config| config.startup.app_password = None);
    let response = send(&app, login_request("anything")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}
