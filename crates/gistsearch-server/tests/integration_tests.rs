//! Integration tests for the gistsearch-server binary.
//!
//! These start the real binary against an in-process fake of the GitHub API
//! and talk to it over HTTP.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

const TOKEN: &str = "integration-token";

struct FakeGitHub {
    base: String,
}

fn gist_json(base: &str, id: &str, files: &[&str]) -> Value {
    let files: serde_json::Map<String, Value> = files
        .iter()
        .map(|name| {
            (
                name.to_string(),
                json!({"filename": name, "raw_url": format!("{}/raw/{}/{}", base, id, name)}),
            )
        })
        .collect();
    json!({
        "id": id,
        "url": format!("{}/gists/{}", base, id),
        "html_url": format!("https://gist.example.com/{}", id),
        "files": files
    })
}

fn check_token(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("token {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Bad credentials"})),
        )
            .into_response()),
    }
}

async fn list_gists(
    State(fake): State<Arc<FakeGitHub>>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = check_token(&headers) {
        return rejection;
    }
    if user != "octocat" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response();
    }
    let mut response = Json(json!([
        gist_json(&fake.base, "g1", &["main.rs", "notes.txt"]),
        gist_json(&fake.base, "g2", &["script.py"]),
    ]))
    .into_response();
    let link = format!("<{}/user/1/gists?page=2>; rel=\"next\"", fake.base);
    response.headers_mut().insert("link", link.parse().unwrap());
    response
}

async fn get_gist(
    State(fake): State<Arc<FakeGitHub>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = check_token(&headers) {
        return rejection;
    }
    match id.as_str() {
        "g1" => Json(gist_json(&fake.base, "g1", &["main.rs", "notes.txt"])).into_response(),
        "g2" => Json(gist_json(&fake.base, "g2", &["script.py"])).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_raw(Path((id, file)): Path<(String, String)>, headers: HeaderMap) -> Response {
    if let Err(rejection) = check_token(&headers) {
        return rejection;
    }
    match (id.as_str(), file.as_str()) {
        ("g1", "main.rs") => "fn main() {}".into_response(),
        ("g1", "notes.txt") => "remember the milk".into_response(),
        ("g2", "script.py") => "def main():\n    pass\n".into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_fake_github() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = Router::new()
        .route("/users/:user/gists", get(list_gists))
        .route("/gists/:id", get(get_gist))
        .route("/raw/:id/:file", get(get_raw))
        .with_state(Arc::new(FakeGitHub { base: base.clone() }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

fn server_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gistsearch-server"))
}

struct ServerHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl ServerHandle {
    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

/// Start the server binary and wait for its `SERVER_PORT=` line.
async fn start_server(github_base: &str) -> Result<ServerHandle, String> {
    let mut child = tokio::process::Command::new(server_binary())
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--github-api-url")
        .arg(github_base)
        .env("GITHUB_TOKEN", TOKEN)
        .env_remove("GITHUB_API_URL")
        .current_dir(std::env::temp_dir())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("failed to spawn gistsearch-server: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut port = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("SERVER_PORT=") {
                    port = Some(
                        value
                            .trim()
                            .parse::<u16>()
                            .map_err(|e| format!("invalid SERVER_PORT value '{value}': {e}"))?,
                    );
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port = port.ok_or_else(|| "SERVER_PORT line not emitted".to_string())?;
    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(ServerHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
    })
}

#[tokio::test]
async fn test_ping_and_search_over_http() {
    let github = start_fake_github().await;
    let server = start_server(&github).await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/ping"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "pong");

    let response = client
        .post(server.url("/api/v1/search"))
        .json(&json!({"username": "octocat", "pattern": "def main|fn main", "per_page": 2}))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    let lines: Vec<Value> = body
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["status"], "success");
    assert_eq!(lines[0]["matches"][0]["gist_id"], "g1");
    assert_eq!(lines[0]["matches"][0]["filename"], "main.rs");
    assert_eq!(lines[0]["more_pages"], true);
    assert_eq!(lines[1]["matches"][0]["gist_id"], "g2");
    assert_eq!(lines[1]["matches"][0]["url"], "https://gist.example.com/g2");

    server.stop().await;
}

#[tokio::test]
async fn test_search_errors_over_http() {
    let github = start_fake_github().await;
    let server = start_server(&github).await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/v1/search"))
        .json(&json!({"username": "testuser"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json, json!({"status": "error", "message": "Pattern is required"}));

    let response = client
        .post(server.url("/api/v1/search"))
        .json(&json!({"username": "ghost", "pattern": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let json: Value = response.json().await.unwrap();
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("Error fetching gists: "));

    server.stop().await;
}

#[tokio::test]
async fn test_missing_token_aborts_startup() {
    let status = tokio::process::Command::new(server_binary())
        .arg("--port")
        .arg("0")
        .env_remove("GITHUB_TOKEN")
        .current_dir(std::env::temp_dir())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .unwrap();
    assert!(!status.success());
}
