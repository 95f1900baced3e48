use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use wpcgate::config::Settings;
use wpcgate::server::{Gateway, GatewayState};

const ENGINE: &str = r#"case "$2" in
  scaffold) echo "Scaffold created" ;;
  prompt)
    if [ "$4" = sleepy ]; then echo thinking; sleep 5; fi
    for arg in "$@"; do printf '[%s]\n' "$arg"; done ;;
  validate) echo "missing docstring" 1>&2; exit 3 ;;
esac
"#;

struct Fixture {
    dir: TempDir,
    router: Router,
}

impl Fixture {
    fn new() -> Self {
        Self::with_timeout(5)
    }

    fn with_timeout(timeout_secs: u64) -> Self {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        for sub in ["project/src", "docs", "logs", "engine", "state"] {
            fs::create_dir_all(base.join(sub)).expect("create dir");
        }
        fs::write(base.join("engine/WPCV1.sh"), ENGINE).expect("write engine");
        fs::write(base.join("project/WPCV1.py"), "print('hi')").expect("write project file");
        fs::write(base.join("docs/notes.md"), "# Notes\nline two\n").expect("write notes");
        fs::write(
            base.join("engine/agents.json"),
            r#"{"openai": {"api_key": "sk-secret", "model": "gpt-4o", "url": "u"}, "deepseek": {}}"#,
        )
        .expect("write agents");

        let settings: Settings = serde_yaml::from_str(&format!(
            r#"
engine:
  interpreter: /bin/sh
  script: {base}/engine/WPCV1.sh
  timeout_secs: {timeout_secs}
roots:
  project: {base}/project
  docs: {base}/docs
  logs: {base}/logs
agents_file: {base}/engine/agents.json
log_dir: {base}/state
"#,
            base = base.display(),
            timeout_secs = timeout_secs
        ))
        .expect("parse settings");
        settings.validate().expect("valid settings");
        let state = GatewayState::from_settings(&settings).expect("state");
        Self {
            router: Gateway::router(state),
            dir,
        }
    }

    fn path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    async fn post_form(&self, body: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/orchestrate")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
    }
}

fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[tokio::test]
async fn scaffold_returns_captured_output() {
    let fixture = Fixture::new();
    let (status, body) = fixture.post_form("mode=scaffold").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Scaffold created\n");
    assert!(read_log(&fixture.path("state/gateway.log")).contains("dispatch.completed"));
}

#[tokio::test]
async fn prompt_text_is_passed_as_one_token() {
    let fixture = Fixture::new();
    let (status, body) = fixture
        .post_form("mode=prompt&agent=writer&directory=src&prompt=hello+world")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("[--agent]\n[writer]\n[--directory]\n[src]\n[--prompt]\n[hello world]\n"));
}

#[tokio::test]
async fn non_zero_exit_maps_to_500_with_output() {
    let fixture = Fixture::new();
    let (status, body) = fixture.post_form("mode=validate&file=app.py").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        "Error executing engine (exit code: 3):\nmissing docstring\n"
    );
}

#[tokio::test]
async fn engine_timeout_is_a_504_with_partial_output() {
    let fixture = Fixture::with_timeout(1);
    let (status, body) = fixture
        .post_form("mode=prompt&agent=sleepy&prompt=hi")
        .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.starts_with("Error: engine timed out after 1s\n"), "{body}");
    assert!(body.contains("thinking"));
}

#[tokio::test]
async fn missing_mode_and_missing_agent_are_bad_requests() {
    let fixture = Fixture::new();
    let (status, body) = fixture.post_form("agent=writer").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Mode is a required parameter.");

    let (status, body) = fixture.post_form("mode=prompt&prompt=hi").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Agent is a required parameter"));
    assert!(read_log(&fixture.path("state/security.log")).contains("request.rejected"));

    let (status, body) = fixture
        .send(
            Request::builder()
                .method("POST")
                .uri("/orchestrate")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Mode is a required parameter.");
}

#[tokio::test]
async fn orchestrate_rejects_other_methods() {
    let fixture = Fixture::new();
    let (status, body) = fixture.get("/orchestrate").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "Method Not Allowed");
}

#[tokio::test]
async fn multipart_forms_are_accepted() {
    let fixture = Fixture::new();
    let boundary = "XyZboundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"mode\"\r\n\r\nscaffold\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"agent\"\r\n\r\n\r\n\
         --{boundary}--\r\n"
    );
    let (status, text) = fixture
        .send(
            Request::builder()
                .method("POST")
                .uri("/orchestrate")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .expect("request"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Scaffold created\n");
}

#[tokio::test]
async fn missing_engine_script_is_a_500_naming_the_path() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.path("engine/WPCV1.sh")).expect("remove engine");
    let (status, body) = fixture.post_form("mode=scaffold").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Error: engine program not found or not executable at"));
    assert!(body.contains("WPCV1.sh"));
}

#[tokio::test]
async fn agents_endpoint_lists_names_only() {
    let fixture = Fixture::new();
    let (status, body) = fixture.get("/agents").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = serde_json::from_str(&body).expect("json names");
    assert_eq!(names, vec!["deepseek", "openai"]);
    assert!(!body.contains("sk-secret"));

    fs::write(fixture.path("engine/agents.json"), "{oops").expect("break agents");
    let (status, body) = fixture.get("/agents").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Error parsing agents configuration file."}"#);

    fs::remove_file(fixture.path("engine/agents.json")).expect("remove agents");
    let (status, body) = fixture.get("/agents").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Agents configuration file not found."}"#);
}

#[tokio::test]
async fn browse_lists_root_and_rejects_traversal() {
    let fixture = Fixture::new();
    let (status, body) = fixture.get("/browse").await;
    assert_eq!(status, StatusCode::OK);
    let listing: serde_json::Value = serde_json::from_str(&body).expect("json listing");
    assert_eq!(listing["current_dir"], "");
    assert_eq!(listing["dirs"][0]["name"], "src");
    assert_eq!(listing["dirs"][0]["path"], "src");
    assert_eq!(listing["files"][0]["path"], "WPCV1.py");

    let (status, body) = fixture.get("/browse?dir=src").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"current_dir\":\"src\""));

    let (status, body) = fixture.get("/browse?dir=../../etc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Access denied: Invalid directory."}"#);
    let security = read_log(&fixture.path("state/security.log"));
    assert!(security.contains("sandbox.violation"));
    assert!(!security.contains(&fixture.path("project").display().to_string()));
}

#[tokio::test]
async fn preview_serves_files_from_preview_roots() {
    let fixture = Fixture::new();
    let (status, body) = fixture.get("/preview?file=notes.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "# Notes\nline two\n");

    let (status, body) = fixture.get("/preview?file=missing.log").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "File not found or access denied.");

    let (status, body) = fixture.get("/preview?file=..%2Fproject%2FWPCV1.py").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Access denied: Invalid file name.");

    let (status, _) = fixture.get("/preview").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_loops_are_sandbox_violations() {
    let fixture = Fixture::new();
    std::os::unix::fs::symlink("loop", fixture.path("project/loop")).expect("project loop");
    std::os::unix::fs::symlink("loop", fixture.path("docs/loop")).expect("docs loop");

    let (status, body) = fixture.get("/browse?dir=loop").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Access denied: Invalid directory."}"#);
    assert!(read_log(&fixture.path("state/security.log")).contains("sandbox.violation"));

    let (status, body) = fixture.get("/preview?file=loop").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Access denied: Invalid file name.");
}

#[tokio::test]
async fn health_check_is_plain_ok() {
    let fixture = Fixture::new();
    assert_eq!(fixture.get("/health").await, (StatusCode::OK, "ok".to_string()));
}
