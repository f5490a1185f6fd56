use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    core::{
        domain::RunRequest,
        errors::RunError,
        pipeline::{orchestrator::Orchestrator, strategy::RunResponse},
    },
    http::models::RunRequestDto,
};

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/", post(run))
        .route("/run", post(run))
        .route("/health", get(|| async { "OK" }))
        .with_state(orchestrator)
}

#[tracing::instrument(skip_all)]
async fn run(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(dto): Json<RunRequestDto>,
) -> Result<Json<RunResponse>, RunError> {
    tracing::info!(language = %dto.language, runner = %dto.runner, "Received run request");
    let request = RunRequest::try_from(dto)?;
    let response = orchestrator.execute(request).await?;
    Ok(Json(response))
}

impl IntoResponse for RunError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!(error = %self, "Run failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        core::{
            domain::LanguageTable,
            pipeline::{telemetry::TelemetryLogger, workspace::WorkspaceManager},
        },
        native::{fixtures::FsFixtureSource, telemetry::MemoryTelemetryStore},
        stubs::launcher::LauncherStub,
    };

    struct App {
        _workspaces: tempfile::TempDir,
        _fixtures: tempfile::TempDir,
        router: Router,
    }

    fn app(launcher: LauncherStub) -> App {
        let workspaces = tempfile::tempdir().unwrap();
        let fixtures = tempfile::tempdir().unwrap();
        std::fs::write(fixtures.path().join("expected.out"), "a\nb\nc\n").unwrap();
        let orchestrator = Orchestrator::new(
            WorkspaceManager::new(workspaces.path(), LanguageTable::default()),
            "coduno/fingerprint-",
            Arc::new(launcher),
            TelemetryLogger::new(Arc::new(MemoryTelemetryStore::new())),
            Arc::new(FsFixtureSource::new(fixtures.path())),
        );
        App {
            _workspaces: workspaces,
            _fixtures: fixtures,
            router: router(Arc::new(orchestrator)),
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(LauncherStub::echo(Duration::ZERO));

        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, "OK");
    }

    #[tokio::test]
    async fn test_simple_run_returns_output() {
        let app = app(LauncherStub::new("hello\n", "warn\n", "", Duration::ZERO));

        let response = app
            .router
            .oneshot(post_json(
                "/run",
                serde_json::json!({"code": "print('hello')", "language": "py"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&read_body(response).await).unwrap();
        assert_eq!(body, serde_json::json!({"run": "hello\n", "err": "warn\n"}));
    }

    #[tokio::test]
    async fn test_output_diff_via_flags() {
        let app = app(LauncherStub::new("a\nx\nc\n", "", "", Duration::ZERO));

        let response = app
            .router
            .oneshot(post_json(
                "/",
                serde_json::json!({
                    "code": "print('a')",
                    "language": "py",
                    "runner": "outputtest",
                    "flags": "-tests expected.out -image custom",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&read_body(response).await).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"run": "a\nx\nc\n", "diffLines": [1]})
        );
    }

    #[tokio::test]
    async fn test_client_errors_are_bad_request() {
        for body in [
            serde_json::json!({"code": "+", "language": "brainfuck"}),
            serde_json::json!({"code": "x", "language": "py", "runner": "nope"}),
            serde_json::json!({"code": "x", "language": "py", "runner": "outputtest"}),
        ] {
            let app = app(LauncherStub::echo(Duration::ZERO));

            let response = app.router.oneshot(post_json("/run", body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_missing_fixture_is_server_error() {
        let app = app(LauncherStub::echo(Duration::ZERO));

        let response = app
            .router
            .oneshot(post_json(
                "/run",
                serde_json::json!({
                    "code": "x",
                    "language": "py",
                    "runner": "outputtest",
                    "tests": "missing.out",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(read_body(response).await.contains("missing.out"));
    }
}
