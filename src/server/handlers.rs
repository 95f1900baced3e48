use crate::agents::agent_names;
use crate::browse::{list_directory, read_preview, BrowseError, DirectoryListing, PreviewFile};
use crate::engine::{dispatch_orchestration, DispatchError, RawOrchestrationFields};
use crate::sandbox::SandboxError;
use crate::server::response::plain_text;
use crate::server::{ApiError, GatewayState};
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub file: Option<String>,
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn method_not_allowed() -> Response {
    plain_text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

pub async fn orchestrate(
    State(state): State<GatewayState>,
    request: Request,
) -> Result<Response, ApiError> {
    let fields = read_orchestration_fields(request).await?;
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || dispatch_orchestration(&fields, &engine))
        .await
        .map_err(|err| {
            state
                .log
                .error("dispatch.join_failed", &format!("engine task failed: {err}"));
            ApiError::Internal("Error: engine task failed".to_string())
        })?;

    match outcome {
        Ok(result) => {
            state.log.info(
                "dispatch.completed",
                &format!(
                    "{} exited with {} in {}ms",
                    result.command_form, result.exit_code, result.duration_ms
                ),
            );
            if result.success() {
                Ok(plain_text(StatusCode::OK, result.output))
            } else {
                Err(ApiError::ProcessFailed(result))
            }
        }
        Err(DispatchError::Request(err)) => {
            state.log.security("request.rejected", &err.to_string());
            Err(err.into())
        }
        Err(DispatchError::Engine(err)) => {
            state.log.error("dispatch.failed", &err.to_string());
            Err(err.into())
        }
    }
}

/// Decodes url-encoded or multipart form bodies. An empty body with no content
/// type decodes to no fields, so it fails mode validation instead of content
/// negotiation.
async fn read_orchestration_fields(request: Request) -> Result<RawOrchestrationFields, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_ascii_lowercase);

    match content_type {
        Some(content_type) if content_type.starts_with("multipart/form-data") => {
            let mut multipart = Multipart::from_request(request, &())
                .await
                .map_err(|rejection| form_error(rejection.status(), rejection.body_text()))?;
            let mut fields = RawOrchestrationFields::default();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|err| form_error(err.status(), err.body_text()))?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let value = field
                    .text()
                    .await
                    .map_err(|err| form_error(err.status(), err.body_text()))?;
                fields.set(&name, value);
            }
            Ok(fields)
        }
        Some(_) => {
            let Form(fields) = Form::<RawOrchestrationFields>::from_request(request, &())
                .await
                .map_err(|rejection| form_error(rejection.status(), rejection.body_text()))?;
            Ok(fields)
        }
        None => {
            let body = Bytes::from_request(request, &())
                .await
                .map_err(|rejection| form_error(rejection.status(), rejection.body_text()))?;
            if body.is_empty() {
                Ok(RawOrchestrationFields::default())
            } else {
                Err(form_error(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "Expected a form-encoded request body.".to_string(),
                ))
            }
        }
    }
}

fn form_error(status: StatusCode, message: String) -> ApiError {
    ApiError::Form { status, message }
}

pub async fn list_agents(State(state): State<GatewayState>) -> Result<Response, ApiError> {
    let path = state.agents_file.clone();
    let names = tokio::task::spawn_blocking(move || agent_names(&path))
        .await
        .map_err(|err| ApiError::Internal(format!("Error: agents task failed: {err}")))?;
    match names {
        Ok(names) => Ok(Json(names).into_response()),
        Err(err) => {
            state.log.error("agents.failed", &err.to_string());
            Err(err.into())
        }
    }
}

pub async fn browse(
    State(state): State<GatewayState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<DirectoryListing>, ApiError> {
    let requested = query.dir.unwrap_or_default();
    let worker_state = state.clone();
    let worker_requested = requested.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<DirectoryListing, BrowseError> {
        let root = worker_state.roots.get(&worker_state.browse_root)?;
        let dir = root.resolve_nested(&worker_requested)?;
        list_directory(root, &dir)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("Error: listing task failed: {err}")))?;

    match outcome {
        Ok(listing) => Ok(Json(listing)),
        Err(
            err @ (BrowseError::Listing { .. } | BrowseError::Sandbox(SandboxError::Io { .. })),
        ) => {
            state.log.error("browse.failed", &err.to_string());
            Err(ApiError::DirectoryReadFailed)
        }
        Err(err) => {
            state.log.security(
                "sandbox.violation",
                &format!("browse `{requested}` rejected: {err}"),
            );
            Err(ApiError::InvalidDirectory)
        }
    }
}

pub async fn preview(
    State(state): State<GatewayState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Response, ApiError> {
    let requested = query.file.unwrap_or_default();
    let worker_state = state.clone();
    let worker_requested = requested.clone();
    let outcome = tokio::task::spawn_blocking(move || -> Result<PreviewFile, BrowseError> {
        let roots = worker_state.roots.ordered(&worker_state.preview_roots)?;
        read_preview(&roots, &worker_requested)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("Error: preview task failed: {err}")))?;

    match outcome {
        Ok(found) => Ok(plain_text(StatusCode::OK, found.content)),
        Err(BrowseError::NotFound { .. }) => Err(ApiError::FileNotFound),
        Err(err @ (BrowseError::Read { .. } | BrowseError::Sandbox(SandboxError::Io { .. }))) => {
            state.log.error("preview.failed", &err.to_string());
            Err(ApiError::FileReadFailed)
        }
        Err(err) => {
            state.log.security(
                "sandbox.violation",
                &format!("preview `{requested}` rejected: {err}"),
            );
            Err(ApiError::InvalidFileName)
        }
    }
}
