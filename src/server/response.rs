use crate::agents::AgentsError;
use crate::engine::{EngineError, ExecutionResult, RequestError};
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const INVALID_DIRECTORY: &str = "Access denied: Invalid directory.";
pub const DIRECTORY_READ_FAILED: &str = "Error reading directory.";
pub const INVALID_FILE_NAME: &str = "Access denied: Invalid file name.";
pub const FILE_NOT_FOUND: &str = "File not found or access denied.";
pub const FILE_READ_FAILED: &str = "Error reading file.";
pub const AGENTS_MISSING: &str = "Agents configuration file not found.";
pub const AGENTS_MALFORMED: &str = "Error parsing agents configuration file.";

/// Every failure a handler can report, each mapped to one status code.
#[derive(Debug)]
pub enum ApiError {
    Request(RequestError),
    Form { status: StatusCode, message: String },
    Engine(EngineError),
    ProcessFailed(ExecutionResult),
    InvalidDirectory,
    DirectoryReadFailed,
    InvalidFileName,
    FileNotFound,
    FileReadFailed,
    Agents(AgentsError),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Request(_) | ApiError::InvalidDirectory | ApiError::InvalidFileName => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Form { status, .. } => *status,
            ApiError::Engine(EngineError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::FileNotFound => StatusCode::NOT_FOUND,
            ApiError::Engine(_)
            | ApiError::ProcessFailed(_)
            | ApiError::DirectoryReadFailed
            | ApiError::FileReadFailed
            | ApiError::Agents(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Request(err)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<AgentsError> for ApiError {
    fn from(err: AgentsError) -> Self {
        ApiError::Agents(err)
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub(crate) fn plain_text(status: StatusCode, body: impl Into<Body>) -> Response {
    let body: Body = body.into();
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Request(err) => plain_text(status, err.to_string()),
            ApiError::Form { message, .. } => plain_text(status, message),
            ApiError::Engine(EngineError::Spawn { program, .. }) => plain_text(
                status,
                format!("Error: engine program not found or not executable at {program}"),
            ),
            ApiError::Engine(EngineError::Timeout {
                timeout_ms,
                partial_output,
                ..
            }) => plain_text(
                status,
                format!(
                    "Error: engine timed out after {}s\n{partial_output}",
                    timeout_ms / 1000
                ),
            ),
            ApiError::Engine(err @ EngineError::Io { .. }) => {
                plain_text(status, format!("Error: engine could not be run: {err}"))
            }
            ApiError::ProcessFailed(result) => plain_text(
                status,
                format!(
                    "Error executing engine (exit code: {}):\n{}",
                    result.exit_code, result.output
                ),
            ),
            ApiError::InvalidDirectory => json_error(status, INVALID_DIRECTORY),
            ApiError::DirectoryReadFailed => json_error(status, DIRECTORY_READ_FAILED),
            ApiError::InvalidFileName => plain_text(status, INVALID_FILE_NAME),
            ApiError::FileNotFound => plain_text(status, FILE_NOT_FOUND),
            ApiError::FileReadFailed => plain_text(status, FILE_READ_FAILED),
            ApiError::Agents(AgentsError::Missing { .. }) => json_error(status, AGENTS_MISSING),
            ApiError::Agents(_) => json_error(status, AGENTS_MALFORMED),
            ApiError::Internal(message) => plain_text(status, message),
        }
    }
}
