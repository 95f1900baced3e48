use std::path::Path;

pub mod command;
pub mod dispatch;
pub mod request;
pub mod runner;

pub use command::{build_command, CommandSpec};
pub use dispatch::{dispatch_orchestration, DispatchError};
pub use request::{
    validate_request, Mode, OrchestrationRequest, RawOrchestrationFields, RequestError,
};
pub use runner::{run_command, ExecutionResult, RunOptions};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine program not found or not executable at {program}")]
    Spawn {
        program: String,
        #[source]
        source: Option<std::io::Error>,
    },
    #[error("engine timed out after {timeout_ms}ms")]
    Timeout {
        timeout_ms: u64,
        partial_output: String,
        command_form: String,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.display().to_string(),
        source,
    }
}
