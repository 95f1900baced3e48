use crate::config::EngineSettings;
use crate::engine::{
    build_command, run_command, validate_request, EngineError, ExecutionResult,
    RawOrchestrationFields, RequestError, RunOptions,
};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Validate, build and execute one orchestration request.
pub fn dispatch_orchestration(
    raw: &RawOrchestrationFields,
    engine: &EngineSettings,
) -> Result<ExecutionResult, DispatchError> {
    let request = validate_request(raw)?;
    let spec = build_command(&request, engine);
    if !engine.script.is_file() {
        return Err(EngineError::Spawn {
            program: engine.script.display().to_string(),
            source: None,
        }
        .into());
    }
    let options = RunOptions {
        cwd: engine.resolve_working_dir(),
        timeout: engine.timeout(),
    };
    Ok(run_command(&spec, &options)?)
}
