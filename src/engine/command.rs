use crate::config::EngineSettings;
use crate::engine::OrchestrationRequest;

/// Program plus discrete argument tokens. Never joined into a shell string
/// for execution; `command_form` exists only for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    pub fn command_form(&self) -> String {
        self.argv()
            .iter()
            .map(|token| format!("{token:?}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn build_command(request: &OrchestrationRequest, engine: &EngineSettings) -> CommandSpec {
    let mut args = vec![
        engine.script.display().to_string(),
        "--mode".to_string(),
        request.mode().as_str().to_string(),
    ];
    match request {
        OrchestrationRequest::Prompt {
            agent,
            directory,
            prompt_text,
        } => {
            push_flag(&mut args, "--agent", Some(agent));
            push_flag(&mut args, "--directory", directory.as_ref());
            push_flag(&mut args, "--prompt", prompt_text.as_ref());
        }
        OrchestrationRequest::Validate { file, expectation } => {
            push_flag(&mut args, "--file", Some(file));
            push_flag(&mut args, "--expect", expectation.as_ref());
        }
        OrchestrationRequest::Scaffold => {}
    }
    CommandSpec {
        program: engine.interpreter.clone(),
        args,
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: Option<&String>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.clone());
    }
}
