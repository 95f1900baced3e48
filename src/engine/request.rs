use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Prompt,
    Validate,
    Scaffold,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Prompt => "prompt",
            Mode::Validate => "validate",
            Mode::Scaffold => "scaffold",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Mode {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Err(RequestError::MissingMode),
            "prompt" => Ok(Self::Prompt),
            "validate" => Ok(Self::Validate),
            "scaffold" => Ok(Self::Scaffold),
            _ => Err(RequestError::UnknownMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Mode is a required parameter.")]
    MissingMode,
    #[error("Unknown mode `{0}`. Expected one of: prompt, validate, scaffold.")]
    UnknownMode(String),
    #[error("{} is a required parameter for mode `{mode}`.", capitalize(.field))]
    MissingField { mode: Mode, field: &'static str },
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Form fields exactly as submitted; unknown fields are ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawOrchestrationFields {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub expectation: Option<String>,
}

impl RawOrchestrationFields {
    /// Assigns a named form field. Returns false for names that are not recognised.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "mode" => &mut self.mode,
            "agent" => &mut self.agent,
            "directory" => &mut self.directory,
            "prompt" => &mut self.prompt,
            "file" => &mut self.file,
            "expectation" => &mut self.expectation,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationRequest {
    Prompt {
        agent: String,
        directory: Option<String>,
        prompt_text: Option<String>,
    },
    Validate {
        file: String,
        expectation: Option<String>,
    },
    Scaffold,
}

impl OrchestrationRequest {
    pub fn mode(&self) -> Mode {
        match self {
            OrchestrationRequest::Prompt { .. } => Mode::Prompt,
            OrchestrationRequest::Validate { .. } => Mode::Validate,
            OrchestrationRequest::Scaffold => Mode::Scaffold,
        }
    }
}

pub fn validate_request(
    raw: &RawOrchestrationFields,
) -> Result<OrchestrationRequest, RequestError> {
    let mode = Mode::try_from(raw.mode.as_deref().unwrap_or(""))?;
    match mode {
        Mode::Prompt => Ok(OrchestrationRequest::Prompt {
            agent: required(mode, "agent", &raw.agent)?,
            directory: optional(&raw.directory),
            prompt_text: optional(&raw.prompt),
        }),
        Mode::Validate => Ok(OrchestrationRequest::Validate {
            file: required(mode, "file", &raw.file)?,
            expectation: optional(&raw.expectation),
        }),
        Mode::Scaffold => Ok(OrchestrationRequest::Scaffold),
    }
}

// Values are kept verbatim; only emptiness is judged on the trimmed form.
fn required(
    mode: Mode,
    field: &'static str,
    value: &Option<String>,
) -> Result<String, RequestError> {
    optional(value).ok_or(RequestError::MissingField { mode, field })
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|value| !value.trim().is_empty())
        .cloned()
}
