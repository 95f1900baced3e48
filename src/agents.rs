use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AgentsError {
    #[error("agents configuration {path} not found")]
    Missing { path: String },
    #[error("failed to read agents configuration {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid agents configuration {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One entry of the engine's agents file. Only the name ever leaves the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentDefinition {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub url: String,
}

pub fn load_agents(path: &Path) -> Result<BTreeMap<String, AgentDefinition>, AgentsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AgentsError::Missing {
                path: path.display().to_string(),
            })
        }
        Err(source) => {
            return Err(AgentsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| AgentsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Agent names sorted by name.
pub fn agent_names(path: &Path) -> Result<Vec<String>, AgentsError> {
    Ok(load_agents(path)?.into_keys().collect())
}
