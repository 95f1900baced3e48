use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const GATEWAY_LOG_FILE: &str = "gateway.log";
pub const SECURITY_LOG_FILE: &str = "security.log";

/// Append-only JSON-line logs. Disabled when no directory is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayLog {
    dir: Option<PathBuf>,
}

impl GatewayLog {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn gateway_log_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(GATEWAY_LOG_FILE))
    }

    pub fn security_log_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(SECURITY_LOG_FILE))
    }

    pub fn info(&self, event: &str, message: &str) {
        if let Some(path) = self.gateway_log_path() {
            append_log_line(&path, "info", event, message);
        }
    }

    pub fn error(&self, event: &str, message: &str) {
        if let Some(path) = self.gateway_log_path() {
            append_log_line(&path, "error", event, message);
        }
    }

    pub fn security(&self, event: &str, message: &str) {
        if let Some(path) = self.security_log_path() {
            append_log_line(&path, "warn", event, message);
        }
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn append_log_line(path: &Path, level: &str, event: &str, message: &str) {
    let payload = serde_json::json!({
        "timestamp": now_secs(),
        "level": level,
        "event": event,
        "message": message,
    });

    let Ok(line) = serde_json::to_string(&payload) else {
        return;
    };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = writeln!(file, "{line}");
}
