use crate::agents::agent_names;
use crate::config::{load_settings, Settings};
use crate::sandbox::SandboxRoots;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Serve,
    Check,
    Agents,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "serve" => CliVerb::Serve,
        "check" => CliVerb::Check,
        "agents" => CliVerb::Agents,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliInvocation {
    pub verb: CliVerb,
    pub config: Option<PathBuf>,
}

/// Parses `[verb] [--config PATH]`; the verb defaults to `serve`.
pub fn parse_cli_args(args: &[String]) -> Result<CliInvocation, String> {
    let mut verb = None;
    let mut config = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter
                .next()
                .ok_or_else(|| "`--config` requires a path".to_string())?;
            config = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config = Some(PathBuf::from(path));
        } else if verb.is_none() {
            let parsed = parse_cli_verb(arg);
            if parsed == CliVerb::Unknown {
                return Err(format!("unknown command `{arg}`\n{}", cli_help_lines().join("\n")));
            }
            verb = Some(parsed);
        } else {
            return Err(format!("unexpected argument `{arg}`"));
        }
    }
    Ok(CliInvocation {
        verb: verb.unwrap_or(CliVerb::Serve),
        config,
    })
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: wpcgate [command] [--config PATH]".to_string(),
        "Commands:".to_string(),
        "  serve      Start the HTTP gateway (default)".to_string(),
        "  check      Validate settings and print resolved roots".to_string(),
        "  agents     Print configured agent names".to_string(),
        "  help       Show this message".to_string(),
        "Config defaults to $WPCGATE_CONFIG, then ~/.wpcgate/config.yaml".to_string(),
    ]
}

pub fn load_cli_settings(invocation: &CliInvocation) -> Result<Settings, String> {
    load_settings(invocation.config.as_deref()).map_err(|err| err.to_string())
}

pub fn render_check(settings: &Settings) -> Result<String, String> {
    let roots = SandboxRoots::from_config(&settings.roots).map_err(|err| err.to_string())?;
    let mut lines = vec![
        format!("listen={}", settings.listen),
        format!(
            "engine={} {} (timeout {}s, cwd {})",
            settings.engine.interpreter,
            settings.engine.script.display(),
            settings.engine.timeout_secs,
            settings.engine.resolve_working_dir().display()
        ),
    ];
    for root in roots.iter() {
        lines.push(format!("root.{}={}", root.name(), root.path().display()));
    }
    lines.push(format!("browse_root={}", settings.browse_root));
    lines.push(format!("preview_roots={}", settings.preview_roots.join(",")));
    lines.push(format!("agents_file={}", settings.agents_file.display()));
    Ok(lines.join("\n"))
}

pub fn render_agents(settings: &Settings) -> Result<String, String> {
    agent_names(&settings.agents_file)
        .map(|names| names.join("\n"))
        .map_err(|err| err.to_string())
}
