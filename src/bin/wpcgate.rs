use wpcgate::cli::{
    cli_help_lines, load_cli_settings, parse_cli_args, render_agents, render_check, CliInvocation,
    CliVerb,
};
use wpcgate::server::{Gateway, GatewayState};

fn serve(invocation: &CliInvocation) -> Result<(), String> {
    let settings = load_cli_settings(invocation)?;
    let state = GatewayState::from_settings(&settings).map_err(|err| err.to_string())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to start async runtime: {err}"))?;
    runtime
        .block_on(Gateway::start(state, settings.listen))
        .map_err(|err| format!("gateway stopped: {err}"))
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = parse_cli_args(&args)?;
    match invocation.verb {
        CliVerb::Serve => serve(&invocation),
        CliVerb::Check => {
            let settings = load_cli_settings(&invocation)?;
            println!("{}", render_check(&settings)?);
            Ok(())
        }
        CliVerb::Agents => {
            let settings = load_cli_settings(&invocation)?;
            println!("{}", render_agents(&settings)?);
            Ok(())
        }
        CliVerb::Help | CliVerb::Unknown => {
            println!("{}", cli_help_lines().join("\n"));
            Ok(())
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
