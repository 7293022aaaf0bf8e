mod cli;
mod commands;
mod dom;
mod output;

use clap::Parser;
use objectsync::{Server, ServerConfig};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, DemoArgs};
use output::OutputFormat;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("objectsync=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);
    let config = load_config(&cli)?;
    tracing::debug!(?config, "loaded configuration");

    let mut server = Server::with_config(config)?;
    dom::register(&mut server)?;

    match cli.command.unwrap_or(Commands::Demo(DemoArgs { undo: 2 })) {
        Commands::Demo(args) => commands::demo::run(&mut server, &args, format),
        Commands::Snapshot(args) => commands::snapshot::run(&mut server, &args, format),
        Commands::History(args) => commands::history::run(&mut server, &args, format),
    }
}

/// Read the configuration file, if any, then apply command line overrides.
fn load_config(cli: &Cli) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            tracing::info!(path = %path.display(), "loaded config file");
            ServerConfig::from_json_str(&json)?
        }
        None => ServerConfig::default(),
    };
    if let Some(depth) = cli.history_depth {
        config = config.with_history_depth(depth);
    }
    Ok(config)
}
