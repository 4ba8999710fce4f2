mod mreg;

use crate::mreg::commands::Registry;
use crate::mreg::config::{Config, Overrides};
use crate::mreg::context::Context;
use crate::mreg::http::HttpClient;
use crate::mreg::repl;
use clap::Parser;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version, about = "Command line client for mreg")]
struct Cli {
    /// Config file, defaults to ~/.mreg-cli.toml
    #[clap(long)]
    config: Option<PathBuf>,
    #[clap(long)]
    server_ip: Option<String>,
    #[clap(long)]
    server_port: Option<u16>,
    /// Domain appended to short host names
    #[clap(short, long)]
    domain: Option<String>,
    #[clap(long, default_value = "warn")]
    log_level: String,
    /// Run a single command and exit
    #[clap(short = 'c', long)]
    command: Option<String>,
}

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let config = Config::load(
        args.config.as_deref(),
        Overrides {
            server_ip: args.server_ip,
            server_port: args.server_port,
            domain: args.domain,
        },
    )?;
    init_logging(&args.log_level, config.log_file.as_deref())?;
    tracing::info!(server = %config.base_url(), domain = %config.domain, "starting session");

    let transport = HttpClient::new(Duration::from_secs(config.timeout_secs));
    let mut ctx = Context::new(config, Box::new(transport));
    let registry = Registry::new();
    match args.command {
        Some(line) => {
            repl::run_line(&registry, &mut ctx, &line);
        }
        None => repl::run(&registry, &mut ctx, std::io::stdin().lock())?,
    }
    Ok(())
}
