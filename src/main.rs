//! kshell - interactive Kafka admin shell

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use kshell::admin_kafka::KafkaAdmin;
use kshell::profile::{self, DEFAULT_PROFILE};
use kshell::{shell, Result, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kshell", version, about = "Interactive admin shell for Kafka clusters")]
struct Cli {
    /// Connection profile under ~/.kafka (<profile>.properties)
    #[arg(short, long, env = "KSHELL_PROFILE", default_value = DEFAULT_PROFILE)]
    profile: String,

    /// Override bootstrap.servers from the profile
    #[arg(short, long, env = "KSHELL_BOOTSTRAP_SERVERS")]
    bootstrap_servers: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kshell=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&cli) {
        eprintln!("{} {e}", "error:".red().bold());
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run(cli: &Cli) -> Result<()> {
    let mut properties = profile::load_profile(&cli.profile)?;
    if let Some(servers) = &cli.bootstrap_servers {
        properties.insert("bootstrap.servers".to_string(), servers.clone());
    }

    let servers = properties
        .get("bootstrap.servers")
        .cloned()
        .unwrap_or_default();
    info!(profile = %cli.profile, servers = %servers, "connecting");

    let admin = KafkaAdmin::connect(&properties)?;
    println!("{}", format!("Connected to {servers}.").green());

    let mut session = Session::new(Arc::new(admin), properties);
    shell::run(&mut session)
}
