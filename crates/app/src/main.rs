use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use lv_app::bootstrap::build_app_state;
use lv_app::cli::{self, Cli, Command, ConfigCommand};
use lv_domain::config::ObservabilityConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = cli::load_config()?;
    init_tracing(&config.observability);

    match cli.command {
        Command::Config(ConfigCommand::Validate) => {
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => cli::config::show(&config),
        Command::Version => {
            println!("lovent {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let state = build_app_state(Arc::new(config))?;
            match command {
                Command::Login(args) => cli::session::login(&state, args),
                Command::Start => {
                    cli::session::start(&state);
                    Ok(())
                }
                Command::Whoami { json } => {
                    if !cli::session::whoami(&state, json)? {
                        std::process::exit(1);
                    }
                    Ok(())
                }
                Command::Status { json } => cli::session::status(&state, json),
                Command::Resume => {
                    cli::session::resume(&state);
                    Ok(())
                }
                Command::Logout => {
                    cli::session::logout(&state);
                    Ok(())
                }
                Command::ForgetMe => {
                    cli::session::forget_me(&state);
                    Ok(())
                }
                Command::Config(_) | Command::Version => Ok(()),
            }
        }
    }
}

/// Log to stderr so command output on stdout stays clean.  `RUST_LOG`
/// overrides the configured filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&obs.log_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    if obs.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
