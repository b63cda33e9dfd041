mod cli;
mod commands;
mod config;
mod logging;
mod sampler;
mod table;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::debug;

use cli::Cli;
use config::{config_path, UserConfig};
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let mut user_config = UserConfig::load(&config_file)?;
    user_config.merge_with_args(&cli);

    let _guard = logging::init(
        user_config.log_level,
        LogMode::from_log_to_file(user_config.log_to_file),
    );
    debug!(path = ?config_file, "Configuration loaded");
    if user_config.log_to_file {
        debug!(dir = ?logging::log_dir(), "Writing diagnostics log");
    }

    if cli.list {
        return commands::devices::run(cli.root.as_deref());
    }

    let config = user_config.into_sampler_config(cli.root.as_deref())?;
    commands::capture::run(config)
}
