//! selfheal CLI entry point.

use clap::Parser;

use selfheal::cli::commands;
use selfheal::cli::{handle_error, Cli, Commands};
use selfheal::infrastructure::config::ConfigLoader;
use selfheal::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_offline() {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, config, cli.json).await,
        Commands::Validate(args) => commands::validate::execute(args, cli.json).await,
        Commands::Logs(args) => commands::logs::execute(args, &config, cli.json).await,
        Commands::Config => commands::config::execute(&config, cli.json),
        Commands::History(args) => commands::history::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
