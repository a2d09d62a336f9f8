mod platform;

use clap::Parser;

use platform::config::{AppConfig, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?.with_overrides(&cli);
    platform::logging::initialize(&config.log);
    platform::run_app(config)
}
