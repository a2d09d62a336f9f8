//! Platform logging initialization for healthboard.
//!
//! The dashboard owns the terminal, so logs go to a file unless configured
//! otherwise.

use std::fs::File;
use std::path::{Path, PathBuf};

use healthboard_logging::parse_level;
use log::LevelFilter;
use serde::Deserialize;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
pub enum LogDestination {
    /// Write to the configured log file.
    File,
    /// Write to the terminal (stderr for warnings and errors).
    Terminal,
    /// Write to both file and terminal.
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub destination: LogDestination,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            destination: LogDestination::File,
            level: "info".to_string(),
            file: PathBuf::from("./healthboard.log"),
        }
    }
}

impl LogSettings {
    pub fn level_filter(&self) -> LevelFilter {
        parse_level(&self.level).unwrap_or(LevelFilter::Info)
    }
}

/// Initialize the logger for the configured destination.
pub fn initialize(settings: &LogSettings) {
    let level = settings.level_filter();

    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match settings.destination {
        LogDestination::File => {
            if let Some(file_logger) = create_file_logger(&settings.file, level, config) {
                vec![file_logger]
            } else {
                return;
            }
        }
        LogDestination::Terminal => {
            vec![TermLogger::new(
                level,
                config,
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]
        }
        LogDestination::Both => {
            let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
                level,
                config.clone(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )];
            if let Some(file_logger) = create_file_logger(&settings.file, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_info() {
        let settings = LogSettings {
            level: "chatty".to_string(),
            ..LogSettings::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Info);

        let settings = LogSettings {
            level: "TRACE".to_string(),
            ..LogSettings::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Trace);
    }
}
