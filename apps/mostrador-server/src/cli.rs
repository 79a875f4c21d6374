//! Command-line argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mostrador-server",
    about = "Mostrador chat assistant server",
    version,
    long_about = "Classifies Spanish shop-counter chat messages and answers price, \
                  product, order and shipping questions from the store catalog."
)]
pub struct Args {
    /// Path to a TOML configuration file (environment still overrides it)
    #[arg(short, long, env = "MOSTRADOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address, overrides `server.host`
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// HTTP server port, overrides `server.port`
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Enable JSON log format (useful for production)
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}
