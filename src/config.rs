use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Value of the `Server` header on every response
    pub server_name: String,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
            database_url: String::from("sqlite://world_bench.db"),
            max_connections: 32,
            server_name: String::from("world_bench"),
            log_level: String::from("info"),
        }
    }
}

impl Settings {
    pub fn address(&self) -> Result<SocketAddr, Error> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Reads settings from defaults, then the optional file at `path`, then
/// `WORLD_BENCH_*` environment variables (e.g. `WORLD_BENCH_DATABASE_URL`).
pub fn get_configuration(path: &str) -> Result<Settings, ::config::ConfigError> {
    ::config::Config::builder()
        .add_source(::config::Config::try_from(&Settings::default())?)
        .add_source(::config::File::with_name(path).required(false))
        .add_source(
            ::config::Environment::with_prefix("WORLD_BENCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[derive(Debug, Parser)]
#[command(version, about = "TechEmpower-style database benchmark server")]
pub struct Cli {
    /// Configuration file, the extension selects the format
    #[arg(short, long, default_value = "world_bench.yaml")]
    pub config: String,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub database_url: Option<String>,
}

impl Cli {
    /// Loads the layered configuration and applies command line overrides on top.
    pub fn settings(&self) -> Result<Settings, Error> {
        let mut settings = get_configuration(&self.config)?;
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(database_url) = &self.database_url {
            settings.database_url = database_url.clone();
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = get_configuration("does_not_exist.yaml").unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.max_connections, 32);
        assert_eq!(settings.server_name, "world_bench");
    }

    #[test]
    fn command_line_overrides_configuration() {
        let cli = Cli::parse_from([
            "world_bench",
            "--config",
            "does_not_exist.yaml",
            "--port",
            "9000",
            "--database-url",
            "sqlite::memory:",
        ]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.address().unwrap().port(), 9000);
    }
}
