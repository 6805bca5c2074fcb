//! # Configuration Management
//!
//! Loads runtime configuration from the wristmap-config.toml file: the
//! loopback server port the device connects to, the upstream tile source,
//! and the tile encoding the device was configured with.

use crate::tile::TileEncoding;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Application configuration loaded from wristmap-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Loopback HTTP server configuration
    pub server: ServerConfig,
    /// Tile source and encoding configuration
    pub tiles: TileConfig,
}

/// Loopback HTTP server configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port the device-facing server listens on (loopback only)
    pub port: u16,
}

/// Tile source and encoding configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct TileConfig {
    /// Slippy-map URL template with {x}/{y}/{z} placeholders
    pub source_url: String,
    /// Optional bearer token forwarded to the tile provider
    pub auth_token: Option<String>,
    /// Upper bound on a single tile fetch, in seconds
    pub fetch_timeout_secs: u64,
    /// Colour encoding the device expects tiles in
    pub encoding: TileEncoding,
    /// Wire id of the active colour palette (64-colour mode only)
    pub palette_id: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig { port: 9601 },
            tiles: TileConfig {
                source_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
                auth_token: None,
                fetch_timeout_secs: 10,
                encoding: TileEncoding::Palette64,
                palette_id: 1,
            },
        }
    }
}

impl Config {
    /// Load configuration from wristmap-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("wristmap-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(port = config.server.port, "loaded configuration");
                    config
                }
                Err(error) => {
                    warn!(%error, "invalid config file format, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to wristmap-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("wristmap-config.toml", contents)?;
        info!("configuration saved to wristmap-config.toml");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 9601);
        assert_eq!(config.tiles.fetch_timeout_secs, 10);
        assert_eq!(config.tiles.encoding, TileEncoding::Palette64);
        assert_eq!(config.tiles.palette_id, 1);
        assert!(config.tiles.source_url.contains("{z}"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.server.port, parsed.server.port);
        assert_eq!(config.tiles.source_url, parsed.tiles.source_url);
        assert_eq!(config.tiles.encoding, parsed.tiles.encoding);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.server.port, 9601);
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not = [valid").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.server.port, 9601);
    }

    #[test]
    fn test_encoding_names_are_kebab_case() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [tiles]
            source_url = "https://example.com/{z}/{x}/{y}.png"
            fetch_timeout_secs = 5
            encoding = "black-white"
            palette_id = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.tiles.encoding, TileEncoding::BlackWhite);
        assert_eq!(config.tiles.auth_token, None);
    }
}
