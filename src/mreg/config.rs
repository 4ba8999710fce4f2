use crate::mreg::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DOMAIN: &str = "uio.no";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
const CONFIG_FILE_NAME: &str = ".mreg-cli.toml";

/// Values as they appear in the config file; everything is optional until
/// merged with the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub server_ip: Option<String>,
    pub server_port: Option<u16>,
    pub domain: Option<String>,
    pub log_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub server_ip: Option<String>,
    pub server_port: Option<u16>,
    pub domain: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_ip: String,
    pub server_port: u16,
    pub domain: String,
    pub log_file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl FileConfig {
    pub fn parse(path: &str, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: String::from(path),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::parse(&display, &text)
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
    }

    /// Reads `path`, or the default file when it exists, and applies the
    /// command-line overrides on top.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => FileConfig::read(p)?,
            None => match Self::default_path() {
                Some(p) if p.is_file() => FileConfig::read(&p)?,
                _ => FileConfig::default(),
            },
        };
        Self::merge(file, overrides)
    }

    pub fn merge(file: FileConfig, overrides: Overrides) -> Result<Self, ConfigError> {
        let server_ip = overrides
            .server_ip
            .or(file.server_ip)
            .ok_or(ConfigError::MissingField("server_ip"))?;
        let server_port = overrides
            .server_port
            .or(file.server_port)
            .ok_or(ConfigError::MissingField("server_port"))?;
        Ok(Config {
            server_ip,
            server_port,
            domain: overrides
                .domain
                .or(file.domain)
                .unwrap_or_else(|| String::from(DEFAULT_DOMAIN)),
            log_file: file.log_file,
            timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server_ip, self.server_port)
    }

    /// Absolute url of an API path such as `/hosts/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}
