use crate::errors::{AppError, AppResult};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_DATA_PATH: &str = "commands-data.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub data_path: PathBuf,
    pub login_password: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub serialize_writes: bool,
    pub create_if_missing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::from([127, 0, 0, 1]), DEFAULT_PORT),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            login_password: None,
            log_dir: None,
            serialize_writes: true,
            create_if_missing: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |name: &str| lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Validation(format!("PORT must be a port number, got '{}'", raw)))?,
            None => DEFAULT_PORT,
        };
        let host = var("TERMINAL_DB_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip: IpAddr = host
            .parse()
            .map_err(|_| AppError::Validation(format!("TERMINAL_DB_HOST must be an IP address, got '{}'", host)))?;

        Ok(Self {
            bind: SocketAddr::new(ip, port),
            data_path: var("TERMINAL_DB_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            // the password is compared verbatim, so it is not trimmed
            login_password: lookup("TERMINAL_DB_LOGIN_PASSWORD").filter(|value| !value.is_empty()),
            log_dir: var("TERMINAL_DB_LOG_DIR").map(PathBuf::from),
            serialize_writes: parse_flag(var("TERMINAL_DB_SERIALIZE_WRITES"), true),
            create_if_missing: parse_flag(var("TERMINAL_DB_CREATE_IF_MISSING"), true),
        })
    }
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"),
        None => default,
    }
}
