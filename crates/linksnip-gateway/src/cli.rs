use clap::{Parser, ValueEnum};
use linksnip_shortener::DEFAULT_MAX_ATTEMPTS;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "LINKSNIP_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "LINKSNIP_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "LINKSNIP_STORAGE_BACKEND";
pub const SQLITE_URL_ENV: &str = "LINKSNIP_SQLITE_URL";
pub const MAX_ATTEMPTS_ENV: &str = "LINKSNIP_MAX_ATTEMPTS";
pub const CACHE_CAPACITY_ENV: &str = "LINKSNIP_CACHE_CAPACITY";
pub const CACHE_TTL_ENV: &str = "LINKSNIP_CACHE_TTL_SECS";
pub const CACHE_TTI_ENV: &str = "LINKSNIP_CACHE_TTI_SECS";
pub const REQUEST_TIMEOUT_ENV: &str = "LINKSNIP_REQUEST_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LINKSNIP_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://linksnip.site";
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// LinkSnip HTTP server.
#[derive(Debug, Parser)]
#[command(name = "linksnip", version, about = "URL shortener HTTP server")]
pub struct Config {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Base that short URLs are built on, e.g. `https://linksnip.site`.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    /// e.g. `sqlite://linksnip.db`
    #[arg(long, env = SQLITE_URL_ENV, required_if_eq("storage", "sqlite"))]
    pub sqlite_url: Option<String>,

    /// Generated codes to try before answering 503.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,

    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: u64,

    /// Seconds a cached link lives after it is loaded.
    #[arg(
        long,
        env = CACHE_TTL_ENV,
        default_value_t = DEFAULT_CACHE_TTL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub cache_ttl_secs: u64,

    /// Seconds a cached link may go unread before it is dropped.
    #[arg(long, env = CACHE_TTI_ENV, value_parser = clap::value_parser!(u64).range(1..))]
    pub cache_tti_secs: Option<u64>,

    #[arg(long, env = REQUEST_TIMEOUT_ENV, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
