use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};

use crate::telemetry::LogFormat;

pub const HOST_ENV: &str = "BURROW_HOST";
pub const PORT_ENV: &str = "PORT";
pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const SQLITE_DSN_ENV: &str = "BURROW_SQLITE_DSN";
pub const VISIT_QUEUE_CAPACITY_ENV: &str = "BURROW_VISIT_QUEUE_CAPACITY";
pub const MAX_CREATE_ATTEMPTS_ENV: &str = "BURROW_MAX_CREATE_ATTEMPTS";
pub const PUBLIC_BASE_URL_ENV: &str = "BURROW_PUBLIC_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "8080";
pub const DEFAULT_SQLITE_DSN: &str = "sqlite://burrow.db";
pub const DEFAULT_VISIT_QUEUE_CAPACITY: &str = "100";
pub const DEFAULT_MAX_CREATE_ATTEMPTS: &str = "3";

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

#[derive(Debug, Parser)]
#[command(name = "burrow-gateway", version, about = "Burrow URL shortener HTTP gateway")]
pub struct CLI {
    #[arg(long, env = HOST_ENV, default_value = DEFAULT_HOST)]
    pub host: IpAddr,

    #[arg(long, env = PORT_ENV, default_value = DEFAULT_PORT)]
    pub port: u16,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = SQLITE_DSN_ENV, default_value = DEFAULT_SQLITE_DSN)]
    pub sqlite_dsn: String,

    /// Pending visit increments buffered by the in-memory backend.
    #[arg(
        long,
        env = VISIT_QUEUE_CAPACITY_ENV,
        default_value = DEFAULT_VISIT_QUEUE_CAPACITY,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub visit_queue_capacity: u64,

    /// Codes tried per create request before a collision is reported.
    #[arg(
        long,
        env = MAX_CREATE_ATTEMPTS_ENV,
        default_value = DEFAULT_MAX_CREATE_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_create_attempts: u32,

    /// Base of returned short URLs; defaults to `http://<Host header>`.
    #[arg(long, env = PUBLIC_BASE_URL_ENV)]
    pub public_base_url: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CLI {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
