use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

/// Server-rendered discussion forum backed by SQLite.
#[derive(Debug, Parser)]
#[command(name = "forum", version)]
pub struct Config {
    /// HTTP network address; a bare ":port" listens on all interfaces
    #[arg(long, env = "FORUM_ADDR", default_value = ":4000")]
    pub addr: String,

    /// Path to the SQLite database file
    #[arg(long, env = "FORUM_DB", default_value = "./db.sqlite")]
    pub db: PathBuf,

    /// Directory served under /static
    #[arg(long, env = "FORUM_STATIC_DIR", default_value = "./ui/static")]
    pub static_dir: PathBuf,

    /// Only send the session cookie over HTTPS
    #[arg(long, env = "FORUM_SECURE_COOKIES")]
    pub secure_cookies: bool,
}

impl Config {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = match self.addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => self.addr.clone(),
        };
        addr.parse()
            .with_context(|| format!("invalid listen address {:?}", self.addr))
    }
}
