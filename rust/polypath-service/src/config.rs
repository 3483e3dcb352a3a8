use std::env;
use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Caps `options.max_vertices` of every request when set.
    pub max_vertices: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, max_vertices: None }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("POLYPATH_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("POLYPATH_PORT") {
            Ok(s) => s.parse::<u16>().with_context(|| format!("POLYPATH_PORT={s} is not a port"))?,
            Err(_) => 8080,
        };
        let max_vertices = match env::var("POLYPATH_MAX_VERTICES") {
            Ok(s) => Some(s.parse::<usize>().with_context(|| format!("POLYPATH_MAX_VERTICES={s} is not a count"))?),
            Err(_) => None,
        };
        Ok(Self { host, port, max_vertices })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
