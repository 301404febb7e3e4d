use anyhow::{Context, bail};
use clap::Parser;
use core::time::Duration;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

/// Port used when none (or an unusable one) is given.
pub const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration for the `hashvault-server` binary.
///
/// Values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first), with defaults matching the reference behavior.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hashvault-server",
    version,
    about = "An HTTP service that hashes passwords after a delay"
)]
pub struct CliArgs {
    /// Port to listen on.
    ///
    /// Accepted values are `80` or anything in `1024..=65535`. Any other
    /// value, including one that does not parse, falls back to `8080`.
    #[arg(value_name = "PORT", allow_hyphen_values = true)]
    pub port: Option<String>,

    /// Address to bind.
    ///
    /// Environment variable: `HASHVAULT_HOST`
    #[arg(long, env = "HASHVAULT_HOST", default_value_t = String::from("0.0.0.0"))]
    pub host: String,

    /// Seconds to wait before a submitted password is hashed.
    ///
    /// Environment variable: `HASH_DELAY_SECS`
    #[arg(long, env = "HASH_DELAY_SECS", default_value_t = 5)]
    pub hash_delay_secs: u64,

    /// Upper bound, in seconds, on how long shutdown waits for in-flight
    /// requests and pending hash jobs before forcing the stop.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// File served on `GET /hash` in place of the built-in form page.
    ///
    /// Environment variable: `HASH_FORM_PATH`
    #[arg(long, env = "HASH_FORM_PATH")]
    pub form_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub hash_delay: Duration,
    pub shutdown_timeout: Duration,
    pub form_path: Option<PathBuf>,
}

impl ServerConfig {
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.shutdown_timeout_secs == 0 {
            bail!("SHUTDOWN_TIMEOUT_SECS must be greater than 0");
        }

        if args
            .form_path
            .as_deref()
            .is_some_and(|path| path.trim().is_empty())
        {
            bail!("HASH_FORM_PATH must not be empty");
        }

        let host = args
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("invalid HASHVAULT_HOST `{}`", args.host))?;

        Ok(Self {
            host,
            port: resolve_port(args.port.as_deref()),
            hash_delay: Duration::from_secs(args.hash_delay_secs),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
            form_path: args.form_path.map(PathBuf::from),
        })
    }
}

/// Picks the listening port from the raw argument.
///
/// `80` and `1024..=65535` are accepted; absence, parse failures, and every
/// other value yield [`DEFAULT_PORT`].
pub fn resolve_port(raw: Option<&str>) -> u16 {
    raw.and_then(|raw| raw.trim().parse::<u16>().ok())
        .filter(|&port| port == 80 || port >= 1024)
        .unwrap_or(DEFAULT_PORT)
}
