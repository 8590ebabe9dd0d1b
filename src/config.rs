use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:4221";

/// Command-line arguments. Listen address and connection cap can also come
/// from the environment.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Minimal HTTP/1.1 file and echo server")]
struct Args {
    /// Directory served under /files/
    #[arg(long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Maximum number of connections handled at once
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 1024)]
    max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub directory: Option<PathBuf>,
    pub max_connections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            directory: None,
            max_connections: 1024,
        }
    }
}

impl Config {
    /// Loads the configuration from the process arguments and environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_args(std::env::args_os())
    }

    /// Parses an argument list; the first item is the program name.
    pub fn from_args<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = Args::try_parse_from(args)?;

        if args.max_connections == 0 {
            anyhow::bail!("--max-connections must be at least 1");
        }

        Ok(Self {
            listen_addr: args.listen,
            directory: args.directory,
            max_connections: args.max_connections,
        })
    }
}
