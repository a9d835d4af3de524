use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Clone, Debug, Parser)]
#[command(name = "blobstream", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// Key of the object to download.
    pub key: String,

    /// Container (bucket) holding the object.
    #[arg(long, short)]
    pub container: Option<String>,

    /// Base URL of the blob store.
    #[arg(long, short, env = "BLOBSTREAM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token sent with every range request.
    #[arg(long, env = "BLOBSTREAM_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Seconds until the token expires. Omit for tokens that never expire.
    #[arg(long)]
    pub token_ttl: Option<i64>,

    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Bytes per range request.
    #[arg(long, conflicts_with = "demand_sized")]
    pub chunk_size: Option<u64>,

    /// Size each range request by the reader's buffer instead of a fixed size.
    #[arg(long)]
    pub demand_sized: bool,

    /// Range requests allowed in flight at once.
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Per-range timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// TOML file with `endpoint`, `container` and a `[stream]` table.
    #[arg(long = "config", short = 'C')]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl App {
    /// Default log directive for the requested verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "blobstream=debug,info",
            _ => "blobstream=trace,debug",
        }
    }
}
