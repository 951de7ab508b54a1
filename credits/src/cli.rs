use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// credits — buy posting credits with SOL.
#[derive(Parser, Debug)]
#[command(name = "credits", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the interactive purchase app
    App(AppArgs),

    /// Serve the static landing page
    Serve(ServeArgs),
}

/// Arguments for the `app` subcommand.
#[derive(Parser, Debug)]
pub struct AppArgs {
    /// Backend API base URL (overrides CREDITS_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Solana RPC URL (overrides SOLANA_RPC_URL)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Wallet keypair file
    #[arg(long, default_value = "~/.config/solana/id.json")]
    pub keypair: String,

    /// File for the locally mirrored user profile
    #[arg(long)]
    pub user_mirror: Option<PathBuf>,
}

impl AppArgs {
    /// Keypair path with a leading `~` expanded against `$HOME`.
    pub fn keypair_path(&self) -> PathBuf {
        if let Some(rest) = self.keypair.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.keypair)
    }
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on (falls back to WEB_PORT, then 8080)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory of static files to serve
    #[arg(long, default_value = "public")]
    pub dir: PathBuf,
}
