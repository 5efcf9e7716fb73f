use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rami", about = "Rami Ledger: score keeping for Rami card games", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Game to operate on
    #[arg(short, long, global = true, default_value = "default")]
    pub game: String,

    /// Directory holding saved games
    #[arg(long, global = true, default_value = "games")]
    pub data_dir: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a new game
    New(NewArgs),
    /// Record one round of score changes
    Round(RoundArgs),
    /// Show current scores and standings
    Scores,
    /// Show cumulative scores after every round
    History,
    /// Show the raw score changes of every round
    Rounds,
    /// Clear all rounds, optionally with a new set of players
    Reset(ResetArgs),
    /// Check a saved game for inconsistencies
    Verify,
    /// List saved games
    List,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Player names in seat order
    #[arg(short, long, num_args = 1.., required = true)]
    pub players: Vec<String>,
}

#[derive(Args)]
pub struct RoundArgs {
    /// Score changes as NAME=AMOUNT, one per player
    #[arg(required = true, value_parser = parse_score)]
    pub scores: Vec<(String, i64)>,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Replace the players; keeps the current ones when omitted
    #[arg(short, long, num_args = 1..)]
    pub players: Option<Vec<String>>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

/// Parse `NAME=AMOUNT`. The name may itself contain `=`; the last one splits.
pub fn parse_score(s: &str) -> Result<(String, i64), String> {
    let (name, amount) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got {s:?}"))?;
    if name.trim().is_empty() {
        return Err(format!("missing player name in {s:?}"));
    }
    let amount = amount
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid amount in {s:?}: {e}"))?;
    Ok((name.to_string(), amount))
}
