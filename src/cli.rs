use clap::{Parser, Subcommand};

use crate::config::Strategy;

#[derive(Parser, Debug)]
#[command(
    name = "tilepilot",
    about = "Heuristic autoplayer for browser 2048-style tile games",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one automated session against the game page
    Play {
        /// Game URL (defaults to the configured one)
        url: Option<String>,

        /// Move policy to drive the run
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Run the browser headless
        #[arg(long)]
        headless: bool,

        /// WebDriver endpoint (e.g., "http://localhost:9515")
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Show effective configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}
