//! loganalyst CLI: adaptive security log analysis training.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "loganalyst",
    version,
    about = "Adaptive security log analysis quiz"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an interactive session
    Play {
        /// Skip the classification service and use built-in logs
        #[arg(long)]
        offline: bool,

        /// Classification service base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the service leaderboard
    Leaderboard {
        /// Classification service base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that the classification service is up
    Status {
        /// Classification service base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show which tier a set of statistics leads to
    Difficulty {
        /// Cumulative score
        #[arg(long, default_value = "0")]
        score: u32,

        /// Current streak
        #[arg(long, default_value = "0")]
        streak: u32,

        /// Accuracy percentage (0-100)
        #[arg(long, default_value = "100")]
        accuracy: u32,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    let directive = match "loganalyst=warn".parse() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Error: invalid log directive: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            offline,
            api_url,
            timeout_secs,
            config,
        } => {
            commands::play::execute(commands::ServiceArgs {
                api_url,
                timeout_secs,
                config,
                offline,
            })
            .await
        }
        Commands::Leaderboard { api_url, config } => {
            commands::leaderboard::execute(commands::ServiceArgs::remote(api_url, config)).await
        }
        Commands::Status { api_url, config } => {
            commands::status::execute(commands::ServiceArgs::remote(api_url, config)).await
        }
        Commands::Difficulty {
            score,
            streak,
            accuracy,
        } => commands::difficulty::execute(score, streak, accuracy),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
