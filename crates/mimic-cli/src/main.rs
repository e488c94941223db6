//! `mimic` — run the bot, or poke at its brain offline.

mod offline;

use clap::{CommandFactory, Parser, Subcommand};
use mimic::Settings;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mimic", version, about = "Learns how everyone in the chat talks, and can talk like them.")]
struct Cli {
    /// Settings file (TOML). MIMIC_* variables override its [engine] table.
    #[arg(long, short, global = true, env = "MIMIC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (IRC when enabled in settings, otherwise the console)
    Run {
        /// Use the stdin/stdout console even if IRC is enabled
        #[arg(long)]
        console: bool,
    },
    /// Print a response generated from a participant's stored model
    Speak {
        participant: String,
        /// Seed text; defaults to a generic greeting
        seed_text: Vec<String>,
        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Train a participant's model from a text file, one message per line
    Train { participant: String, file: PathBuf },
    /// List stored models, or show one model's statistics
    Inspect { participant: Option<String> },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Run { .. }) {
        mimic::init_tracing();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Run { console } => mimic::runtime::run(settings, console).await,
        Commands::Speak { participant, seed_text, seed } => {
            offline::speak(&settings, &participant, &seed_text.join(" "), seed)
        }
        Commands::Train { participant, file } => offline::train(&settings, &participant, &file),
        Commands::Inspect { participant } => offline::inspect(&settings, participant.as_deref()),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "mimic", &mut std::io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
