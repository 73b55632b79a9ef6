use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use decipher::config::Config;
use std::process;
use tracing::{error, info};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with search settings; explicit flags win over it
    #[arg(global = true, long)]
    config: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recover the plaintext of a substitution cipher
    Solve(cmd::solve::SolveArgs),
    /// Encode a text with a random substitution key
    Scramble(cmd::scramble::ScrambleArgs),
}

fn main() {
    tracing_subscriber::fmt::init();

    // Raw matches tell user input apart from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let result = match cli.command {
        Commands::Solve(mut args) => {
            if let Some(path) = &cli.config {
                info!("📂 Loading config from: {}", path);
                let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                    error!("❌ {}", e);
                    process::exit(1);
                });
                if let Some(sub_matches) = matches.subcommand_matches("solve") {
                    file_config.merge_from_cli(&args.config, sub_matches);
                }
                args.config = file_config;
            }
            cmd::solve::run(args)
        }
        Commands::Scramble(args) => cmd::scramble::run(args),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
