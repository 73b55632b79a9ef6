use crate::reports;
use clap::Args;
use decipher::api;
use decipher::config::Config;
use decipher::error::DcResult;
use decipher::optimizer::TracingObserver;
use decipher::scorer::loader::{read_text, save_key};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub config: Config,

    /// Training text for the language model
    #[arg(short = 'i', long)]
    pub train: PathBuf,

    /// Ciphertext to decode
    #[arg(short = 'd', long)]
    pub decode: PathBuf,

    /// Where to write the deciphered text
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Where to save the recovered key
    #[arg(long)]
    pub key_out: Option<PathBuf>,

    /// Where to write a JSON run report
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn run(args: SolveArgs) -> DcResult<()> {
    info!("📂 Training text: {}", args.train.display());
    let train_text = read_text(&args.train)?;
    info!("📂 Ciphertext: {}", args.decode.display());
    let decode_text = read_text(&args.decode)?;

    let report = api::decipher(&train_text, &decode_text, &args.config, &TracingObserver)?;

    reports::print_chain_summary(&report.chains, report.best_chain);
    reports::print_key_table(&report.key);
    reports::print_plaintext(report.log_prob, &report.plaintext);

    if let Some(path) = &args.output {
        // A failed write keeps the result on screen rather than aborting.
        match fs::write(path, &report.plaintext) {
            Ok(()) => info!("💾 Saved deciphered text to {}", path.display()),
            Err(e) => error!("Could not save output to {}: {}", path.display(), e),
        }
    }

    if let Some(path) = &args.key_out {
        save_key(&report.key, path)?;
    }

    if let Some(path) = &args.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("💾 Saved run report to {}", path.display());
    }

    Ok(())
}
