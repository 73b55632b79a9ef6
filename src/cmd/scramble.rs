use crate::reports;
use clap::Args;
use decipher::alphabet::AlphabetPreset;
use decipher::api;
use decipher::error::DcResult;
use decipher::scorer::loader::{read_text, save_key};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ScrambleArgs {
    /// Text to encode
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Where to write the ciphertext
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Where to save the key
    #[arg(short = 'k', long)]
    pub key: PathBuf,

    #[arg(long, default_value = "latin")]
    pub alphabet: AlphabetPreset,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

pub fn run(args: ScrambleArgs) -> DcResult<()> {
    let text = read_text(&args.input)?;
    let scrambled = api::scramble(&text, args.alphabet, args.seed)?;

    info!("🔑 Generated a new random key over the {} alphabet", args.alphabet);
    reports::print_key_table(&scrambled.key);

    fs::write(&args.output, &scrambled.ciphertext)?;
    info!("💾 Saved scrambled text to {}", args.output.display());

    save_key(&scrambled.key, &args.key)?;
    Ok(())
}
