use crate::alphabet::AlphabetPreset;
use crate::error::{DcResult, DecipherError};
use crate::optimizer::runner::validate_sampler;
use crate::optimizer::SamplerParams;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub alphabet: AlphabetParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchParams {
    /// Iterations per chain
    #[arg(short = 'e', long = "iters", default_value_t = 500_000)]
    pub iterations: usize,
    /// Report progress every N iterations
    #[arg(short = 'p', long, default_value_t = 10_000)]
    pub print_every: usize,
    #[arg(long, default_value_t = 1.0)]
    pub temp_initial: f64,
    #[arg(long, default_value_t = 0.001)]
    pub temp_final: f64,
    /// Parallel chains (defaults to available cores)
    #[arg(long)]
    pub chains: Option<usize>,
    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            iterations: 500_000,
            print_every: 10_000,
            temp_initial: 1.0,
            temp_final: 0.001,
            chains: None,
            seed: None,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AlphabetParams {
    /// Characters the search may shuffle: latin, lowercase or training
    #[arg(long = "alphabet", default_value = "latin")]
    pub perturb: AlphabetPreset,
}

impl SearchParams {
    pub fn sampler(&self) -> SamplerParams {
        SamplerParams {
            iterations: self.iterations,
            print_every: self.print_every,
            initial_temp: self.temp_initial,
            final_temp: self.temp_final,
        }
    }

    pub fn validate(&self) -> DcResult<()> {
        if self.chains == Some(0) {
            return Err(DecipherError::Config(
                "Chain count must be at least 1".to_string(),
            ));
        }
        validate_sampler(&self.sampler())
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DcResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Copies every value the user typed on the command line over `self`,
    /// leaving file-provided values for anything left at its default.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(search.iterations);
        update_if_present!(search.print_every);
        update_if_present!(search.temp_initial);
        update_if_present!(search.temp_final);
        update_if_present!(search.chains);
        update_if_present!(search.seed);
        update_if_present!(alphabet.perturb);
    }
}
