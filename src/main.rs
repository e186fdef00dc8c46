use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use coverfeat::{Corpus, CorpusDataset, FeatureCache, FeatureConfig, PipelineError};

/// Extract and cache labeled audio features for a cover-song corpus.
#[derive(Debug, Parser)]
#[command(name = "coverfeat", version)]
struct Args {
    /// Corpus root directory (one subdirectory per original song)
    #[arg(default_value = "coversongs/covers32k")]
    root: PathBuf,

    /// Directory for serialized feature and label artifacts
    #[arg(long, default_value = "features")]
    cache_dir: PathBuf,

    /// Recompute everything, ignoring any cached artifacts
    #[arg(long)]
    force: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), PipelineError> {
    let cache = FeatureCache::new(&args.cache_dir);
    let config = FeatureConfig::default();

    let corpus = Corpus::discover(&args.root, &cache, args.force)?;
    let dataset = CorpusDataset::load_or_build(&corpus, &cache, &config, args.force)?;

    log::info!(
        "dataset ready: {} songs, {} files, frame tensor {}x{}, mel {}x{}, mfcc {}x{}",
        corpus.vocabulary().len(),
        corpus.files().len(),
        dataset.frame_tensor.nrows(),
        dataset.frame_tensor.ncols(),
        dataset.mel.nrows(),
        dataset.mel.ncols(),
        dataset.mfcc.nrows(),
        dataset.mfcc.ncols(),
    );
    println!("Done!");
    Ok(())
}
