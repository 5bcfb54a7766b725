use std::env;

use anyhow::{Context, bail};
use log::info;

use trajectory_loader::{LoaderConfig, TrajectoryLoader, store::JsonStore};

const DEFAULT_DATA_DIR: &str = "data";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(config_path) = args.next() else {
        bail!("usage: trajectory-loader <config.json> [steps]");
    };

    let config = LoaderConfig::from_json_file(&config_path)
        .with_context(|| format!("reading config {config_path}"))?;

    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    let store = JsonStore::new(&data_dir);

    let mut loader = TrajectoryLoader::new(config, &store)
        .with_context(|| format!("building loader over {data_dir}"))?;

    let steps = match args.next() {
        Some(steps) => steps.parse::<usize>().context("steps must be a positive integer")?,
        None => loader.num_batches(),
    };

    info!(
        "{} config(s), {} batch(es) per epoch, sampling {steps}",
        loader.configs().len(),
        loader.num_batches()
    );

    for _ in 0..steps {
        let batch = loader.next_batch()?;
        info!(
            "batch {:?}: {}[{}..={}] this_x {:?} context_x {:?} y {:?} context_future {:?} on {:?}",
            loader.current_sampled_id(),
            batch.config,
            batch.start,
            batch.end,
            batch.this_x.dim(),
            batch.context_x.dim(),
            batch.y.dim(),
            batch.context_future.dim(),
            batch.device(),
        );
    }

    Ok(())
}
