use std::{path::Path, str::FromStr};

use anyhow::Context;
use datastore_bench::RunConfig;
use log::{info, warn, LevelFilter};

fn main() -> anyhow::Result<()> {
    let level = match std::env::var("BENCH_LOG") {
        Ok(v) => LevelFilter::from_str(v.trim()).with_context(|| format!("invalid BENCH_LOG {v:?}"))?,
        Err(_) => LevelFilter::Info,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .add_filter_allow_str("datastore_bench")
            .add_filter_allow_str("workload")
            .add_filter_allow_str("sqlmap")
            .build(),
        Default::default(),
        Default::default(),
    )?;

    let target_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("storage");
    if target_dir.exists() {
        fs_err::remove_dir_all(&target_dir)?;
    }
    let config = RunConfig::new(&target_dir).with_env_overrides()?;
    info!("{config:?}");

    let results = datastore_bench::run(&config)?;
    fs_err::remove_dir_all(config.storage())?;

    results.stdout()?;
    results.speedup_stdout()?;
    results.analysis_stdout()?;
    if let Some(dir) = config.csv_output() {
        results.write_csv(dir)?;
        info!("wrote csv files to {}", dir.display());
    }

    let failed = results.failures().count();
    if failed > 0 {
        warn!("{failed} of {} measurements failed", results.measurements().len());
    }

    Ok(())
}
