use std::path::Path;

use binder::build::HttpRepoProbe;
use binder::exec::RealExecutor;
use binder::pipeline::{BuildOptions, BuildPipeline};
use binder::{BuildState, FileStateStore};

pub async fn build(spec: &Path, build_base: bool, preload: bool) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let (app, services) = super::load_app(spec, &config)?;
    let backend = super::backend(&config);
    let states = FileStateStore::new(config.build_state_path());
    let probe = HttpRepoProbe::new();

    let pipeline = BuildPipeline::new(&config, &RealExecutor, &probe, &backend, &states);
    let options = BuildOptions {
        build_base,
        preload,
    };
    let state = pipeline.run(&app, &services, options).await;

    println!("{}: {state}", app.name());
    if state == BuildState::Failed {
        anyhow::bail!("build of {} failed; see the log above", app.name());
    }
    Ok(())
}
