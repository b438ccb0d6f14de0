use std::path::Path;

use binder::{AppSpec, BuildStateStore, FileStateStore};

pub fn state(spec: &Path) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let spec = AppSpec::from_file(spec)?;
    let store = FileStateStore::new(config.build_state_path());

    match store.get(&spec.name)? {
        Some(state) => println!("{}: {state}", spec.name),
        None => println!("{}: never built", spec.name),
    }
    Ok(())
}
