use std::path::PathBuf;

use anyhow::Context;
use binder::AppSpec;
use binder::cluster::{ClusterBackend, PreloadReport};

pub async fn preload(image: &str) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let report = super::backend(&config)
        .preload_image(image)
        .await
        .with_context(|| format!("could not preload {image}"))?;

    print_report(&report);
    Ok(())
}

pub async fn preload_all(specs: &[PathBuf]) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let names = specs
        .iter()
        .map(|path| AppSpec::from_file(path).map(|spec| spec.name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut failed = 0;
    for result in super::backend(&config).preload_all(&names).await {
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                tracing::error!(error = %e, "preload failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} image(s) could not be preloaded");
    }
    Ok(())
}

fn print_report(report: &PreloadReport) {
    println!(
        "{}: dispatched to {} node(s), {} failed",
        report.image,
        report.pulled.len() + report.failed.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        println!("  NG  {}  {}", failure.node, failure.error.trim());
    }
}
