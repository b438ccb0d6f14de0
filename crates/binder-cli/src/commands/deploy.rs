use std::path::Path;

use binder::pipeline::DeployPipeline;

pub async fn deploy(spec: &Path, mode: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let (app, services) = super::load_app(spec, &config)?;
    let backend = super::backend(&config);

    let Some(url) = DeployPipeline::new(&config, &backend)
        .run(&app, &services, mode)
        .await
    else {
        anyhow::bail!("deployment of {} ({}) failed; see the log above", app.name(), app.id());
    };

    println!("Deployed {} as {}", app.name(), app.id());
    println!("Access app at:");
    println!("   {url}");
    Ok(())
}
