use anyhow::Context;
use binder::cluster::ClusterBackend;

pub async fn destroy(app_id: &str) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::backend(&config)
        .destroy_app(app_id)
        .await
        .with_context(|| format!("could not destroy app {app_id}"))?;

    println!("Destroyed {app_id}");
    Ok(())
}
