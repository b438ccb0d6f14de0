use anyhow::Context;
use binder::cluster::ClusterBackend;

pub async fn apps() -> anyhow::Result<()> {
    let config = super::load_config()?;
    let apps = super::backend(&config)
        .list_apps()
        .await
        .context("could not list deployed apps")?;

    if apps.is_empty() {
        println!("No apps deployed");
    }
    for app_id in apps {
        println!("{app_id}");
    }
    Ok(())
}
