use anyhow::Context;
use binder::cluster::ClusterBackend;

pub async fn cluster_start(minions: Option<u32>, provider: Option<String>) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let minions = minions.unwrap_or(config.cluster.num_minions);
    let provider = provider.unwrap_or_else(|| config.cluster.provider.clone());
    let backend = super::backend(&config);

    let report = backend
        .start(minions, &provider)
        .await
        .context("could not launch the cluster")?;

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("cluster started with failed steps; see above for details");
    }
    println!("Started cluster with {minions} node(s) on {provider}");
    Ok(())
}

pub async fn cluster_stop(provider: Option<String>) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let provider = provider.unwrap_or_else(|| config.cluster.provider.clone());

    super::backend(&config)
        .stop(&provider)
        .await
        .context("could not destroy the cluster")?;

    println!("Cluster stopped");
    Ok(())
}
