use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{
    instrument,
    warn,
};

use kubetest_core::errors::EmptyResult;
use kubetest_core::logging;
use kubetest_engine::{
    Engine,
    MetricsHub,
};
use kubetest_loader::{
    ClusterLoader,
    FilesystemLoader,
};
use kubetest_provisioner::KubernetesProvisioner;

/// CLI surface (spec §6): flags are an external-collaborator boundary, implemented with the same
/// care as everything else -- only their *feature scope* is bounded by non-goals.
#[derive(Clone, Debug, Parser)]
#[command(name = "kubetest", about = "cluster-resident integration test controller")]
struct Options {
    /// Namespace (cluster mode) or directory (filesystem mode) to load tests from.
    #[arg(long)]
    location: String,

    #[arg(long)]
    kubeconfig: Option<String>,

    #[arg(long, default_value = "0.0.0.0:9090")]
    metrics_address: SocketAddr,

    #[arg(long, default_value_t = 30)]
    interval: u64,

    #[arg(long)]
    once: bool,

    #[arg(long)]
    debug: bool,

    #[arg(long)]
    from_filesystem: bool,

    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,
}

fn parse_selectors(raw: &[String]) -> anyhow::Result<BTreeMap<String, Value>> {
    let mut selectors = BTreeMap::new();
    for entry in raw {
        let (key, value) =
            entry.split_once('=').ok_or_else(|| anyhow::anyhow!("malformed --select entry: {entry}"))?;
        selectors.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(selectors)
}

async fn build_client(kubeconfig: Option<&str>) -> anyhow::Result<kube::Client> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = kube::config::Kubeconfig::read_from(path)?;
            kube::Config::from_custom_kubeconfig(kubeconfig, &kube::config::KubeConfigOptions::default()).await?
        },
        None => kube::Config::infer().await?,
    };
    Ok(kube::Client::try_from(config)?)
}

#[instrument(skip(opts), ret, err)]
async fn run(opts: Options) -> EmptyResult {
    let selectors = parse_selectors(&opts.select)?;
    let interval = Duration::from_secs(opts.interval);
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received shutdown signal");
            shutdown.cancel();
        }
    });

    let metrics = MetricsHub::new();
    metrics.serve(opts.metrics_address);

    let client = build_client(opts.kubeconfig.as_deref()).await?;

    if opts.from_filesystem {
        let loader = FilesystemLoader::new(opts.location.clone());
        let provisioner = KubernetesProvisioner::new(client);
        let mut engine = Engine::new(loader, provisioner, metrics, None);
        engine.run(&opts.location, &selectors, interval, opts.once, cancel).await
    } else {
        let informer_cancel = cancel.clone();
        let informer_hub = metrics.clone();
        let namespace = opts.location.clone();
        let informer_client = client.clone();
        tokio::spawn(async move {
            informer_hub.run_informer(informer_client, &namespace, informer_cancel).await;
        });

        let loader = ClusterLoader::new(KubernetesProvisioner::new(client.clone()));
        let provisioner = KubernetesProvisioner::new(client);
        let mut engine = Engine::new(loader, provisioner, metrics, Some(opts.location.clone()));
        engine.run(&opts.location, &selectors, interval, opts.once, cancel).await
    }
}

#[tokio::main]
async fn main() -> EmptyResult {
    let opts = Options::parse();
    logging::setup(if opts.debug { "debug" } else { "info" });
    run(opts).await
}
