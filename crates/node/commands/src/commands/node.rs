//! Node command - run the storage node.
//!
//! Components are composed explicitly in dependency order:
//! configuration, logging, metrics exporter, storage client, daemon manager,
//! coordinator connector, agent. The agent then runs until SIGINT or SIGTERM.

use crate::cli::NodeArgs;
use cairn_agent::{Agent, AgentConfig, NodeProfile};
use cairn_coordinator::GrpcConnector;
use cairn_ipfs_api::{IpfsClient, StorageApi};
use cairn_ipfs_daemon::{DaemonConfig, DaemonManager, ReadinessConfig};
use cairn_node_core::{args::LogArgs, config::NodeConfig, logging, version};
use eyre::{OptionExt, Result, WrapErr};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{fs, path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run the node command.
pub async fn run(logs: &LogArgs, args: NodeArgs) -> Result<()> {
    let loaded = args.source.load(&args.overrides)?;
    let config = loaded.config;

    logging::init_logging(logs, &config.log.level)?;
    info!(version = version::VERSION, "starting cairn node");
    info!(datadir = %loaded.dirs.root.display(), config = %loaded.path.display(), "data directory");

    config.validate()?;
    loaded.dirs.ensure()?;
    log_node_config(&config);

    if config.metrics.enabled {
        PrometheusBuilder::new()
            .with_http_listener(config.metrics.addr)
            .install()
            .wrap_err("failed to start metrics exporter")?;
        info!(addr = %config.metrics.addr, "serving metrics");
    }

    let agent = build_agent(&config)?;

    let shutdown = CancellationToken::new();
    let signal = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    let result = agent.run(shutdown).await;
    signal.abort();

    result.wrap_err("node failed")?;
    info!("node stopped");
    Ok(())
}

/// Build the agent and its collaborators from resolved configuration.
fn build_agent(config: &NodeConfig) -> Result<Agent<GrpcConnector>> {
    let storage: Arc<dyn StorageApi> =
        Arc::new(IpfsClient::new(&config.ipfs.api_url).wrap_err("invalid ipfs.api_url")?);

    let daemon = Arc::new(DaemonManager::new(daemon_config(config)?, storage.clone()));

    let connector = GrpcConnector::new(&config.coordinator.address, &config.auth.token)
        .with_connect_timeout(config.coordinator.connect_timeout)
        .with_request_timeout(config.coordinator.request_timeout);

    let swarm_key = match &config.network.swarm_key_file {
        Some(path) => read_swarm_key(path)?,
        None => None,
    };

    Ok(Agent::new(agent_config(config, swarm_key), daemon, storage, connector)?)
}

fn daemon_config(config: &NodeConfig) -> Result<DaemonConfig> {
    let data_dir = config
        .ipfs
        .data_dir
        .clone()
        .ok_or_eyre("ipfs.data_dir was not resolved")?;

    let mut daemon = DaemonConfig::new(data_dir)
        .with_readiness(ReadinessConfig {
            interval: config.ipfs.ready_interval,
            timeout: config.ipfs.ready_timeout,
        })
        .with_stop_timeout(config.ipfs.stop_timeout)
        .with_isolation(config.network.isolation);
    daemon.connect_timeout = config.ipfs.connect_timeout;
    if let Some(binary) = &config.ipfs.binary {
        daemon = daemon.with_binary(binary);
    }
    Ok(daemon)
}

fn agent_config(config: &NodeConfig, swarm_key: Option<String>) -> AgentConfig {
    AgentConfig {
        profile: NodeProfile {
            name: config.node.name.clone(),
            region: config.node.region.clone(),
            wallet_address: config.node.wallet_address.clone(),
            capacity_bytes: config.storage.capacity_bytes(),
        },
        swarm_key,
        bootstrap_peers: config.network.bootstrap_peers.clone(),
        heartbeat_interval: config.intervals.heartbeat,
        poll_interval: config.intervals.poll,
        max_concurrent_pins: config.tasks.max_concurrent_pins,
        shutdown_grace: config.tasks.shutdown_grace,
    }
}

/// Contents of the swarm key file. An empty file counts as no key.
fn read_swarm_key(path: &Path) -> Result<Option<String>> {
    let key = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read swarm key {}", path.display()))?;
    if key.trim().is_empty() {
        warn!(path = %path.display(), "swarm key file is empty");
        return Ok(None);
    }
    Ok(Some(key))
}

/// Log the resolved configuration at startup.
fn log_node_config(config: &NodeConfig) {
    info!(
        name = %config.node.name,
        region = %config.node.region,
        capacity_gb = config.storage.capacity_gb,
        "node identity"
    );
    info!(coordinator = %config.coordinator.address, ipfs_api = %config.ipfs.api_url, "endpoints");
    info!(
        heartbeat = %humantime::format_duration(config.intervals.heartbeat),
        poll = %humantime::format_duration(config.intervals.poll),
        max_concurrent_pins = config.tasks.max_concurrent_pins,
        "schedule"
    );
    debug!(
        swarm_key = ?config.network.swarm_key_file,
        bootstrap_peers = config.network.bootstrap_peers.len(),
        isolation = ?config.network.isolation,
        "private network"
    );
}

/// Resolve on the first SIGINT or SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
