//! CLI argument assembly and top-level parser.

use cairn_ipfs_daemon::IsolationPolicy;
use cairn_node_core::{config::NodeConfig, version::LONG_VERSION};
use clap::{Args, Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

use cairn_node_core::args::{DataDirArgs, LogArgs};

/// Cairn - storage node for a peer-contributed IPFS network
#[derive(Debug, Parser)]
#[command(author, version, long_version = LONG_VERSION.as_str(), about, long_about = None)]
pub struct Cli {
    /// Logging configuration.
    #[command(flatten)]
    pub logs: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Node commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the storage node until interrupted.
    Node(NodeArgs),
    /// Inspect the effective configuration.
    Config(ConfigArgs),
}

/// Arguments for the `node` command.
#[derive(Debug, Args)]
pub struct NodeArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the `config` command.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Print the merged configuration as TOML instead of its location.
    #[arg(long)]
    pub show: bool,

    #[command(flatten)]
    pub source: ConfigSourceArgs,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Where configuration is read from.
#[derive(Debug, Args, Clone, Default)]
pub struct ConfigSourceArgs {
    #[command(flatten)]
    pub datadir: DataDirArgs,

    /// Configuration file. Defaults to `<datadir>/config.toml`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Per-run overrides of configuration file settings.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Overrides")]
pub struct OverrideArgs {
    /// Coordinator gRPC address.
    #[arg(long = "coordinator.address", value_name = "ADDR")]
    pub coordinator_address: Option<String>,

    /// IPFS control API URL.
    #[arg(long = "ipfs.api-url", value_name = "URL")]
    pub ipfs_api_url: Option<String>,

    /// IPFS data directory.
    #[arg(long = "ipfs.data-dir", value_name = "PATH")]
    pub ipfs_data_dir: Option<PathBuf>,

    /// IPFS executable.
    #[arg(long = "ipfs.binary", value_name = "PATH")]
    pub ipfs_binary: Option<PathBuf>,

    /// Node display name.
    #[arg(long = "node.name", value_name = "NAME")]
    pub node_name: Option<String>,

    /// Region label.
    #[arg(long = "node.region", value_name = "REGION")]
    pub node_region: Option<String>,

    /// Payout wallet address.
    #[arg(long = "node.wallet-address", value_name = "ADDRESS")]
    pub wallet_address: Option<String>,

    /// Capacity offered to the network, in GiB.
    #[arg(long = "storage.capacity-gb", value_name = "GIB")]
    pub capacity_gb: Option<u64>,

    /// Time between heartbeats (e.g. "1m").
    #[arg(long = "intervals.heartbeat", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub heartbeat_interval: Option<Duration>,

    /// Time between pin task polls (e.g. "30s").
    #[arg(long = "intervals.poll", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Swarm key file for a private network.
    #[arg(long = "network.swarm-key-file", value_name = "PATH")]
    pub swarm_key_file: Option<PathBuf>,

    /// Bootstrap peer multiaddress. Repeat to give several; replaces the configured list.
    #[arg(long = "network.bootstrap-peer", value_name = "MULTIADDR")]
    pub bootstrap_peers: Vec<String>,

    /// Refuse to start without a swarm key.
    #[arg(long = "network.require-isolation")]
    pub require_isolation: bool,

    /// Maximum number of pins running at once.
    #[arg(long = "tasks.max-concurrent-pins", value_name = "COUNT")]
    pub max_concurrent_pins: Option<usize>,

    /// Serve Prometheus metrics.
    #[arg(long)]
    pub metrics: bool,

    /// Prometheus exporter address.
    #[arg(long = "metrics.addr", value_name = "SOCKET")]
    pub metrics_addr: Option<SocketAddr>,
}

impl OverrideArgs {
    /// Apply every flag that was given on top of `config`.
    pub fn apply(&self, config: &mut NodeConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut config.coordinator.address, &self.coordinator_address);
        set(&mut config.ipfs.api_url, &self.ipfs_api_url);
        if self.ipfs_data_dir.is_some() {
            config.ipfs.data_dir.clone_from(&self.ipfs_data_dir);
        }
        if self.ipfs_binary.is_some() {
            config.ipfs.binary.clone_from(&self.ipfs_binary);
        }
        set(&mut config.node.name, &self.node_name);
        set(&mut config.node.region, &self.node_region);
        set(&mut config.node.wallet_address, &self.wallet_address);
        set(&mut config.storage.capacity_gb, &self.capacity_gb);
        set(&mut config.intervals.heartbeat, &self.heartbeat_interval);
        set(&mut config.intervals.poll, &self.poll_interval);
        if self.swarm_key_file.is_some() {
            config.network.swarm_key_file.clone_from(&self.swarm_key_file);
        }
        if !self.bootstrap_peers.is_empty() {
            config.network.bootstrap_peers.clone_from(&self.bootstrap_peers);
        }
        if self.require_isolation {
            config.network.isolation = IsolationPolicy::Required;
        }
        set(&mut config.tasks.max_concurrent_pins, &self.max_concurrent_pins);
        if self.metrics {
            config.metrics.enabled = true;
        }
        set(&mut config.metrics.addr, &self.metrics_addr);
    }
}
