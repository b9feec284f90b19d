//! Lifecycle tests against a scripted stand-in for the `ipfs` binary.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use cairn_ipfs_api::IpfsClient;
use cairn_ipfs_daemon::{
    DaemonConfig, DaemonError, DaemonManager, DaemonState, IsolationPolicy, ReadinessConfig,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SWARM_KEY: &str = "/key/swarm/psk/1.0.0/\n/base16/\n\
    00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff\n";

/// Exits on SIGINT.
const POLITE: &str = "trap 'exit 0' INT";
/// Ignores SIGINT, only SIGKILL stops it.
const STUBBORN: &str = "trap '' INT";

fn fake_ipfs(dir: &Path, on_daemon: &str) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
case "$1" in
  init)
    mkdir -p "$IPFS_PATH"
    echo init >> "$IPFS_PATH/../calls.log"
    printf '{{"Identity":{{"PeerID":"12D3KooWFake"}},"Bootstrap":["/dnsaddr/bootstrap.libp2p.io"]}}' > "$IPFS_PATH/config"
    ;;
  daemon)
    {on_daemon}
    : > "$IPFS_PATH/../daemon.armed"
    while true; do sleep 0.1; done
    ;;
  swarm)
    case "$3" in
      *unreachable*) echo "failure: dial backoff" >&2; exit 1 ;;
      *) echo "connect $3 success" ;;
    esac
    ;;
esac
"#
    );
    let path = dir.join("ipfs");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

async fn ready_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/version"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Version": "0.29.0" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ID": "12D3KooWFake",
            "Addresses": ["/ip4/10.0.0.1/tcp/4001/p2p/12D3KooWFake"],
        })))
        .mount(&server)
        .await;
    server
}

struct Harness {
    dir: TempDir,
    manager: DaemonManager,
}

impl Harness {
    fn new(api_url: &str, on_daemon: &str, tweak: impl FnOnce(DaemonConfig) -> DaemonConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_ipfs(dir.path(), on_daemon);
        let config = DaemonConfig::new(dir.path().join("data"))
            .with_binary(binary)
            .with_readiness(ReadinessConfig {
                interval: Duration::from_millis(20),
                timeout: Duration::from_secs(5),
            });
        let api = Arc::new(IpfsClient::new(api_url).unwrap());
        Self {
            manager: DaemonManager::new(tweak(config), api),
            dir,
        }
    }

    fn init_calls(&self) -> usize {
        std::fs::read_to_string(self.dir.path().join("data").join("calls.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }

    /// Wait until the fake daemon has installed its signal disposition.
    async fn wait_until_armed(&self) {
        let marker = self.dir.path().join("data").join("daemon.armed");
        let deadline = Instant::now() + Duration::from_secs(5);
        while !marker.exists() {
            assert!(Instant::now() < deadline, "fake daemon never started");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn setup(&self, cancel: &CancellationToken) {
        self.manager.ensure_installed().await.unwrap();
        self.manager.initialize_repo(cancel).await.unwrap();
        self.manager.configure_private_network(Some(SWARM_KEY), &[]).await.unwrap();
    }
}

#[tokio::test]
async fn operations_require_a_resolved_binary() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| c);
    let cancel = CancellationToken::new();

    assert_matches!(
        harness.manager.initialize_repo(&cancel).await,
        Err(DaemonError::NotInstalled)
    );
    assert_eq!(harness.manager.state(), DaemonState::Uninstalled);
}

#[tokio::test]
async fn initialize_runs_init_once() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| c);
    let cancel = CancellationToken::new();

    harness.manager.ensure_installed().await.unwrap();
    assert_eq!(harness.manager.state(), DaemonState::RepoUninitialized);

    harness.manager.initialize_repo(&cancel).await.unwrap();
    assert!(harness.manager.config().repo_config().exists());
    assert_eq!(harness.manager.state(), DaemonState::RepoReady);

    harness.manager.initialize_repo(&cancel).await.unwrap();
    assert_eq!(harness.init_calls(), 1);
}

#[tokio::test]
async fn existing_repo_is_left_untouched() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| c);
    let repo = harness.manager.config().repo_path();
    std::fs::create_dir_all(&repo).unwrap();
    std::fs::write(repo.join("config"), r#"{"Bootstrap":[]}"#).unwrap();

    harness.manager.ensure_installed().await.unwrap();
    harness
        .manager
        .initialize_repo(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(harness.init_calls(), 0);
    assert_eq!(
        std::fs::read_to_string(repo.join("config")).unwrap(),
        r#"{"Bootstrap":[]}"#
    );
}

#[tokio::test]
async fn private_network_settings_are_applied() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| c);
    let cancel = CancellationToken::new();
    harness.manager.ensure_installed().await.unwrap();
    harness.manager.initialize_repo(&cancel).await.unwrap();

    let peers = vec!["/ip4/10.0.0.2/tcp/4001/p2p/12D3KooWPeer".to_string()];
    harness
        .manager
        .configure_private_network(Some(SWARM_KEY), &peers)
        .await
        .unwrap();

    let key = std::fs::read_to_string(harness.manager.config().swarm_key_path()).unwrap();
    assert!(key.starts_with("/key/swarm/psk/1.0.0/\n/base16/\n"));

    let config: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(harness.manager.config().repo_config()).unwrap(),
    )
    .unwrap();
    assert_eq!(config["Bootstrap"], serde_json::json!(peers));
    assert_eq!(harness.manager.state(), DaemonState::Configured);
}

#[tokio::test]
async fn missing_key_fails_when_isolation_is_required() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| {
        c.with_isolation(IsolationPolicy::Required)
    });
    let cancel = CancellationToken::new();
    harness.manager.ensure_installed().await.unwrap();
    harness.manager.initialize_repo(&cancel).await.unwrap();

    assert_matches!(
        harness.manager.configure_private_network(None, &[]).await,
        Err(DaemonError::IsolationRequired)
    );
    assert_eq!(harness.manager.state(), DaemonState::Failed);
    assert_matches!(
        harness.manager.start_daemon(&cancel).await,
        Err(DaemonError::Failed)
    );
}

#[tokio::test]
async fn missing_key_is_tolerated_by_default() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| c);
    let cancel = CancellationToken::new();
    harness.manager.ensure_installed().await.unwrap();
    harness.manager.initialize_repo(&cancel).await.unwrap();

    harness.manager.configure_private_network(None, &[]).await.unwrap();
    assert!(!harness.manager.config().swarm_key_path().exists());
    assert_eq!(harness.manager.state(), DaemonState::Configured);
}

#[tokio::test]
async fn start_is_idempotent_and_stop_is_graceful() {
    let api = ready_api().await;
    let harness = Harness::new(&api.uri(), POLITE, |c| c);
    let cancel = CancellationToken::new();
    harness.setup(&cancel).await;

    harness.manager.start_daemon(&cancel).await.unwrap();
    let pid = harness.manager.pid().expect("daemon pid");
    harness.manager.start_daemon(&cancel).await.unwrap();
    assert_eq!(harness.manager.pid(), Some(pid));

    harness
        .manager
        .wait_for_state(DaemonState::Ready, &cancel)
        .await
        .unwrap();

    harness.manager.stop_daemon(&cancel).await.unwrap();
    assert_eq!(harness.manager.state(), DaemonState::Stopped);
    assert_eq!(harness.manager.pid(), None);

    // Nothing left to stop.
    harness.manager.stop_daemon(&cancel).await.unwrap();
}

#[tokio::test]
async fn stopped_daemon_can_be_restarted() {
    let api = ready_api().await;
    let harness = Harness::new(&api.uri(), POLITE, |c| c);
    let cancel = CancellationToken::new();
    harness.setup(&cancel).await;

    harness.manager.start_daemon(&cancel).await.unwrap();
    harness.manager.stop_daemon(&cancel).await.unwrap();
    harness.manager.start_daemon(&cancel).await.unwrap();
    assert!(harness.manager.pid().is_some());
    harness.manager.stop_daemon(&cancel).await.unwrap();
}

#[tokio::test]
async fn stubborn_daemon_is_killed_after_stop_timeout() {
    let api = ready_api().await;
    let harness = Harness::new(&api.uri(), STUBBORN, |c| {
        c.with_stop_timeout(Duration::from_millis(300))
    });
    let cancel = CancellationToken::new();
    harness.setup(&cancel).await;
    harness.manager.start_daemon(&cancel).await.unwrap();
    harness.wait_until_armed().await;

    let started = Instant::now();
    harness.manager.stop_daemon(&cancel).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
    assert_eq!(harness.manager.state(), DaemonState::Stopped);
    assert!(harness.manager.pid().is_none());
}

#[tokio::test]
async fn cancelled_stop_kills_without_waiting_for_timeout() {
    let api = ready_api().await;
    let harness = Harness::new(&api.uri(), STUBBORN, |c| {
        c.with_stop_timeout(Duration::from_secs(10))
    });
    let cancel = CancellationToken::new();
    harness.setup(&cancel).await;
    harness.manager.start_daemon(&cancel).await.unwrap();
    harness.wait_until_armed().await;

    let stop = CancellationToken::new();
    let trigger = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    harness.manager.stop_daemon(&stop).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(100), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");
    assert_eq!(harness.manager.state(), DaemonState::Stopped);
    assert!(harness.manager.pid().is_none());
}

#[tokio::test]
async fn peer_info_waits_for_readiness() {
    let api = ready_api().await;
    let harness = Harness::new(&api.uri(), POLITE, |c| c);
    let cancel = CancellationToken::new();
    harness.setup(&cancel).await;
    harness.manager.start_daemon(&cancel).await.unwrap();

    let info = harness.manager.peer_info(&cancel).await.unwrap();
    assert_eq!(info.id, "12D3KooWFake");
    assert_eq!(info.addresses.len(), 1);
    assert_eq!(harness.manager.state(), DaemonState::Ready);

    harness.manager.stop_daemon(&cancel).await.unwrap();
}

#[tokio::test]
async fn unresponsive_api_times_out_readiness() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| {
        c.with_readiness(ReadinessConfig {
            interval: Duration::from_millis(20),
            timeout: Duration::from_millis(200),
        })
    });
    let cancel = CancellationToken::new();
    harness.setup(&cancel).await;
    harness.manager.start_daemon(&cancel).await.unwrap();

    assert_matches!(
        harness.manager.peer_info(&cancel).await,
        Err(DaemonError::NotReady { .. })
    );
    assert_eq!(harness.manager.state(), DaemonState::Starting);

    harness.manager.stop_daemon(&cancel).await.unwrap();
}

#[tokio::test]
async fn connect_failure_carries_stderr() {
    let harness = Harness::new("http://127.0.0.1:9", POLITE, |c| c);
    let cancel = CancellationToken::new();
    harness.manager.ensure_installed().await.unwrap();

    harness
        .manager
        .connect_to_peer("/ip4/10.0.0.3/tcp/4001/p2p/12D3KooWPeer", &cancel)
        .await
        .unwrap();

    let err = harness
        .manager
        .connect_to_peer("/dns4/unreachable/tcp/4001/p2p/12D3KooWPeer", &cancel)
        .await
        .unwrap_err();
    assert_matches!(err, DaemonError::Command { ref stderr, .. } if stderr.contains("dial backoff"));
}
