//! Daemon lifecycle states and the transitions between them.

use strum::{Display, IntoStaticStr};
use tokio::sync::watch;

use crate::{DaemonError, DaemonResult};

/// Where the managed daemon is in its lifecycle.
///
/// ```text
/// Uninstalled -> RepoUninitialized -> RepoReady -> Configured -> Starting -> Ready
///                                                                 |           |
///                                                                 +--> Stopping -> Stopped -> Starting
///
/// any state (except Failed) -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DaemonState {
    /// No binary resolved yet.
    Uninstalled,
    /// Binary found, repository not yet checked.
    RepoUninitialized,
    /// Repository exists at the configured data directory.
    RepoReady,
    /// Private network settings applied.
    Configured,
    /// Process launched, control API not yet responsive.
    Starting,
    /// Control API answered a version probe.
    Ready,
    /// Interrupt sent, waiting for exit.
    Stopping,
    /// Process exited or was killed.
    Stopped,
    /// Unrecoverable setup error. Terminal.
    Failed,
}

impl DaemonState {
    /// Position in the setup progression. `Failed` has no position.
    fn rank(self) -> Option<u8> {
        match self {
            Self::Uninstalled => Some(0),
            Self::RepoUninitialized => Some(1),
            Self::RepoReady => Some(2),
            Self::Configured => Some(3),
            Self::Starting => Some(4),
            Self::Ready => Some(5),
            Self::Stopping => Some(6),
            Self::Stopped => Some(7),
            Self::Failed => None,
        }
    }

    /// Whether `self -> next` is a legal single step.
    pub fn can_transition_to(self, next: DaemonState) -> bool {
        use DaemonState::*;
        match (self, next) {
            (Failed, _) => false,
            (_, Failed) => true,
            (Uninstalled, RepoUninitialized)
            | (RepoUninitialized, RepoReady)
            | (RepoReady, Configured)
            | (Configured, Starting)
            | (Starting, Ready)
            | (Starting | Ready, Stopping)
            | (Stopping, Stopped)
            | (Stopped, Starting) => true,
            _ => false,
        }
    }

    /// Whether the lifecycle has already progressed to (or past) `target`.
    pub fn has_reached(self, target: DaemonState) -> bool {
        match (self.rank(), target.rank()) {
            (Some(current), Some(target)) => current >= target,
            _ => self == target,
        }
    }

    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }

    /// Whether a launched process may be running.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Starting | Self::Ready)
    }
}

/// Shared, concurrently visible lifecycle state.
///
/// The readiness watcher writes from a background task while foreground callers
/// read or wait, so the state lives in a `watch` channel.
#[derive(Debug)]
pub(crate) struct StateCell {
    tx: watch::Sender<DaemonState>,
}

impl StateCell {
    pub(crate) fn new(initial: DaemonState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn get(&self) -> DaemonState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<DaemonState> {
        self.tx.subscribe()
    }

    /// Apply a single validated step. Re-entering the current state is a no-op.
    ///
    /// Returns whether the state changed.
    pub(crate) fn transition(&self, next: DaemonState) -> DaemonResult<bool> {
        let mut result = Ok(false);
        self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            if current.can_transition_to(next) {
                tracing::debug!(from = %current, to = %next, "daemon state transition");
                *current = next;
                result = Ok(true);
                true
            } else {
                result = Err(DaemonError::InvalidTransition {
                    from: *current,
                    to: next,
                });
                false
            }
        });
        result
    }

    /// Move forward to `target` unless the lifecycle is already there or beyond.
    pub(crate) fn advance(&self, target: DaemonState) -> DaemonResult<()> {
        if self.get().has_reached(target) {
            return Ok(());
        }
        self.transition(target).map(|_| ())
    }

    /// Record an unrecoverable error.
    pub(crate) fn fail(&self) {
        // Failed is reachable from every state but itself.
        let _ = self.transition(DaemonState::Failed);
    }
}
