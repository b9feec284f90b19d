use strum::{Display, IntoStaticStr};

/// Top-level progress of the agent.
///
/// ```text
/// Init -> SettingUpDaemon -> AcquiringIdentity -> Connecting -> Registering
///      -> Registered -> Running -> ShuttingDown -> Stopped
///
/// any state before Running -> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AgentState {
    Init,
    SettingUpDaemon,
    AcquiringIdentity,
    Connecting,
    Registering,
    Registered,
    Running,
    ShuttingDown,
    Stopped,
    /// Setup failed. Terminal.
    Aborted,
}

impl AgentState {
    /// Whether the agent has finished, cleanly or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Aborted)
    }

    /// Whether setup is still in progress.
    pub fn is_setup(self) -> bool {
        matches!(
            self,
            Self::Init
                | Self::SettingUpDaemon
                | Self::AcquiringIdentity
                | Self::Connecting
                | Self::Registering
                | Self::Registered
        )
    }
}
