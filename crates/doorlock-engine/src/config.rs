use std::time::Duration;

use doorlock_core::BootstrapTable;
use doorlock_core::constants::{DEFAULT_CLEAR_BYTE, DEFAULT_CLEAR_DELAY_MS, DEFAULT_NAME_DELAY_MS};
use doorlock_protocol::RankEncoding;
use serde::{Deserialize, Serialize};

/// When an administrative mode ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeExitPolicy {
    /// A mode stays active until its card is presented again.
    #[default]
    Toggle,

    /// A mode also ends after one successful enroll or remove.
    SingleShot,
}

/// Resolution engine configuration.
///
/// # Examples
///
/// ```
/// use doorlock_engine::{EngineConfig, ModeExitPolicy};
///
/// let config = EngineConfig::new().mode_exit(ModeExitPolicy::SingleShot);
/// assert_eq!(config.mode_exit, ModeExitPolicy::SingleShot);
/// assert_eq!(config.bootstrap.len(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub mode_exit: ModeExitPolicy,

    /// Cards created by default provisioning.
    pub bootstrap: BootstrapTable,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode_exit(mut self, policy: ModeExitPolicy) -> Self {
        self.mode_exit = policy;
        self
    }

    pub fn bootstrap(mut self, table: BootstrapTable) -> Self {
        self.bootstrap = table;
        self
    }
}

/// Display reset written to every sink some time after each presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearSignal {
    pub after: Duration,
    pub byte: u8,
}

impl Default for ClearSignal {
    fn default() -> Self {
        Self {
            after: Duration::from_millis(DEFAULT_CLEAR_DELAY_MS),
            byte: DEFAULT_CLEAR_BYTE,
        }
    }
}

/// Main loop configuration: how responses go out on the wire.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Prepend the 4-byte big-endian card id to every response.
    pub echo_card_id: bool,

    pub rank_encoding: RankEncoding,

    /// Pause between the rank frame and the name frame.
    pub name_delay: Duration,

    /// Run default provisioning right after a wipe.
    pub reprovision_after_wipe: bool,

    pub clear_signal: Option<ClearSignal>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            echo_card_id: false,
            rank_encoding: RankEncoding::Binary,
            name_delay: Duration::from_millis(DEFAULT_NAME_DELAY_MS),
            reprovision_after_wipe: true,
            clear_signal: None,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echo_card_id(mut self, echo: bool) -> Self {
        self.echo_card_id = echo;
        self
    }

    pub fn rank_encoding(mut self, encoding: RankEncoding) -> Self {
        self.rank_encoding = encoding;
        self
    }

    pub fn name_delay(mut self, delay: Duration) -> Self {
        self.name_delay = delay;
        self
    }

    pub fn reprovision_after_wipe(mut self, enabled: bool) -> Self {
        self.reprovision_after_wipe = enabled;
        self
    }

    pub fn clear_signal(mut self, signal: Option<ClearSignal>) -> Self {
        self.clear_signal = signal;
        self
    }
}
