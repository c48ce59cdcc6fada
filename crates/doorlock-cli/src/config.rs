//! Deployment configuration.
//!
//! Loaded from a TOML file. Every key is optional; an empty file describes
//! the single-port deployment: prefixed lines in on `/dev/ttyACM0` at
//! 115200 baud, binary rank back out on the same port.

use std::path::{Path, PathBuf};
use std::time::Duration;

use doorlock_core::constants::{
    DEFAULT_CARD_PREFIX, DEFAULT_CLEAR_BYTE, DEFAULT_CLEAR_DELAY_MS, DEFAULT_NAME_DELAY_MS,
    DEFAULT_READER_BAUD_RATE, DEFAULT_STORE_PATH, MIN_PAYLOAD_LENGTH,
};
use doorlock_core::{BootstrapCard, BootstrapTable};
use doorlock_engine::{ClearSignal, EngineConfig, ModeExitPolicy, RunnerConfig};
use doorlock_protocol::{InboundFormat, RankEncoding};
use doorlock_storage::DatabaseConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Device name that maps to stdin (inbound) or stdout (outbound).
pub const STDIO_DEVICE: &str = "-";

const fn default_true() -> bool {
    true
}

fn default_store_location() -> String {
    DEFAULT_STORE_PATH.to_string()
}

fn default_device() -> String {
    "/dev/ttyACM0".to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_READER_BAUD_RATE
}

fn default_prefix() -> String {
    DEFAULT_CARD_PREFIX.to_string()
}

fn default_min_length() -> usize {
    MIN_PAYLOAD_LENGTH
}

fn default_name_delay_ms() -> u64 {
    DEFAULT_NAME_DELAY_MS
}

fn default_clear_after_ms() -> u64 {
    DEFAULT_CLEAR_DELAY_MS
}

fn default_clear_byte() -> String {
    char::from(DEFAULT_CLEAR_BYTE).to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<doorlock_core::Error> for ConfigError {
    fn from(e: doorlock_core::Error) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    #[serde(default = "default_store_location")]
    pub store_location: String,

    #[serde(default)]
    pub echo_card_id: bool,

    #[serde(default)]
    pub rank_encoding: RankEncoding,

    #[serde(default)]
    pub mode_exit: ModeExitPolicy,

    #[serde(default = "default_name_delay_ms")]
    pub name_delay_ms: u64,

    #[serde(default = "default_true")]
    pub reprovision_after_wipe: bool,

    #[serde(default)]
    pub inbound: InboundConfig,

    /// Absent means "answer on the inbound device".
    #[serde(default)]
    pub outbound: Option<Vec<OutboundConfig>>,

    #[serde(default)]
    pub clear_signal: Option<ClearSignalConfig>,

    /// Absent means the built-in table.
    #[serde(default)]
    pub bootstrap: Option<Vec<BootstrapCard>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InboundConfig {
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Text before the id. Empty for readers that send the bare id.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Minimum payload length, terminator stripped.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

impl Default for InboundConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud_rate: default_baud_rate(),
            prefix: default_prefix(),
            min_length: default_min_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutboundConfig {
    pub device: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default)]
    pub send_name: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClearSignalConfig {
    #[serde(default = "default_clear_after_ms")]
    pub after_ms: u64,

    /// A single ASCII character.
    #[serde(default = "default_clear_byte")]
    pub byte: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            store_location: default_store_location(),
            echo_card_id: false,
            rank_encoding: RankEncoding::default(),
            mode_exit: ModeExitPolicy::default(),
            name_delay_ms: default_name_delay_ms(),
            reprovision_after_wipe: true,
            inbound: InboundConfig::default(),
            outbound: None,
            clear_signal: None,
            bootstrap: None,
        }
    }
}

impl DeploymentConfig {
    /// Load and validate `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inbound.baud_rate == 0 {
            return Err(ConfigError::Invalid("inbound baud_rate must be non-zero".into()));
        }

        let outbound = self.outbound_links();
        if outbound.is_empty() {
            return Err(ConfigError::Invalid("at least one outbound link is required".into()));
        }
        if let Some(link) = outbound.iter().find(|link| link.baud_rate == 0) {
            return Err(ConfigError::Invalid(format!(
                "outbound {} baud_rate must be non-zero",
                link.device
            )));
        }

        if let Some(clear) = &self.clear_signal {
            clear_byte(&clear.byte)?;
        }

        self.bootstrap_table()?;
        Ok(())
    }

    /// Outbound links, defaulting to the inbound device.
    pub fn outbound_links(&self) -> Vec<OutboundConfig> {
        match &self.outbound {
            Some(links) => links.clone(),
            None => vec![OutboundConfig {
                device: self.inbound.device.clone(),
                baud_rate: self.inbound.baud_rate,
                send_name: false,
            }],
        }
    }

    pub fn inbound_format(&self) -> InboundFormat {
        let format = if self.inbound.prefix.is_empty() {
            InboundFormat::bare()
        } else {
            InboundFormat::prefixed(self.inbound.prefix.clone())
        };
        format.min_length(self.inbound.min_length)
    }

    pub fn bootstrap_table(&self) -> Result<BootstrapTable, ConfigError> {
        match &self.bootstrap {
            Some(cards) => Ok(BootstrapTable::new(cards.clone())?),
            None => Ok(BootstrapTable::default()),
        }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.store_location.clone())
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        Ok(EngineConfig::new()
            .mode_exit(self.mode_exit)
            .bootstrap(self.bootstrap_table()?))
    }

    pub fn runner_config(&self) -> Result<RunnerConfig, ConfigError> {
        let clear_signal = match &self.clear_signal {
            Some(clear) => Some(ClearSignal {
                after: Duration::from_millis(clear.after_ms),
                byte: clear_byte(&clear.byte)?,
            }),
            None => None,
        };

        Ok(RunnerConfig::new()
            .echo_card_id(self.echo_card_id)
            .rank_encoding(self.rank_encoding)
            .name_delay(Duration::from_millis(self.name_delay_ms))
            .reprovision_after_wipe(self.reprovision_after_wipe)
            .clear_signal(clear_signal))
    }
}

fn clear_byte(value: &str) -> Result<u8, ConfigError> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::Invalid(format!(
            "clear_signal.byte must be one ASCII character, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_core::{CardId, Rank};
    use rstest::rstest;
    use std::io::Write;

    fn parse(toml: &str) -> Result<DeploymentConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();
        DeploymentConfig::load(Some(file.path()))
    }

    #[test]
    fn test_empty_file_is_single_port_default() {
        let config = parse("").unwrap();

        assert_eq!(config, DeploymentConfig::default());
        assert_eq!(config.store_location, "/srv/doorlock.db");
        assert_eq!(config.inbound_format(), InboundFormat::default());

        let outbound = config.outbound_links();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].device, "/dev/ttyACM0");
        assert!(!outbound[0].send_name);
    }

    #[test]
    fn test_display_deployment() {
        let config = parse(
            r#"
            store_location = "/var/lib/doorlock/cards.db"
            rank_encoding = "ascii"
            mode_exit = "single_shot"

            [inbound]
            device = "/dev/ttyACM0"
            prefix = ""
            min_length = 9

            [[outbound]]
            device = "/dev/ttyACM0"
            send_name = true

            [[outbound]]
            device = "/dev/ttyUSB0"
            baud_rate = 9600

            [clear_signal]
            after_ms = 5000
            byte = "c"
            "#,
        )
        .unwrap();

        assert_eq!(config.inbound_format(), InboundFormat::bare().min_length(9));
        assert_eq!(config.outbound_links().len(), 2);
        assert_eq!(config.outbound_links()[1].baud_rate, 9600);
        assert_eq!(config.engine_config().unwrap().mode_exit, ModeExitPolicy::SingleShot);

        let runner = config.runner_config().unwrap();
        assert_eq!(runner.rank_encoding, RankEncoding::Ascii);
        assert_eq!(
            runner.clear_signal,
            Some(ClearSignal {
                after: Duration::from_secs(5),
                byte: b'c'
            })
        );
    }

    #[test]
    fn test_custom_bootstrap() {
        let config = parse(
            r#"
            [[bootstrap]]
            id = 100
            rank = "programming"
            name = "Front desk programmer"
            "#,
        )
        .unwrap();

        let table = config.bootstrap_table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.card_for(Rank::Programming).map(|card| card.id),
            Some(CardId::new(100))
        );
    }

    #[rstest]
    #[case::duplicate_bootstrap(concat!(
        "[[bootstrap]]\nid = 1\nrank = \"wipe\"\n",
        "[[bootstrap]]\nid = 1\nrank = \"master\"\n",
    ))]
    #[case::unknown_bootstrap_rank("[[bootstrap]]\nid = 1\nrank = \"unknown\"\n")]
    #[case::empty_outbound("outbound = []\n")]
    #[case::zero_inbound_baud("[inbound]\nbaud_rate = 0\n")]
    #[case::zero_outbound_baud("[[outbound]]\ndevice = \"/dev/ttyUSB0\"\nbaud_rate = 0\n")]
    #[case::long_clear_byte("[clear_signal]\nbyte = \"clear\"\n")]
    #[case::non_ascii_clear_byte("[clear_signal]\nbyte = \"é\"\n")]
    fn test_invalid_deployment_rejected(#[case] toml: &str) {
        assert!(matches!(parse(toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        assert!(matches!(parse("echo_card = true"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = DeploymentConfig::load(Some(Path::new("/nonexistent/doorlock.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
