pub mod credential;
pub mod usage_log;

pub use credential::{CredentialRepository, SqliteCredentialRepository};
pub use usage_log::{SqliteUsageLogRepository, UsageLogRepository};
