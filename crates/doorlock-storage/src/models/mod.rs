pub mod credential;
pub mod usage_entry;

pub use credential::CredentialRecord;
pub use usage_entry::UsageEntry;
