use doorlock_storage::StorageError;
use doorlock_transport::TransportError;
use thiserror::Error;

/// Errors surfaced by the resolution engine and the main loop.
///
/// Store failures abort one presentation; the main loop logs them and moves
/// on. Only a lost transport ends the loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store read failed during {operation}: {source}")]
    StoreRead {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("store write failed during {operation}: {source}")]
    StoreWrite {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[from] TransportError),
}

impl EngineError {
    pub(crate) fn read(operation: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| EngineError::StoreRead { operation, source }
    }

    pub(crate) fn write(operation: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| EngineError::StoreWrite { operation, source }
    }

    /// Whether the main loop must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::TransportUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_errors_are_fatal() {
        let store = EngineError::write("enroll")(StorageError::Validation("x".into()));
        assert!(!store.is_fatal());
        assert_eq!(
            store.to_string(),
            "store write failed during enroll: Validation error: x"
        );

        let transport: EngineError = TransportError::disconnected("/dev/ttyACM0").into();
        assert!(transport.is_fatal());
    }
}
