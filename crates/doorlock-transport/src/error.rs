//! Error types for transport operations.
//!
//! Any error surfaced by a line source or a byte sink means the link is
//! unusable; the controller treats it as fatal.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur on a serial link or its stand-ins.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Link is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Serial port could not be opened or configured.
    #[error("Serial port error on {device}: {source}")]
    Serial {
        device: String,
        #[source]
        source: serialport::Error,
    },

    /// Link configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new serial port error.
    pub fn serial(device: impl Into<String>, source: serialport::Error) -> Self {
        Self::Serial {
            device: device.into(),
            source,
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = TransportError::disconnected("/dev/ttyACM0");
        assert!(matches!(error, TransportError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: /dev/ttyACM0");
    }

    #[test]
    fn test_configuration_error() {
        let error = TransportError::configuration("baud rate must be non-zero");
        assert_eq!(
            error.to_string(),
            "Configuration error: baud rate must be non-zero"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let error: TransportError = io.into();
        assert!(matches!(error, TransportError::Io(_)));
    }
}
