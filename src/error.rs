//! Error types and handling for the `DataRun` application

use std::fmt;

use thiserror::Error;

/// Upstream collaborator that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Weather,
    Elevation,
    Routing,
    Geocoding,
    ParkSource,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Weather => "weather",
            Provider::Elevation => "elevation",
            Provider::Routing => "routing",
            Provider::Geocoding => "geocoding",
            Provider::ParkSource => "park source",
        };
        f.write_str(name)
    }
}

/// Main error type for the `DataRun` application
#[derive(Error, Debug)]
pub enum DataRunError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream call failed at the transport or HTTP-status level
    #[error("{provider} provider unavailable: {message}")]
    ProviderUnavailable { provider: Provider, message: String },

    /// Upstream payload did not have the expected shape
    #[error("Malformed {provider} data: {message}")]
    DataShape { provider: Provider, message: String },

    /// The park catalog could not be read
    #[error("Park catalog unavailable: {message}")]
    Catalog { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Delimited-text export errors
    #[error("Export error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

impl DataRunError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider transport error
    pub fn provider_unavailable<S: Into<String>>(provider: Provider, message: S) -> Self {
        Self::ProviderUnavailable {
            provider,
            message: message.into(),
        }
    }

    /// Create a new malformed payload error
    pub fn data_shape<S: Into<String>>(provider: Provider, message: S) -> Self {
        Self::DataShape {
            provider,
            message: message.into(),
        }
    }

    /// Create a new catalog error
    pub fn catalog<S: Into<String>>(message: S) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DataRunError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            DataRunError::ProviderUnavailable { provider, .. } => format!(
                "Unable to reach the {provider} service. Please check your internet connection."
            ),
            DataRunError::DataShape { provider, .. } => {
                format!("The {provider} service returned unexpected data. Please try again later.")
            }
            DataRunError::Catalog { .. } => {
                "The park catalog is not available. Run `datarun load-parks` first.".to_string()
            }
            DataRunError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            DataRunError::Io { .. } | DataRunError::Csv { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
