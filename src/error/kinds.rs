use std::{fmt, io};

/// Crate-wide `Result` type using [`ExplorerError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Top-level error type for dataexport operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ExplorerError {
    /// Metadata or query backend errors.
    Gateway(GatewayError),

    /// Export errors.
    Export(ExportError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// JSON payload errors.
    Json(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors raised by a metadata or query gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backend could not be reached or refused the call.
    Unavailable(String),

    /// The backend accepted the call but rejected its arguments.
    Rejected(String),

    /// The requested object does not exist.
    UnknownObject(String),

    /// The requested field does not exist on the object.
    UnknownField { object: String, field: String },

    /// The request was cancelled because its session was reset.
    Cancelled,
}

/// Export-specific errors.
#[derive(Debug)]
pub enum ExportError {
    /// Export was requested with no rows selected.
    EmptySelection,

    /// Export was requested with no columns to render.
    NoColumns,

    /// The export document could not be written.
    Write(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Generic configuration error.
    Generic(String),
}

impl ExplorerError {
    /// Whether this error came from a gateway call.
    pub fn is_gateway(&self) -> bool {
        matches!(self, ExplorerError::Gateway(_))
    }

    /// Whether this error is the empty-selection export failure.
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, ExplorerError::Export(ExportError::EmptySelection))
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerError::Gateway(e) => write!(f, "Gateway error: {e}"),
            ExplorerError::Export(e) => write!(f, "Export error: {e}"),
            ExplorerError::Config(e) => write!(f, "Configuration error: {e}"),
            ExplorerError::Io(e) => write!(f, "I/O error: {e}"),
            ExplorerError::Json(e) => write!(f, "JSON error: {e}"),
            ExplorerError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unavailable(msg) => write!(f, "Backend unavailable: {msg}"),
            GatewayError::Rejected(msg) => write!(f, "Request rejected: {msg}"),
            GatewayError::UnknownObject(name) => write!(f, "Unknown object: {name}"),
            GatewayError::UnknownField { object, field } => {
                write!(f, "Unknown field '{field}' on object '{object}'")
            }
            GatewayError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptySelection => write!(f, "No rows selected"),
            ExportError::NoColumns => write!(f, "No columns to export"),
            ExportError::Write(msg) => write!(f, "Failed to write export: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ExplorerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExplorerError::Io(e) => Some(e),
            ExplorerError::Json(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for GatewayError {}
impl std::error::Error for ExportError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to ExplorerError ========================= */

impl From<io::Error> for ExplorerError {
    fn from(err: io::Error) -> Self {
        ExplorerError::Io(err)
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Json(err)
    }
}

impl From<toml::de::Error> for ExplorerError {
    fn from(err: toml::de::Error) -> Self {
        ExplorerError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for ExplorerError {
    fn from(err: toml::ser::Error) -> Self {
        ExplorerError::Config(ConfigError::Generic(format!(
            "Failed to serialize configuration: {err}"
        )))
    }
}

impl From<GatewayError> for ExplorerError {
    fn from(err: GatewayError) -> Self {
        ExplorerError::Gateway(err)
    }
}

impl From<ExportError> for ExplorerError {
    fn from(err: ExportError) -> Self {
        ExplorerError::Export(err)
    }
}

impl From<ConfigError> for ExplorerError {
    fn from(err: ConfigError) -> Self {
        ExplorerError::Config(err)
    }
}

impl From<String> for ExplorerError {
    fn from(msg: String) -> Self {
        ExplorerError::Generic(msg)
    }
}

impl From<&str> for ExplorerError {
    fn from(msg: &str) -> Self {
        ExplorerError::Generic(msg.to_owned())
    }
}
