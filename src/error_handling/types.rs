use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    SitesMissing(String),
    SitesEmpty(String),
    InvalidSite(String),
    NotInRange(String),
    MissingField(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::SitesMissing(e) => write!(f, "Site list not found: {}", e),
            ConfigError::SitesEmpty(e) => write!(f, "Site list is empty: {}", e),
            ConfigError::InvalidSite(e) => write!(f, "Invalid site entry: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
            ConfigError::MissingField(e) => write!(f, "Missing configuration field: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum StorageError {
    IoError(std::io::Error),
    Corrupt(String),
    WriteFailed(String),
    ReadFailed(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::IoError(e) => write!(f, "Storage IO error: {}", e),
            StorageError::Corrupt(e) => write!(f, "Stored record is corrupt: {}", e),
            StorageError::WriteFailed(e) => write!(f, "Storage write failed: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Storage read failed: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

#[derive(Debug)]
pub enum RenderError {
    SessionFailed(String),
    NavigationTimeout(String),
    NavigationFailed(String),
    Driver { error: String, message: String },
    Transport(String),
    InvalidResponse(String),
    ProcessError(String),
    Timeout(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SessionFailed(e) => write!(f, "Render session failed: {}", e),
            RenderError::NavigationTimeout(e) => write!(f, "Navigation timed out: {}", e),
            RenderError::NavigationFailed(e) => write!(f, "Navigation failed: {}", e),
            RenderError::Driver { error, message } => {
                write!(f, "WebDriver error '{}': {}", error, message)
            }
            RenderError::Transport(e) => write!(f, "WebDriver transport error: {}", e),
            RenderError::InvalidResponse(e) => write!(f, "Unexpected WebDriver response: {}", e),
            RenderError::ProcessError(e) => write!(f, "Driver process error: {}", e),
            RenderError::Timeout(e) => write!(f, "Render operation timed out: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<reqwest::Error> for RenderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RenderError::Timeout(err.to_string())
        } else {
            RenderError::Transport(err.to_string())
        }
    }
}

/// Stage of the capture pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    OpenSession,
    Navigate,
    Screenshot,
    Write,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaptureStage::OpenSession => "open-session",
            CaptureStage::Navigate => "navigate",
            CaptureStage::Screenshot => "screenshot",
            CaptureStage::Write => "write",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug)]
pub enum CaptureError {
    RenderError(CaptureStage, RenderError),
    IoError(std::io::Error),
}

impl CaptureError {
    pub fn stage(&self) -> CaptureStage {
        match self {
            CaptureError::RenderError(stage, _) => *stage,
            CaptureError::IoError(_) => CaptureStage::Write,
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::RenderError(stage, e) => write!(f, "Capture failed at {}: {}", stage, e),
            CaptureError::IoError(e) => write!(f, "Capture write failed: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::IoError(err)
    }
}

#[derive(Debug)]
pub enum RemoteStoreError {
    Unauthorized(String),
    AlreadyExists(String),
    Conflict(String),
    NotFound(String),
    Network(String),
    Api { status: u16, message: String },
    InvalidResponse(String),
    /// The highest listed sequence number has no successor.
    SequenceExhausted(u64),
}

impl RemoteStoreError {
    /// True for failures caused by a stale version token.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteStoreError::Conflict(_))
    }
}

impl fmt::Display for RemoteStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteStoreError::Unauthorized(e) => write!(f, "Remote store unauthorized: {}", e),
            RemoteStoreError::AlreadyExists(e) => write!(f, "Remote entry already exists: {}", e),
            RemoteStoreError::Conflict(e) => write!(f, "Remote version conflict: {}", e),
            RemoteStoreError::NotFound(e) => write!(f, "Remote entry not found: {}", e),
            RemoteStoreError::Network(e) => write!(f, "Remote store network error: {}", e),
            RemoteStoreError::Api { status, message } => {
                write!(f, "Remote store returned {}: {}", status, message)
            }
            RemoteStoreError::InvalidResponse(e) => {
                write!(f, "Unexpected remote store response: {}", e)
            }
            RemoteStoreError::SequenceExhausted(last) => {
                write!(f, "No sequence number follows {}", last)
            }
        }
    }
}

impl std::error::Error for RemoteStoreError {}

impl From<reqwest::Error> for RemoteStoreError {
    fn from(err: reqwest::Error) -> Self {
        RemoteStoreError::Network(err.to_string())
    }
}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    RenderError(RenderError),
    RemoteStoreError(RemoteStoreError),
    WebError(WebError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::RenderError(e) => write!(f, "Renderer error: {}", e),
            ControllerError::RemoteStoreError(e) => write!(f, "Remote store error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}

impl From<RenderError> for ControllerError {
    fn from(err: RenderError) -> Self {
        ControllerError::RenderError(err)
    }
}

impl From<RemoteStoreError> for ControllerError {
    fn from(err: RemoteStoreError) -> Self {
        ControllerError::RemoteStoreError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}
