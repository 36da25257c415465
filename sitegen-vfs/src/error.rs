use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Ambiguous or missing match: {0}")]
    AmbiguousOrMissingMatch(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("Session not initialized: call session/open first")]
    NotInitialized,
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VfsError {
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidPath(_) => "VFS_INVALID_PATH",
            Self::NotFound(_) => "VFS_NOT_FOUND",
            Self::AlreadyExists(_) => "VFS_ALREADY_EXISTS",
            Self::AmbiguousOrMissingMatch(_) => "VFS_AMBIGUOUS_MATCH",
            Self::UnknownOperation(_) => "VFS_UNKNOWN_OPERATION",
            Self::InvalidPattern(_) => "VFS_INVALID_PATTERN",
            Self::LimitExceeded(_) => "VFS_LIMIT_EXCEEDED",
            Self::NotInitialized => "VFS_NOT_INITIALIZED",
            Self::InvalidParams(_) => "VFS_INVALID_PARAMS",
            Self::Io(_) => "VFS_IO_ERROR",
            Self::Json(_) => "VFS_JSON_ERROR",
        }
    }

    pub fn to_json_rpc_error(&self) -> serde_json::Value {
        serde_json::json!({
            "vfsCode": self.code(),
            "message": self.to_string(),
        })
    }
}
