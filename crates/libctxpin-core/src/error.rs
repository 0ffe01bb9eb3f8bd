use thiserror::Error;

/// Main error type for ctxpin operations
#[derive(Debug, Error)]
pub enum CtxpinError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database busy: {0}")]
    DbBusy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CtxpinError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            CtxpinError::InvalidArgs(_) => "invalid_args",
            CtxpinError::NotFound(_) => "not_found",
            CtxpinError::DbBusy(_) => "db_busy",
            CtxpinError::Io(_) => "io_error",
            CtxpinError::Sled(_) => "db_error",
            CtxpinError::Json(_) => "internal_error",
            CtxpinError::TomlParse(_) => "invalid_args",
            CtxpinError::TomlSerialize(_) => "internal_error",
            CtxpinError::Clipboard(_) => "clipboard_error",
            CtxpinError::Internal(_) => "internal_error",
        }
    }

    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            CtxpinError::InvalidArgs(_) => 2,
            CtxpinError::NotFound(_) => 3,
            CtxpinError::DbBusy(_) => 5,
            CtxpinError::Io(_) => 5,
            CtxpinError::Sled(_) => 5,
            CtxpinError::TomlParse(_) => 2,
            CtxpinError::Clipboard(_) => 6,
            _ => 1,
        }
    }

    /// Get actionable suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            CtxpinError::NotFound(msg) => {
                if msg.contains("group") {
                    vec!["Run 'ctxpin group list' to see available groups"]
                } else if msg.contains("config") || msg.contains("data dir") {
                    vec!["Run 'ctxpin init' in the project root"]
                } else {
                    vec![]
                }
            }
            CtxpinError::DbBusy(_) => vec![
                "Another ctxpin process is using this project's store",
                "Wait for it to finish and retry",
            ],
            CtxpinError::Sled(_) => vec![
                "Remove the store directory under the data dir and re-run 'ctxpin init'",
                "If problem persists, check disk space and permissions",
            ],
            CtxpinError::TomlParse(_) => vec!["Check config.toml in the data dir for syntax errors"],
            CtxpinError::Clipboard(_) => vec![
                "Set [clipboard] command in config.toml to a working clipboard program",
                "Or use 'ctxpin copy --stdout' and pipe the output",
            ],
            _ => vec![],
        }
    }

    /// Create a NotFound error for a context group
    pub fn group_not_found(name: &str) -> Self {
        CtxpinError::NotFound(format!("context group '{}' not found", name))
    }

    /// Create a DbBusy error with lock details
    pub fn database_locked(details: Option<&str>) -> Self {
        let msg = match details {
            Some(d) => format!("Database is locked ({})", d),
            None => "Database is locked by another process".to_string(),
        };
        CtxpinError::DbBusy(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_exit_codes() {
        let err = CtxpinError::group_not_found("backend");
        assert_eq!(err.error_code(), "not_found");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.suggestions().len(), 1);

        let err = CtxpinError::database_locked(None);
        assert_eq!(err.error_code(), "db_busy");
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_clipboard_error_has_suggestions() {
        let err = CtxpinError::Clipboard("xclip exited with status 1".to_string());
        assert_eq!(err.error_code(), "clipboard_error");
        assert!(!err.suggestions().is_empty());
    }
}
