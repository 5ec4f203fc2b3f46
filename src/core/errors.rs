//! VD-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DashError>;

/// Top-level error type for the validator dashboard.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("[VD-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[VD-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[VD-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[VD-2001] decode failure in {context}: {details}")]
    Decode {
        context: &'static str,
        details: String,
    },

    #[error("[VD-3001] transport failure: {details}")]
    Transport { details: String },

    #[error("[VD-3003] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[VD-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DashError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "VD-1001",
            Self::MissingConfig { .. } => "VD-1002",
            Self::ConfigParse { .. } => "VD-1003",
            Self::Decode { .. } => "VD-2001",
            Self::Transport { .. } => "VD-3001",
            Self::Io { .. } => "VD-3003",
            Self::Runtime { .. } => "VD-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Io { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Decode failure tagged with the payload it came from.
    #[must_use]
    pub fn decode(context: &'static str, details: impl Into<String>) -> Self {
        Self::Decode {
            context,
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DashError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<DashError> {
        vec![
            DashError::InvalidConfig {
                details: String::new(),
            },
            DashError::MissingConfig {
                path: PathBuf::new(),
            },
            DashError::ConfigParse {
                context: "",
                details: String::new(),
            },
            DashError::Decode {
                context: "",
                details: String::new(),
            },
            DashError::Transport {
                details: String::new(),
            },
            DashError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            DashError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_variants();
        let codes: Vec<&str> = errors.iter().map(DashError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_vd_prefix() {
        for err in &all_variants() {
            assert!(
                err.code().starts_with("VD-"),
                "code {} must start with VD-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = DashError::decode("live message", "expected value at line 1");
        let msg = err.to_string();
        assert!(msg.contains("VD-2001"), "display should contain code: {msg}");
        assert!(msg.contains("live message"), "display should contain context: {msg}");
    }

    #[test]
    fn transport_errors_are_retryable_decode_errors_are_not() {
        assert!(
            DashError::Transport {
                details: "reset".to_string()
            }
            .is_retryable()
        );
        assert!(!DashError::decode("x", "y").is_retryable());
        assert!(
            !DashError::InvalidConfig {
                details: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = DashError::io(
            "/tmp/vdash.jsonl",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "VD-3003");
        assert!(err.to_string().contains("/tmp/vdash.jsonl"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: DashError = json_err.into();
        assert_eq!(err.code(), "VD-2001");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: DashError = toml_err.into();
        assert_eq!(err.code(), "VD-1003");
    }
}
