//! Error types for target descriptor operations.

use std::fmt;

/// Which half of the error taxonomy a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed syntax or missing/unresolvable data.
    Value,
    /// A value disagrees with the kind schema.
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Value => write!(f, "ValueError"),
            ErrorKind::Type => write!(f, "TypeError"),
        }
    }
}

/// Errors that can occur while building or loading target descriptors.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Malformed input: empty key or value, unbalanced quotes, duplicate key,
    /// missing required field, unknown device.
    #[error("ValueError: {message}")]
    Value {
        /// Message including any breadcrumb trail.
        message: String,
    },

    /// Schema mismatch: unknown attribute key, wrong dynamic type,
    /// unsupported conversion, unregistered kind.
    #[error("TypeError: {message}")]
    Type {
        /// Message including any breadcrumb trail.
        message: String,
    },

    /// A kind definition is internally inconsistent.
    #[error("invalid target kind '{kind}': {detail}")]
    InvalidKind {
        /// Name of the offending kind.
        kind: String,
        /// Description of the problem.
        detail: String,
    },

    /// TOML deserialization error while loading tag files.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON deserialization error while loading a config string.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading tag files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TargetError {
    /// Build a [`TargetError::Value`].
    pub fn value(message: impl Into<String>) -> Self {
        TargetError::Value {
            message: message.into(),
        }
    }

    /// Build a [`TargetError::Type`].
    pub fn type_error(message: impl Into<String>) -> Self {
        TargetError::Type {
            message: message.into(),
        }
    }

    /// The taxonomy bucket, if this error belongs to it.
    ///
    /// Loader failures (`Io`, `Toml`, `Json`) report [`ErrorKind::Value`]
    /// since they stem from malformed input.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TargetError::Type { .. } | TargetError::InvalidKind { .. } => ErrorKind::Type,
            _ => ErrorKind::Value,
        }
    }

    /// The bare message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            TargetError::Value { message } | TargetError::Type { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Re-raise with `suffix` appended to the message, keeping the kind.
    pub fn with_suffix(self, suffix: impl AsRef<str>) -> Self {
        let message = format!("{}{}", self.message(), suffix.as_ref());
        self.rebuild(message)
    }

    /// Re-raise with `prefix` prepended to the message, keeping the kind.
    pub fn with_prefix(self, prefix: impl AsRef<str>) -> Self {
        let message = format!("{}{}", prefix.as_ref(), self.message());
        self.rebuild(message)
    }

    fn rebuild(self, message: String) -> Self {
        match self.kind() {
            ErrorKind::Value => TargetError::Value { message },
            ErrorKind::Type => TargetError::Type { message },
        }
    }
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_keeps_kind() {
        let err = TargetError::type_error("bad").with_suffix("[2]");
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.message(), "bad[2]");
        assert_eq!(err.to_string(), "TypeError: bad[2]");
    }

    #[test]
    fn breadcrumbs_accumulate() {
        let err = TargetError::value("oops")
            .with_suffix(", during parsing target[0]")
            .with_suffix(", during parsing target[\"host\"]");
        assert_eq!(
            err.message(),
            "oops, during parsing target[0], during parsing target[\"host\"]"
        );
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn prefix_keeps_kind() {
        let err = TargetError::type_error("mismatch").with_prefix("[1]");
        assert_eq!(err.message(), "[1]mismatch");
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn io_errors_are_value_errors() {
        let err: TargetError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert!(err.with_suffix("!").message().contains("gone"));
    }
}
