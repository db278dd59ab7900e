use std::fmt;

/// Machine-readable error codes shared by the HTTP envelope and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ProjectionNotFound,
    ValidationFailed,
    CorruptRecord,
    StorageUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::ProjectionNotFound => "E2001",
            Self::ValidationFailed => "E2002",
            Self::CorruptRecord => "E3001",
            Self::StorageUnavailable => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and response bodies.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ProjectionNotFound => "Projection not found",
            Self::ValidationFailed => "Invalid projection data",
            Self::CorruptRecord => "Stored projection could not be decoded",
            Self::StorageUnavailable => "Storage unavailable",
            Self::InternalUnexpected => "Internal server error",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in lvr.toml and restart."),
            Self::ProjectionNotFound => None,
            Self::ValidationFailed => Some("See `details` for the fields that failed."),
            Self::CorruptRecord => Some("Re-submit the projection to overwrite the stored row."),
            Self::StorageUnavailable => Some("Check the database path and disk space, then retry."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::ProjectionNotFound,
            ErrorCode::ValidationFailed,
            ErrorCode::CorruptRecord,
            ErrorCode::StorageUnavailable,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::StorageUnavailable.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }
}
