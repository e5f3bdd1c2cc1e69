#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong shape, e.g. a scalar where a list is required
    MalformedValue,
    /// An identifier or source that does not exist
    UnresolvedReference,
    /// Date in the future, or an inverted range
    OutOfRange,
    /// `reopen_count` prefix other than `<` or `>`
    UnsupportedOperator,
    /// Record store timed out, was cancelled or failed
    DependencyUnavailable,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MalformedValue => write!(f, "MalformedValue"),
            ErrorKind::UnresolvedReference => write!(f, "UnresolvedReference"),
            ErrorKind::OutOfRange => write!(f, "OutOfRange"),
            ErrorKind::UnsupportedOperator => write!(f, "UnsupportedOperator"),
            ErrorKind::DependencyUnavailable => write!(f, "DependencyUnavailable"),
        }
    }
}

/// Failure to validate one criteria key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub key: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn malformed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedValue, key, message)
    }

    pub fn unresolved(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedReference, key, message)
    }

    pub fn out_of_range(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, key, message)
    }

    pub fn unsupported_operator(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedOperator, key, message)
    }

    pub fn lookup_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DependencyUnavailable, key, message)
    }

    /// HTTP-style status code for the calling controller
    pub fn code(&self) -> u16 {
        match self.kind {
            ErrorKind::DependencyUnavailable => 503,
            _ => 400,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{} ({}): {}", self.kind, self.key, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ValidationError::malformed("subject", "x").code(), 400);
        assert_eq!(ValidationError::unresolved("source", "x").code(), 400);
        assert_eq!(ValidationError::out_of_range("duedate_begin", "x").code(), 400);
        assert_eq!(ValidationError::unsupported_operator("reopen_count", "x").code(), 400);
        assert_eq!(ValidationError::lookup_failed("dept_id", "x").code(), 503);
    }

    #[test]
    fn test_display_includes_key_and_message() {
        let err = ValidationError::unresolved("source", "invalid source 'Bogus'");
        assert_eq!(
            err.to_string(),
            "UnresolvedReference (source): invalid source 'Bogus'"
        );
        let err = ValidationError::malformed("", "criteria must be an object");
        assert_eq!(err.to_string(), "MalformedValue: criteria must be an object");
    }
}
