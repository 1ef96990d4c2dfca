use std::fmt;

/// Fixed taxonomy of failures surfaced by a weather lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CityNotFound,
    ApiKeyMissing,
    ApiKeyInvalid,
    ApiError,
    InternalError,
}

impl ErrorKind {
    /// Stable wire code, e.g. `CITY_NOT_FOUND`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::CityNotFound => "CITY_NOT_FOUND",
            ErrorKind::ApiKeyMissing => "API_KEY_MISSING",
            ErrorKind::ApiKeyInvalid => "API_KEY_INVALID",
            ErrorKind::ApiError => "API_ERROR",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }

    pub const fn all() -> &'static [ErrorKind] {
        &[
            ErrorKind::CityNotFound,
            ErrorKind::ApiKeyMissing,
            ErrorKind::ApiKeyInvalid,
            ErrorKind::ApiError,
            ErrorKind::InternalError,
        ]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified failure: a kind tag plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    kind: ErrorKind,
    message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn city_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CityNotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique_and_upper_snake() {
        let mut seen = std::collections::HashSet::new();
        for kind in ErrorKind::all() {
            let code = kind.code();
            assert!(seen.insert(code), "duplicate code {code}");
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn display_is_the_message_only() {
        let err = ServiceError::new(ErrorKind::ApiKeyInvalid, "Invalid API key");
        assert_eq!(err.to_string(), "Invalid API key");
        assert_eq!(err.kind(), ErrorKind::ApiKeyInvalid);
        assert_eq!(err.kind().to_string(), "API_KEY_INVALID");
    }
}
