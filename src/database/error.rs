use thiserror::Error;

/// Errors raised by repositories and the connection wrapper.
///
/// `UnexpectedResult` means the statement ran but produced the wrong shape of
/// result (typically no row back from an insert). `Driver` wraps a failure
/// reported by sqlx itself. Both keep a trail of the repository methods the
/// error passed through, innermost first.
#[derive(Debug, Error)]
pub enum SqlError {
    #[error("{message}")]
    UnexpectedResult { message: String, trail: Vec<String> },

    #[error("database error: {source}")]
    Driver {
        #[source]
        source: sqlx::Error,
        trail: Vec<String>,
    },

    #[error("connection is not open")]
    ConnectionClosed,
}

impl SqlError {
    pub fn unexpected(message: impl Into<String>, origin: impl Into<String>) -> Self {
        SqlError::UnexpectedResult {
            message: message.into(),
            trail: vec![origin.into()],
        }
    }

    /// Append a provenance entry.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        match &mut self {
            SqlError::UnexpectedResult { trail, .. } | SqlError::Driver { trail, .. } => trail.push(origin.into()),
            SqlError::ConnectionClosed => {}
        }
        self
    }

    pub fn trail(&self) -> &[String] {
        match self {
            SqlError::UnexpectedResult { trail, .. } | SqlError::Driver { trail, .. } => trail,
            SqlError::ConnectionClosed => &[],
        }
    }
}

impl From<sqlx::Error> for SqlError {
    fn from(source: sqlx::Error) -> Self {
        SqlError::Driver { source, trail: vec![] }
    }
}

pub trait SqlResultExt<T> {
    fn origin(self, origin: &str) -> Result<T, SqlError>;
}

impl<T, E: Into<SqlError>> SqlResultExt<T> for Result<T, E> {
    fn origin(self, origin: &str) -> Result<T, SqlError> {
        self.map_err(|e| e.into().with_origin(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_accumulates_trail() {
        let result: Result<(), SqlError> = Err(SqlError::unexpected("no rows", "DraftRepository->create_draft"));
        let err = result.origin("DraftService->create_draft").unwrap_err();
        assert_eq!(err.trail(), ["DraftRepository->create_draft", "DraftService->create_draft"]);
        assert_eq!(err.to_string(), "no rows");
    }

    #[test]
    fn driver_errors_start_with_empty_trail() {
        let err: SqlError = sqlx::Error::RowNotFound.into();
        assert!(err.trail().is_empty());
        assert!(matches!(err, SqlError::Driver { .. }));
    }
}
