//! Error taxonomy shared by all adapters.

use std::io;
use thiserror::Error;

use crate::ConnectionState;

/// Result alias used throughout unifs.
pub type FsResult<T> = Result<T, FsError>;

/// Failure of a file operation, normalized across backends.
///
/// Native status codes (FTP replies, SFTP status codes, errno) are translated
/// into these variants at the adapter boundary and never leak past it.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error("directory not empty: {path}")]
    NotEmpty { path: String },

    /// Transport, stream or disk failure.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Connect-time only.
    #[error("authentication failed for {user}@{host}: {reason}")]
    AuthenticationFailure {
        host: String,
        user: String,
        reason: String,
    },

    /// Backend answered with a status the adapter has no mapping for.
    #[error("protocol error{}: {message}", .code.map(|c| format!(" {c}")).unwrap_or_default())]
    Protocol { code: Option<u32>, message: String },

    #[error("backend is {state}, not ready")]
    NotConnected { state: ConnectionState },
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        FsError::NotFound { path: path.into() }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        FsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Map a `std::io::Error` onto the taxonomy.
    pub fn from_io(source: io::Error, path: impl Into<String>) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path },
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists { path },
            io::ErrorKind::NotADirectory => FsError::NotADirectory { path },
            io::ErrorKind::IsADirectory => FsError::IsADirectory { path },
            io::ErrorKind::DirectoryNotEmpty => FsError::NotEmpty { path },
            _ => FsError::Io { path, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_kinds() {
        let err = FsError::from_io(io::Error::from(io::ErrorKind::NotFound), "/a");
        assert!(matches!(err, FsError::NotFound { ref path } if path == "/a"));

        let err = FsError::from_io(io::Error::from(io::ErrorKind::AlreadyExists), "/a");
        assert!(matches!(err, FsError::AlreadyExists { .. }));

        let err = FsError::from_io(io::Error::from(io::ErrorKind::DirectoryNotEmpty), "/a");
        assert!(matches!(err, FsError::NotEmpty { .. }));

        let err = FsError::from_io(io::Error::from(io::ErrorKind::IsADirectory), "/a");
        assert!(matches!(err, FsError::IsADirectory { .. }));

        let err = FsError::from_io(io::Error::from(io::ErrorKind::NotADirectory), "/a");
        assert!(matches!(err, FsError::NotADirectory { .. }));
    }

    #[test]
    fn test_from_io_other_is_io() {
        let err = FsError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), "/etc");
        match err {
            FsError::Io { path, source } => {
                assert_eq!(path, "/etc");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_protocol_display() {
        let with_code = FsError::Protocol {
            code: Some(421),
            message: "service not available".into(),
        };
        assert_eq!(with_code.to_string(), "protocol error 421: service not available");

        let without = FsError::Protocol {
            code: None,
            message: "bad reply".into(),
        };
        assert_eq!(without.to_string(), "protocol error: bad reply");
    }

    #[test]
    fn test_not_connected_display() {
        let err = FsError::NotConnected {
            state: ConnectionState::Closed,
        };
        assert_eq!(err.to_string(), "backend is closed, not ready");
    }
}
