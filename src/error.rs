use thiserror::Error;

/// Coarse classification of a [`DatabaseError`].
///
/// Callers that only need to decide "try the next password" vs "give up"
/// can match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    Truncated,
    WrongPasswordOrCorrupt,
    WrongPassword,
    CorruptData,
    Other,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad magic, bad version or a structurally impossible field.
    #[error("database format is incorrect: {0}")]
    Format(String),

    #[error("array of {0} bytes exceeds the 255 byte field limit")]
    ArrayTooLong(usize),

    #[error("unexpected end of data: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Invalid password or corrupted data")]
    WrongPasswordOrCorrupt,

    #[error("Wrong password")]
    WrongPassword,

    /// Decryption succeeded but the payload does not inflate.
    #[error("corrupted data: {0}")]
    CorruptData(String),

    #[error("OS random generator unavailable")]
    Random,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::Io(_) => ErrorKind::Io,
            DatabaseError::Format(_) | DatabaseError::ArrayTooLong(_) => ErrorKind::Format,
            DatabaseError::Truncated { .. } => ErrorKind::Truncated,
            DatabaseError::WrongPasswordOrCorrupt => ErrorKind::WrongPasswordOrCorrupt,
            DatabaseError::WrongPassword => ErrorKind::WrongPassword,
            DatabaseError::CorruptData(_) => ErrorKind::CorruptData,
            DatabaseError::Random | DatabaseError::InvalidParameter(_) => ErrorKind::Other,
        }
    }

    /// `true` for the outcomes a wrong password normally produces.
    pub fn is_password_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::WrongPasswordOrCorrupt | ErrorKind::WrongPassword
        )
    }
}

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_failures_are_classified() {
        assert!(DatabaseError::WrongPassword.is_password_failure());
        assert!(DatabaseError::WrongPasswordOrCorrupt.is_password_failure());
        assert!(!DatabaseError::Format("bad magic".into()).is_password_failure());
        assert!(!DatabaseError::CorruptData("inflate".into()).is_password_failure());
    }

    #[test]
    fn array_overflow_is_a_format_error() {
        assert_eq!(DatabaseError::ArrayTooLong(256).kind(), ErrorKind::Format);
    }

    #[test]
    fn truncated_message_names_sizes() {
        let err = DatabaseError::Truncated {
            needed: 4,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "unexpected end of data: needed 4 bytes, 1 available"
        );
    }
}
