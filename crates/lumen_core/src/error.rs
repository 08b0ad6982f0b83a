//! Graphics pipeline error types

use thiserror::Error;

/// Errors returned by every backend operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GfxError {
    /// Null, malformed or mistyped input (including handle kind mismatches)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Numeric value outside its documented domain
    #[error("value out of range: {0}")]
    Range(String),

    /// Operation not valid in the current frame or clip state
    #[error("invalid state: {0}")]
    State(String),

    /// Handle does not resolve (unknown id or stale generation)
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation not expressible in the active mode
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Size or count arithmetic would wrap
    #[error("overflow: {0}")]
    Overflow(String),

    /// Allocator refused a request
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Native API failure with no finer classification
    #[error("native failure: {0}")]
    Unknown(String),
}

/// Fieldless mirror of [`GfxError`] for matching and stable status codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Range,
    State,
    NotFound,
    Unsupported,
    Overflow,
    OutOfMemory,
    Unknown,
}

impl ErrorKind {
    /// Status code used by the toolkit's C-facing layer
    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::Unknown => -1,
            ErrorKind::InvalidArgument => -2,
            ErrorKind::OutOfMemory => -3,
            ErrorKind::NotFound => -4,
            ErrorKind::Unsupported => -6,
            ErrorKind::State => -8,
            ErrorKind::Range => -9,
            ErrorKind::Overflow => -14,
        }
    }
}

impl GfxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GfxError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            GfxError::Range(_) => ErrorKind::Range,
            GfxError::State(_) => ErrorKind::State,
            GfxError::NotFound(_) => ErrorKind::NotFound,
            GfxError::Unsupported(_) => ErrorKind::Unsupported,
            GfxError::Overflow(_) => ErrorKind::Overflow,
            GfxError::OutOfMemory(_) => ErrorKind::OutOfMemory,
            GfxError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        GfxError::Range(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        GfxError::State(msg.into())
    }
}

/// Result type for graphics operations
pub type Result<T> = std::result::Result<T, GfxError>;

/// Keep the first error seen across a teardown sequence.
///
/// Returns `Ok(())` only if every step succeeded.
pub fn first_error<I>(results: I) -> Result<()>
where
    I: IntoIterator<Item = Result<()>>,
{
    let mut first = Ok(());
    for result in results {
        if let Err(err) = result {
            if first.is_ok() {
                first = Err(err);
            }
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(GfxError::Range("w".into()).code(), -9);
        assert_eq!(GfxError::State("f".into()).code(), -8);
        assert_eq!(GfxError::Overflow("n".into()).kind(), ErrorKind::Overflow);
    }

    #[test]
    fn test_first_error_keeps_earliest() {
        let results = vec![
            Ok(()),
            Err(GfxError::NotFound("a".into())),
            Err(GfxError::Unknown("b".into())),
        ];
        assert_eq!(
            first_error(results),
            Err(GfxError::NotFound("a".into()))
        );
        assert_eq!(first_error(vec![Ok(()), Ok(())]), Ok(()));
    }
}
