use std::{fmt, io};

/// Recoverable failures of a bit cursor.
///
/// Every variant records how many bits of the failing call made it through
/// before it stopped. Fixed buffers check up front, so for them the count is
/// always zero; streams can fail halfway through a multi-byte request.
#[derive(Debug)]
pub enum Error {
    /// The source ran out of data. `read` bits of the request were obtained.
    UnexpectedEof { read: usize },
    /// The backing store refused to take more bytes. `written` bits of the
    /// request were committed.
    Capacity { written: usize },
    /// The underlying stream failed for another reason.
    Io { done: usize, source: io::Error },
}

impl Error {
    /// Bits of the failed call that were read or committed.
    pub fn bits_done(&self) -> usize {
        match self {
            Error::UnexpectedEof { read } => *read,
            Error::Capacity { written } => *written,
            Error::Io { done, .. } => *done,
        }
    }

    pub(crate) fn add_done(self, bits: usize) -> Self {
        match self {
            Error::UnexpectedEof { read } => Error::UnexpectedEof { read: read + bits },
            Error::Capacity { written } => Error::Capacity { written: written + bits },
            Error::Io { done, source } => Error::Io { done: done + bits, source },
        }
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Error::UnexpectedEof { .. } => io::ErrorKind::UnexpectedEof,
            Error::Capacity { .. } => io::ErrorKind::WriteZero,
            Error::Io { source, .. } => source.kind(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEof { read } => {
                write!(f, "unexpected end of data after {read} bits")
            }
            Error::Capacity { written } => {
                write!(f, "backing store is full after {written} bits")
            }
            Error::Io { done, source } => write!(f, "I/O error after {done} bits: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io { source, .. } => source,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_done_accumulates() {
        let err = Error::UnexpectedEof { read: 3 }.add_done(16);
        assert_eq!(err.bits_done(), 19);
        let err = Error::Capacity { written: 0 }.add_done(8);
        assert_eq!(err.bits_done(), 8);
    }

    #[test]
    fn converts_to_io_error() {
        let err: io::Error = Error::Capacity { written: 8 }.into();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);

        let err: io::Error = Error::UnexpectedEof { read: 0 }.into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let source = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err: io::Error = Error::Io { done: 0, source }.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn display_reports_progress() {
        let err = Error::UnexpectedEof { read: 16 };
        assert_eq!(err.to_string(), "unexpected end of data after 16 bits");
    }
}
