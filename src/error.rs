//! Error type for line reading
use std::error;
use std::fmt;
use std::io;

/// The error type for I/O and system call failures that can arise while
/// reading a line from the terminal.
#[derive(Debug)]
pub enum ReadlineError {
    /// I/O Error
    Io(io::Error),
    /// EOF (Ctrl-D on an empty line, or the input stream was closed)
    Eof,
    /// Ctrl-C
    Interrupted,
    /// Unix Error from syscall
    #[cfg(unix)]
    Errno(nix::Error),
}

impl fmt::Display for ReadlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ReadlineError::Io(ref err) => err.fmt(f),
            ReadlineError::Eof => write!(f, "EOF"),
            ReadlineError::Interrupted => write!(f, "Interrupted"),
            #[cfg(unix)]
            ReadlineError::Errno(ref err) => write!(f, "Errno: {}", err),
        }
    }
}

impl error::Error for ReadlineError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ReadlineError::Io(ref err) => Some(err),
            #[cfg(unix)]
            ReadlineError::Errno(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ReadlineError {
    fn from(err: io::Error) -> Self {
        ReadlineError::Io(err)
    }
}

#[cfg(unix)]
impl From<nix::Error> for ReadlineError {
    fn from(err: nix::Error) -> Self {
        ReadlineError::Errno(err)
    }
}
