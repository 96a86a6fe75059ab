//! Terminal contracts: raw mode, keystroke input, low-level rendering
use crate::config::Config;
use crate::Result;

/// Outcome of a non-blocking peek at the input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    /// A byte is ready; the next read returns immediately.
    Ready,
    /// The stream is closed.
    Eof,
    /// No byte arrived within the timeout.
    Expired,
}

/// Terminal state guard
pub trait RawMode: Sized {
    /// Disable RAW mode for the terminal.
    fn disable_raw_mode(&self) -> Result<()>;
}

/// Translate bytes read from stdin to code points.
pub trait RawReader {
    /// Blocking read of the next code point. `None` on EOF.
    fn next_char(&mut self) -> Result<Option<char>>;
    /// Peek for input without consuming it, waiting at most
    /// `timeout_ms` milliseconds.
    fn poll(&mut self, timeout_ms: u64) -> Result<Poll>;
    /// Whether timed peeks are available (the background reader is
    /// running).
    fn is_non_blocking_enabled(&self) -> bool;
}

/// Low-level terminal output: raw text, ANSI sequences and the
/// capability flags the rendering strategies switch on.
pub trait Renderer {
    fn write_str(&mut self, s: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;

    fn write_char_n(&mut self, c: char, n: usize) -> Result<()> {
        if n > 0 {
            let s: String = std::iter::repeat(c).take(n).collect();
            self.write_str(&s)?;
        }
        Ok(())
    }

    /// Emit `ESC [ seq` and flush.
    fn csi(&mut self, seq: &str) -> Result<()> {
        self.write_str("\x1b[")?;
        self.write_str(seq)?;
        self.flush()
    }

    /// Audible bell, honoring the bell-enabled flag.
    fn beep(&mut self) -> Result<()>;

    /// Number of columns in the current terminal.
    fn width(&self) -> usize;
    /// Number of rows in the current terminal.
    fn height(&self) -> usize;
    /// Re-probe the terminal size.
    fn update_size(&mut self);

    /// Whether the terminal honors ANSI control sequences; otherwise the
    /// dumb strategy (backspaces and reprints) is used.
    fn is_ansi_supported(&self) -> bool;
    /// Whether filling the last column leaves the cursor parked until
    /// the next character is printed.
    fn has_weird_wrap(&self) -> bool;
    /// Whether the terminal still echoes input (echo must then be
    /// erased after each keystroke).
    fn is_echo_enabled(&self) -> bool;
}

/// Terminal contract
pub trait Term {
    type Reader: RawReader;
    type Writer: Renderer;
    type Mode: RawMode;

    fn new(config: &Config) -> Self;
    /// Check if the current terminal can provide a rich line-editing
    /// user interface.
    fn is_unsupported(&self) -> bool;
    /// Check if stdin is connected to a terminal.
    fn is_stdin_tty(&self) -> bool;
    /// Enable RAW mode for the terminal.
    fn enable_raw_mode(&mut self) -> Result<Self::Mode>;
    /// Create a keystroke reader.
    fn create_reader(&self, config: &Config) -> Result<Self::Reader>;
    /// Create a renderer.
    fn create_writer(&self) -> Self::Writer;
}

/// Parse the reply to a `CSI 6n` cursor position query:
/// `ESC [ row ; col R`. Anything malformed yields `None` and the caller
/// carries on without the report.
pub fn read_position_report(rdr: &mut dyn RawReader) -> Result<Option<(usize, usize)>> {
    let mut reply = String::with_capacity(8);
    loop {
        match rdr.next_char()? {
            None => return Ok(None),
            Some('R') => break,
            Some('\x1b') | Some('[') => {}
            Some(c) => reply.push(c),
        }
    }
    let mut parts = reply.splitn(2, ';');
    let row = parts.next().and_then(|s| s.parse().ok());
    let col = parts.next().and_then(|s| s.parse().ok());
    match (row, col) {
        (Some(row), Some(col)) => Ok(Some((row, col))),
        _ => Ok(None),
    }
}

cfg_if::cfg_if! {
    if #[cfg(test)] {
        pub use self::test::*;
    } else if #[cfg(unix)] {
        pub use self::unix::*;
    } else {
        compile_error!("termline only supports unix-like platforms");
    }
}

// the platform backend still builds under cfg(test) so its own unit
// tests (the non-blocking reader protocol) run, while the editor tests
// go through the dummy terminal above
#[cfg(unix)]
#[cfg_attr(test, allow(dead_code))]
pub mod unix;
