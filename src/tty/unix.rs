//! Unix terminal: termios raw mode, the non-blocking reader thread and
//! an ANSI renderer on stdout
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{trace, warn};
use nix::sys::termios::{self, SetArg, SpecialCharacterIndices};
use utf8parse::{Parser, Receiver};

use super::{Poll, RawMode, RawReader, Renderer, Term};
use crate::config::Config;
use crate::consts::KEYBOARD_BELL;
use crate::error::ReadlineError;
use crate::Result;

/// Terminals that cannot provide a line-editing interface.
static UNSUPPORTED_TERM: [&str; 3] = ["dumb", "cons25", "emacs"];

fn is_a_tty(fd: libc::c_int) -> bool {
    unsafe { libc::isatty(fd) != 0 }
}

fn is_unsupported_term() -> bool {
    match std::env::var("TERM") {
        Ok(term) => UNSUPPORTED_TERM
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&term)),
        Err(_) => false,
    }
}

nix::ioctl_read_bad!(win_size, libc::TIOCGWINSZ, libc::winsize);

fn terminal_size() -> Option<(usize, usize)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let ok = unsafe { win_size(libc::STDOUT_FILENO, &mut size) };
    match ok {
        Ok(0) if size.ws_col != 0 => Some((size.ws_col as usize, size.ws_row as usize)),
        _ => None,
    }
}

/// Restores the saved termios settings when raw mode ends.
#[must_use = "the terminal stays raw until disable_raw_mode is called"]
pub struct PosixMode {
    original: termios::Termios,
}

impl RawMode for PosixMode {
    fn disable_raw_mode(&self) -> Result<()> {
        termios::tcsetattr(libc::STDIN_FILENO, SetArg::TCSADRAIN, &self.original)?;
        Ok(())
    }
}

enum Slot {
    Empty,
    Byte(u8),
    Eof,
}

struct Shared {
    state: Mutex<Cell>,
    cond: Condvar,
}

struct Cell {
    slot: Slot,
    requested: bool,
    shutdown: bool,
    error: Option<io::Error>,
}

/// Buffers one byte at a time on a background thread so the decoder can
/// peek with a timeout.
///
/// The editor thread never touches the underlying byte source while the
/// helper is active: it asks the thread for a byte and waits on the
/// single-slot cell.
pub struct NonBlockingReader {
    shared: Arc<Shared>,
    /// Retained only when the helper is disabled; the thread owns the
    /// source otherwise.
    source: Option<Box<dyn Read + Send>>,
    enabled: bool,
    down: bool,
}

impl NonBlockingReader {
    pub fn new(source: Box<dyn Read + Send>, enabled: bool) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(Cell {
                slot: Slot::Empty,
                requested: false,
                shutdown: false,
                error: None,
            }),
            cond: Condvar::new(),
        });
        let mut retained = None;
        if enabled {
            let shared = Arc::clone(&shared);
            let mut source = source;
            thread::Builder::new()
                .name("termline-stdin".to_owned())
                .spawn(move || reader_loop(&shared, &mut *source))?;
        } else {
            retained = Some(source);
        }
        Ok(NonBlockingReader {
            shared,
            source: retained,
            enabled,
            down: false,
        })
    }

    pub fn is_non_blocking_enabled(&self) -> bool {
        self.enabled
    }

    /// Consume the next byte. `None` on EOF.
    pub fn read(&mut self) -> Result<Option<u8>> {
        if !self.enabled {
            return self.read_direct();
        }
        let mut cell = self.shared.state.lock().expect("input cell poisoned");
        loop {
            if let Some(err) = cell.error.take() {
                return Err(err.into());
            }
            match cell.slot {
                Slot::Byte(b) => {
                    cell.slot = Slot::Empty;
                    return Ok(Some(b));
                }
                Slot::Eof => return Ok(None),
                Slot::Empty => {}
            }
            if !cell.requested {
                cell.requested = true;
                self.shared.cond.notify_all();
            }
            cell = self
                .shared
                .cond
                .wait(cell)
                .expect("input cell poisoned");
        }
    }

    /// Report whether a byte is ready, waiting at most `timeout_ms`.
    /// The byte stays buffered for the next `read`.
    pub fn peek(&mut self, timeout_ms: u64) -> Result<Poll> {
        if !self.enabled {
            return Ok(Poll::Expired);
        }
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut cell = self.shared.state.lock().expect("input cell poisoned");
        loop {
            if let Some(err) = cell.error.take() {
                return Err(err.into());
            }
            match cell.slot {
                Slot::Byte(_) => return Ok(Poll::Ready),
                Slot::Eof => return Ok(Poll::Eof),
                Slot::Empty => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Poll::Expired);
            }
            if !cell.requested {
                cell.requested = true;
                self.shared.cond.notify_all();
            }
            let (next, _) = self
                .shared
                .cond
                .wait_timeout(cell, deadline - now)
                .expect("input cell poisoned");
            cell = next;
        }
    }

    /// Stop the background reader. Idempotent; the thread exits after
    /// its current blocking read returns.
    pub fn shutdown(&mut self) {
        if self.down {
            return;
        }
        self.down = true;
        let mut cell = self.shared.state.lock().expect("input cell poisoned");
        cell.shutdown = true;
        self.shared.cond.notify_all();
    }

    fn read_direct(&mut self) -> Result<Option<u8>> {
        let source = match self.source.as_mut() {
            Some(source) => source,
            None => return Ok(None),
        };
        let mut buf = [0u8; 1];
        loop {
            match source.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for NonBlockingReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reader_loop(shared: &Shared, source: &mut dyn Read) {
    let mut buf = [0u8; 1];
    loop {
        {
            let mut cell = shared.state.lock().expect("input cell poisoned");
            while !cell.requested && !cell.shutdown {
                cell = shared.cond.wait(cell).expect("input cell poisoned");
            }
            if cell.shutdown {
                return;
            }
            cell.requested = false;
        }
        // the blocking read happens outside the lock
        let outcome = source.read(&mut buf);
        let mut cell = shared.state.lock().expect("input cell poisoned");
        match outcome {
            Ok(0) => cell.slot = Slot::Eof,
            Ok(_) => cell.slot = Slot::Byte(buf[0]),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => cell.requested = true,
            Err(e) => cell.error = Some(e),
        }
        shared.cond.notify_all();
        if cell.shutdown {
            return;
        }
    }
}

struct Utf8Char(Option<char>);

impl Receiver for Utf8Char {
    fn codepoint(&mut self, c: char) {
        self.0 = Some(c);
    }

    fn invalid_sequence(&mut self) {
        warn!(target: "termline", "invalid utf-8 sequence on stdin");
    }
}

/// Decodes the byte stream buffered by [`NonBlockingReader`] into code
/// points.
pub struct PosixRawReader {
    input: NonBlockingReader,
    parser: Parser,
}

impl PosixRawReader {
    fn new(config: &Config) -> Result<Self> {
        let stdin: Box<dyn Read + Send> = Box::new(StdinSource);
        let enabled =
            config.escape_timeout() > 0 && !is_unsupported_term() && is_a_tty(libc::STDIN_FILENO);
        Ok(PosixRawReader {
            input: NonBlockingReader::new(stdin, enabled)?,
            parser: Parser::new(),
        })
    }
}

impl RawReader for PosixRawReader {
    fn next_char(&mut self) -> Result<Option<char>> {
        loop {
            let byte = match self.input.read()? {
                Some(byte) => byte,
                None => return Ok(None),
            };
            let mut receiver = Utf8Char(None);
            self.parser.advance(&mut receiver, byte);
            if let Some(c) = receiver.0 {
                trace!(target: "termline", "keystroke: {:?}", c);
                return Ok(Some(c));
            }
        }
    }

    fn poll(&mut self, timeout_ms: u64) -> Result<Poll> {
        self.input.peek(timeout_ms)
    }

    fn is_non_blocking_enabled(&self) -> bool {
        self.input.is_non_blocking_enabled()
    }
}

/// Reads stdin through the raw file descriptor so the helper thread and
/// direct reads see the same stream.
struct StdinSource;

impl Read for StdinSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::read(
                libc::STDIN_FILENO,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
            )
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

/// ANSI renderer over stdout.
pub struct PosixRenderer {
    out: io::Stdout,
    cols: usize,
    rows: usize,
    bell_enabled: bool,
}

impl Renderer for PosixRenderer {
    fn write_str(&mut self, s: &str) -> Result<()> {
        self.out.write_all(s.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn beep(&mut self) -> Result<()> {
        if self.bell_enabled {
            self.write_char_n(KEYBOARD_BELL, 1)?;
            self.flush()?;
        }
        Ok(())
    }

    fn width(&self) -> usize {
        self.cols
    }

    fn height(&self) -> usize {
        self.rows
    }

    fn update_size(&mut self) {
        if let Some((cols, rows)) = terminal_size() {
            self.cols = cols;
            self.rows = rows;
        }
    }

    fn is_ansi_supported(&self) -> bool {
        true
    }

    fn has_weird_wrap(&self) -> bool {
        false
    }

    fn is_echo_enabled(&self) -> bool {
        // raw mode turned ECHO off
        false
    }
}

pub type Terminal = PosixTerminal;

/// The tty pair: stdin in raw mode, stdout as an ANSI renderer.
pub struct PosixTerminal {
    unsupported: bool,
    stdin_isatty: bool,
    bell_enabled: bool,
}

impl Term for PosixTerminal {
    type Mode = PosixMode;
    type Reader = PosixRawReader;
    type Writer = PosixRenderer;

    fn new(config: &Config) -> Self {
        PosixTerminal {
            unsupported: is_unsupported_term(),
            stdin_isatty: is_a_tty(libc::STDIN_FILENO),
            bell_enabled: config.bell_enabled(),
        }
    }

    fn is_unsupported(&self) -> bool {
        self.unsupported
    }

    fn is_stdin_tty(&self) -> bool {
        self.stdin_isatty
    }

    fn enable_raw_mode(&mut self) -> Result<PosixMode> {
        use nix::sys::termios::{ControlFlags, InputFlags, LocalFlags};
        if !self.stdin_isatty {
            return Err(ReadlineError::Io(io::Error::new(
                io::ErrorKind::Other,
                "stdin is not a tty",
            )));
        }
        let original = termios::tcgetattr(libc::STDIN_FILENO)?;
        let mut raw = original.clone();
        // disable BREAK interrupt, CR to NL conversion on input,
        // input parity check, strip high bit (bit 8), output flow control
        raw.input_flags &= !(InputFlags::BRKINT
            | InputFlags::ICRNL
            | InputFlags::INPCK
            | InputFlags::ISTRIP
            | InputFlags::IXON);
        raw.control_flags |= ControlFlags::CS8;
        // disable echoing, canonical mode, extended input processing and signals
        raw.local_flags &=
            !(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(libc::STDIN_FILENO, SetArg::TCSADRAIN, &raw)?;
        Ok(PosixMode { original })
    }

    fn create_reader(&self, config: &Config) -> Result<PosixRawReader> {
        PosixRawReader::new(config)
    }

    fn create_writer(&self) -> PosixRenderer {
        let (cols, rows) = terminal_size().unwrap_or((80, 24));
        PosixRenderer {
            out: io::stdout(),
            cols,
            rows,
            bell_enabled: self.bell_enabled,
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Read;
    use std::time::Duration;

    use super::{NonBlockingReader, Poll};

    struct SlowBytes {
        chunks: Vec<(u64, u8)>,
        pos: usize,
    }

    impl Read for SlowBytes {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.chunks.len() {
                return Ok(0);
            }
            let (delay_ms, byte) = self.chunks[self.pos];
            self.pos += 1;
            std::thread::sleep(Duration::from_millis(delay_ms));
            buf[0] = byte;
            Ok(1)
        }
    }

    #[test]
    fn peek_then_read_sees_the_same_byte() {
        let source = SlowBytes {
            chunks: vec![(0, b'a'), (0, b'b')],
            pos: 0,
        };
        let mut nb = NonBlockingReader::new(Box::new(source), true).unwrap();
        assert_eq!(Poll::Ready, nb.peek(1000).unwrap());
        assert_eq!(Some(b'a'), nb.read().unwrap());
        assert_eq!(Some(b'b'), nb.read().unwrap());
        assert_eq!(None, nb.read().unwrap());
        nb.shutdown();
        nb.shutdown(); // idempotent
    }

    #[test]
    fn peek_expires_on_slow_input() {
        let source = SlowBytes {
            chunks: vec![(200, b'x')],
            pos: 0,
        };
        let mut nb = NonBlockingReader::new(Box::new(source), true).unwrap();
        assert_eq!(Poll::Expired, nb.peek(10).unwrap());
        // the byte is still delivered to the next blocking read
        assert_eq!(Some(b'x'), nb.read().unwrap());
        nb.shutdown();
    }

    #[test]
    fn peek_reports_eof() {
        let source = SlowBytes {
            chunks: vec![],
            pos: 0,
        };
        let mut nb = NonBlockingReader::new(Box::new(source), true).unwrap();
        assert_eq!(Poll::Eof, nb.peek(1000).unwrap());
        assert_eq!(None, nb.read().unwrap());
        nb.shutdown();
    }

    #[test]
    fn disabled_reader_reads_directly() {
        let source = SlowBytes {
            chunks: vec![(0, b'z')],
            pos: 0,
        };
        let mut nb = NonBlockingReader::new(Box::new(source), false).unwrap();
        assert!(!nb.is_non_blocking_enabled());
        assert_eq!(Poll::Expired, nb.peek(10).unwrap());
        assert_eq!(Some(b'z'), nb.read().unwrap());
        assert_eq!(None, nb.read().unwrap());
    }
}
