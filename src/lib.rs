//! Termline: readline-style line editing for console applications.
//!
//! The editor reads a single line from the terminal with in-place
//! editing, history navigation, incremental reverse search, tab
//! completion, keyboard macros and both Emacs and Vi keymaps.
//!
//! # Example
//!
//! ```no_run
//! use termline::{Editor, ReadlineError};
//!
//! fn main() -> termline::Result<()> {
//!     let mut editor = Editor::new();
//!     loop {
//!         match editor.readline("> ") {
//!             Ok(line) => println!("{}", line),
//!             Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
//!             Err(err) => return Err(err),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
use std::result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::trace;

pub mod completion;
pub mod config;
mod consts;
mod edit;
pub mod error;
mod expand;
pub mod history;
pub mod keymap;
mod line_buffer;
mod search;
mod tty;

use completion::print_candidates;
use consts::ESC;
use keymap::{Action, Operation, Resolved};
use search::SearchState;
use tty::{Poll, RawMode, RawReader, Renderer, Term};

pub use completion::{Completer, CompletionHandler, ListCompletionHandler};
pub use config::{Builder, Config, EditMode};
pub use edit::State;
pub use error::ReadlineError;
pub use expand::expand_events;
pub use history::{History, MemoryHistory};
pub use keymap::{KeyMap, KeyMaps, EMACS, VI_INSERT, VI_MOVE};
pub use line_buffer::LineBuffer;

/// The error type for I/O errors and system call failures.
pub type Result<T> = result::Result<T, ReadlineError>;

#[derive(Default)]
struct MacroState {
    recording: bool,
    keys: String,
}

/// Line editor: owns the terminal, the keymaps, the history and the
/// completion plumbing. One `readline` call reads one line.
pub struct Editor<H: History = MemoryHistory> {
    pub(crate) term: tty::Terminal,
    reader: Option<<tty::Terminal as Term>::Reader>,
    config: Config,
    keys: KeyMaps,
    pub(crate) history: H,
    completers: Vec<Box<dyn Completer>>,
    completion_handler: Box<dyn CompletionHandler>,
    macro_state: MacroState,
    comment_begin: Option<String>,
    history_enabled: bool,
    skip_lf: bool,
}

impl Editor<MemoryHistory> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let history = MemoryHistory::with_config(&config);
        Self::with_history(config, history)
    }
}

impl Default for Editor<MemoryHistory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: History> Editor<H> {
    /// Build an editor over an external history provider.
    pub fn with_history(config: Config, history: H) -> Self {
        let mut keys = KeyMaps::new();
        if config.edit_mode() == EditMode::Vi {
            keys.set_active(VI_INSERT);
        }
        Editor {
            term: tty::Terminal::new(&config),
            reader: None,
            config,
            keys,
            history,
            completers: Vec::new(),
            completion_handler: Box::new(ListCompletionHandler),
            macro_state: MacroState::default(),
            comment_begin: None,
            history_enabled: true,
            skip_lf: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Add a line to the history without going through `readline`.
    pub fn add_history_entry(&mut self, line: &str) -> bool {
        self.history.add(line)
    }

    /// Whether finished lines are added to the history.
    pub fn set_history_enabled(&mut self, yes: bool) {
        self.history_enabled = yes;
    }

    pub fn keymaps(&self) -> &KeyMaps {
        &self.keys
    }

    pub fn keymaps_mut(&mut self) -> &mut KeyMaps {
        &mut self.keys
    }

    /// Switch the active keymap (`emacs`, `vi-insert`, `vi-move`).
    pub fn set_keymap(&mut self, name: &str) -> bool {
        self.keys.set_active(name)
    }

    pub fn add_completer(&mut self, completer: Box<dyn Completer>) {
        self.completers.push(completer);
    }

    pub fn set_completion_handler(&mut self, handler: Box<dyn CompletionHandler>) {
        self.completion_handler = handler;
    }

    /// Set the string inserted by the insert-comment commands. Falls
    /// back to the `comment-begin` variable, then `"#"`.
    pub fn set_comment_begin(&mut self, comment_begin: &str) {
        self.comment_begin = Some(comment_begin.to_owned());
    }

    fn comment_begin(&self) -> String {
        if let Some(ref s) = self.comment_begin {
            return s.clone();
        }
        match self.keys.variable("comment-begin") {
            Some(s) => s.to_owned(),
            None => "#".to_owned(),
        }
    }

    /// Read a line from the terminal, without the trailing newline.
    pub fn readline(&mut self, prompt: &str) -> Result<String> {
        self.readline_impl(prompt, None, None)
    }

    /// Read a line, echoing `mask` instead of the typed characters.
    /// A `'\0'` mask echoes nothing at all.
    pub fn readline_with_mask(&mut self, prompt: &str, mask: Option<char>) -> Result<String> {
        self.readline_impl(prompt, mask, None)
    }

    /// Read a line starting from prefilled content, the cursor sitting
    /// between the two halves of `initial`.
    pub fn readline_with_initial(
        &mut self,
        prompt: &str,
        initial: (&str, &str),
    ) -> Result<String> {
        self.readline_impl(prompt, None, Some(initial))
    }

    fn readline_impl(
        &mut self,
        prompt: &str,
        mask: Option<char>,
        initial: Option<(&str, &str)>,
    ) -> Result<String> {
        if self.term.is_unsupported() || !self.term.is_stdin_tty() {
            return self.readline_direct(prompt, mask);
        }
        let mut rdr = match self.reader.take() {
            Some(rdr) => rdr,
            None => self.term.create_reader(&self.config)?,
        };
        let mut out = self.term.create_writer();
        let guard = self.term.enable_raw_mode()?;
        let result = readline_edit(prompt, mask, initial, self, &mut rdr, &mut out);
        let restored = guard.disable_raw_mode();
        self.reader = Some(rdr);
        restored?;
        result
    }

    /// Plain line reading for terminals that cannot do better. A masked
    /// read keeps a background thread rewriting the prompt so typed
    /// characters stay hidden.
    fn readline_direct(&mut self, prompt: &str, mask: Option<char>) -> Result<String> {
        let mut out = self.term.create_writer();
        let masker = match mask {
            Some(_) => Some(PromptMasker::spawn(prompt)),
            None => None,
        };
        out.write_str(prompt)?;
        out.flush()?;
        let mut rdr = match self.reader.take() {
            Some(rdr) => rdr,
            None => self.term.create_reader(&self.config)?,
        };
        let result = self.read_line_simple(&mut rdr);
        self.reader = Some(rdr);
        if let Some(masker) = masker {
            masker.stop();
        }
        result
    }

    fn read_line_simple(&mut self, rdr: &mut dyn RawReader) -> Result<String> {
        let mut buff = String::new();
        if self.skip_lf {
            self.skip_lf = false;
            match rdr.next_char()? {
                None | Some('\r') => return Ok(buff),
                Some('\n') => {}
                Some(c) => buff.push(c),
            }
        }
        loop {
            match rdr.next_char()? {
                None => {
                    if buff.is_empty() {
                        return Err(ReadlineError::Eof);
                    }
                    return Ok(buff);
                }
                Some('\n') => return Ok(buff),
                Some('\r') => {
                    self.skip_lf = true;
                    return Ok(buff);
                }
                Some(c) => buff.push(c),
            }
        }
    }
}

/// Rewrites the prompt a few hundred times a second so typed characters
/// never stay visible on terminals where echo cannot be turned off.
struct PromptMasker {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PromptMasker {
    fn spawn(prompt: &str) -> Self {
        use std::io::Write;
        let full = format!("\r{}{}\r{}", prompt, " ".repeat(51), prompt);
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut out = std::io::stdout();
            while !flag.load(Ordering::Relaxed) {
                if out.write_all(full.as_bytes()).and_then(|_| out.flush()).is_err() {
                    return;
                }
                thread::sleep(Duration::from_millis(3));
            }
        });
        PromptMasker {
            stop,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Normal,
    Search,
}

/// The interactive read loop: accumulate a key sequence, resolve it
/// against the active keymap, execute the binding.
fn readline_edit<H: History>(
    prompt: &str,
    mask: Option<char>,
    initial: Option<(&str, &str)>,
    editor: &mut Editor<H>,
    rdr: &mut dyn RawReader,
    out: &mut dyn Renderer,
) -> Result<String> {
    let config = editor.config;
    let mut s = State::new(rdr, out, config, prompt, mask);
    s.print_str(prompt)?;
    s.flush()?;
    if let Some((left, right)) = initial {
        s.put_string(&format!("{}{}", left, right))?;
        s.set_cursor_position(left.chars().count())?;
        s.flush()?;
    }

    let original_prompt = prompt.to_owned();
    let mut state = LoopState::Normal;
    let mut search = SearchState::new();
    // buffer and cursor saved when an incremental search starts
    let mut search_backup: Option<(String, usize)> = None;
    // Vi numeric argument accumulator
    let mut repeat_count: usize = 0;
    let mut pending: Vec<char> = Vec::new();
    let mut pushback: Vec<char> = Vec::new();

    loop {
        let c = match pushback.pop() {
            Some(c) => c,
            None => match s.read_character()? {
                Some(c) => c,
                None => return Err(ReadlineError::Eof),
            },
        };
        pending.push(c);

        if editor.macro_state.recording {
            editor.macro_state.keys.push(c);
        }

        let mut resolved = editor.keys.active().get_bound(&pending);
        if let Some(Resolved::Action(Action::Op(Operation::DoLowercaseVersion))) = resolved {
            if let Some(last) = pending.pop() {
                pending.push(last.to_lowercase().next().unwrap_or(last));
            }
            resolved = editor.keys.active().get_bound(&pending);
        }

        let action = match resolved {
            Some(Resolved::Action(action)) => action,
            Some(Resolved::Sub { another_key }) => {
                // A lone ESC is ambiguous: a literal escape, or the
                // start of a control sequence. Peek briefly; silence
                // commits the node's own binding.
                if c == ESC
                    && pending.len() == 1
                    && pushback.is_empty()
                    && s.rdr.is_non_blocking_enabled()
                    && s.rdr.poll(config.escape_timeout())? == Poll::Expired
                {
                    match another_key {
                        Some(action) => {
                            pending.clear();
                            action
                        }
                        None => continue,
                    }
                } else {
                    continue;
                }
            }
            None => {
                // No binding for the accumulated sequence: retry ever
                // shorter prefixes, feeding the dropped tail keys back
                // through the pushback stack.
                let mut found: Option<Action> = None;
                while found.is_none() && !pending.is_empty() {
                    let tail = pending.pop().unwrap_or(c);
                    if let Some(Resolved::Sub { another_key }) =
                        editor.keys.active().get_bound(&pending)
                    {
                        if let Some(action) = another_key {
                            pushback.push(tail);
                            found = Some(action);
                        }
                    }
                }
                match found {
                    Some(action) => action,
                    None => continue,
                }
            }
        };

        trace!(target: "termline", "binding: {:?}", action);

        let op = match action {
            Action::Macro(keys) => {
                for mc in keys.chars().rev() {
                    pushback.push(mc);
                }
                pending.clear();
                continue;
            }
            Action::Callback(callback) => {
                callback();
                pending.clear();
                continue;
            }
            Action::Op(op) => op,
        };

        let mut success = true;

        // Search mode first: a key not linked to a search command
        // leaves search mode and falls through to the normal state.
        if state == LoopState::Search {
            let mut cursor_dest: Option<usize> = None;
            match op {
                Operation::Abort => {
                    state = LoopState::Normal;
                }
                Operation::ReverseSearchHistory => {
                    if search.term.is_empty() {
                        search.term = search.previous_term.clone();
                    }
                    let from = match search.index {
                        Some(idx) => idx,
                        None => editor.history.index(),
                    };
                    search.index = editor.history.search_backwards(&search.term, from, false);
                }
                Operation::BackwardDeleteChar => {
                    if !search.term.is_empty() {
                        search.term.pop();
                        search.index = editor.history.search_backwards(
                            &search.term,
                            editor.history.index(),
                            false,
                        );
                    }
                }
                Operation::SelfInsert => {
                    search.term.push(c);
                    search.index = editor.history.search_backwards(
                        &search.term,
                        editor.history.index(),
                        false,
                    );
                }
                _ => {
                    // install the match and replay the key as a normal
                    // command
                    if let Some(idx) = search.index {
                        editor.history.move_to(idx);
                        cursor_dest = editor
                            .history
                            .current()
                            .find(&search.term)
                            .map(|byte| editor.history.current()[..byte].chars().count());
                    }
                    state = LoopState::Normal;
                }
            }
            if state == LoopState::Search {
                if search.term.is_empty() {
                    s.print_search_status("", "")?;
                    search.index = None;
                } else if let Some(idx) = search.index {
                    let entry = editor.history.get(idx).unwrap_or("").to_owned();
                    s.print_search_status(&search.term, &entry)?;
                } else {
                    s.beep()?;
                }
            } else {
                if op == Operation::Abort {
                    if let Some((saved, cursor)) = search_backup.take() {
                        s.set_buffer(&saved)?;
                        cursor_dest = Some(cursor);
                    }
                }
                search_backup = None;
                s.restore_line(&original_prompt, cursor_dest)?;
            }
        }

        if state == LoopState::Normal {
            // a vi digit argument keeps accumulating; anything else
            // consumes (or resets) the count
            let mut is_arg_digit = false;
            let count = repeat_count.max(1);

            match op {
                Operation::Complete => {
                    success = complete(editor, &mut s)?;
                }
                Operation::PossibleCompletions => {
                    print_completion_candidates(editor, &mut s)?;
                }
                Operation::BeginningOfLine => {
                    success = s.set_cursor_position(0)?;
                }
                Operation::KillLine => {
                    success = s.kill_line()?;
                }
                Operation::KillWholeLine => {
                    success = s.set_cursor_position(0)? && s.kill_line()?;
                }
                Operation::ClearScreen => {
                    success = s.clear_screen()?;
                }
                Operation::OverwriteMode => {
                    let overtype = !s.buf.is_overtype();
                    s.buf.set_overtype(overtype);
                    trace!(target: "termline", "overtype: {}", overtype);
                }
                Operation::SelfInsert => {
                    let text: String = pending.iter().collect();
                    s.put_string(&text)?;
                }
                Operation::AcceptLine => {
                    if let Some(line) = finish_line(editor, &mut s)? {
                        return Ok(line);
                    }
                }
                Operation::ViMoveAcceptLine => {
                    // accepting from movement mode re-enters insert
                    // mode for the next line
                    editor.keys.set_active(VI_INSERT);
                    if let Some(line) = finish_line(editor, &mut s)? {
                        return Ok(line);
                    }
                }
                Operation::BackwardWord => {
                    success = s.previous_word()?;
                }
                Operation::ForwardWord => {
                    success = s.next_word()?;
                }
                Operation::PreviousHistory => {
                    success = move_history(editor, &mut s, false)?;
                }
                Operation::ViPreviousHistory => {
                    success = move_history_count(editor, &mut s, false, count)?
                        && s.set_cursor_position(0)?;
                }
                Operation::NextHistory => {
                    success = move_history(editor, &mut s, true)?;
                }
                Operation::ViNextHistory => {
                    success = move_history_count(editor, &mut s, true, count)?
                        && s.set_cursor_position(0)?;
                }
                Operation::BackwardDeleteChar => {
                    success = s.backspace()?;
                }
                Operation::ExitOrDeleteChar => {
                    if s.buf.is_empty() {
                        return Err(ReadlineError::Eof);
                    }
                    success = s.delete_current_character()?;
                }
                Operation::DeleteChar => {
                    success = s.delete_current_character()?;
                }
                Operation::BackwardChar => {
                    success = s.move_cursor(-(count as isize))? != 0;
                }
                Operation::ForwardChar => {
                    success = s.move_cursor(count as isize)? != 0;
                }
                Operation::UnixLineDiscard => {
                    success = s.reset_line()?;
                }
                Operation::UnixWordRubout => {
                    success = s.unix_word_rubout(count)?;
                }
                Operation::BackwardKillWord => {
                    success = s.delete_previous_word()?;
                }
                Operation::KillWord => {
                    success = s.delete_next_word()?;
                }
                Operation::BeginningOfHistory => {
                    success = editor.history.move_to_first();
                    if success {
                        let entry = editor.history.current().to_owned();
                        s.set_buffer(&entry)?;
                    }
                }
                Operation::EndOfHistory => {
                    success = editor.history.move_to_last();
                    if success {
                        let entry = editor.history.current().to_owned();
                        s.set_buffer(&entry)?;
                    }
                }
                Operation::ReverseSearchHistory => {
                    search.start(s.buffer_string());
                    search_backup = Some((s.buffer_string(), s.buf.cursor()));
                    state = LoopState::Search;
                    if !search.term.is_empty() {
                        search.index = editor.history.search_backwards(
                            &search.term,
                            editor.history.index(),
                            false,
                        );
                        if search.index.is_none() {
                            s.beep()?;
                        }
                        let entry = search
                            .index
                            .and_then(|idx| editor.history.get(idx))
                            .unwrap_or("")
                            .to_owned();
                        s.print_search_status(&search.term, &entry)?;
                    } else {
                        search.index = None;
                        s.print_search_status("", "")?;
                    }
                }
                Operation::CapitalizeWord => {
                    success = s.capitalize_word()?;
                }
                Operation::UpcaseWord => {
                    success = s.upcase_word()?;
                }
                Operation::DowncaseWord => {
                    success = s.downcase_word()?;
                }
                Operation::EndOfLine => {
                    success = s.move_to_end()?;
                }
                Operation::TabInsert => {
                    s.put_string("\t")?;
                }
                Operation::ReReadInitFile => {
                    editor.keys.reload();
                }
                Operation::StartKbdMacro => {
                    editor.macro_state.recording = true;
                    editor.macro_state.keys.clear();
                }
                Operation::EndKbdMacro => {
                    editor.macro_state.recording = false;
                    // the keys that stopped the recording are not part
                    // of the macro
                    let recorded: Vec<char> = editor.macro_state.keys.chars().collect();
                    let keep = recorded.len().saturating_sub(pending.len());
                    editor.macro_state.keys = recorded[..keep].iter().collect();
                }
                Operation::CallLastKbdMacro => {
                    for mc in editor.macro_state.keys.chars().rev() {
                        pushback.push(mc);
                    }
                }
                Operation::ViEditingMode => {
                    editor.keys.set_active(VI_INSERT);
                }
                Operation::ViMovementMode => {
                    s.move_cursor(-1)?;
                    editor.keys.set_active(VI_MOVE);
                }
                Operation::ViInsertionMode => {
                    editor.keys.set_active(VI_INSERT);
                }
                Operation::ViAppendMode => {
                    s.move_cursor(1)?;
                    editor.keys.set_active(VI_INSERT);
                }
                Operation::ViAppendEol => {
                    success = s.move_to_end()?;
                    editor.keys.set_active(VI_INSERT);
                }
                Operation::ViEofMaybe => {
                    // EOF on an empty line, accept otherwise
                    if s.buf.is_empty() {
                        return Err(ReadlineError::Eof);
                    }
                    if let Some(line) = finish_line(editor, &mut s)? {
                        return Ok(line);
                    }
                }
                Operation::TransposeChars => {
                    success = s.transpose_chars(count)?;
                }
                Operation::InsertComment => {
                    if let Some(line) = insert_comment(editor, &mut s, false)? {
                        return Ok(line);
                    }
                }
                Operation::ViInsertComment => {
                    if let Some(line) = insert_comment(editor, &mut s, true)? {
                        return Ok(line);
                    }
                }
                Operation::ViMatch => {
                    success = s.vi_match()?;
                }
                Operation::ViSearch => {
                    let search_char = pending.first().copied().unwrap_or(c);
                    if let Some(last) = s.vi_search(&editor.history, search_char)? {
                        pushback.push(last);
                    }
                }
                Operation::ViArgDigit => {
                    if let Some(digit) = pending.first().and_then(|d| d.to_digit(10)) {
                        repeat_count = repeat_count * 10 + digit as usize;
                        is_arg_digit = true;
                    }
                }
                Operation::ViBeginningOfLineOrArgDigit => {
                    // `0` is a digit only when an argument is underway
                    if repeat_count > 0 {
                        repeat_count *= 10;
                        is_arg_digit = true;
                    } else {
                        success = s.set_cursor_position(0)?;
                    }
                }
                Operation::ViPrevWord => {
                    success = s.vi_previous_word(count)?;
                }
                Operation::ViNextWord => {
                    success = s.vi_next_word(count)?;
                }
                Operation::ViEndWord => {
                    success = s.vi_end_word(count)?;
                }
                Operation::ViInsertBeg => {
                    success = s.set_cursor_position(0)?;
                    editor.keys.set_active(VI_INSERT);
                }
                Operation::ViRubout => {
                    success = s.vi_rubout(count)?;
                }
                Operation::ViDelete => {
                    success = s.vi_delete(count)?;
                }
                Operation::ViChangeCase => {
                    success = s.vi_change_case(count)?;
                }
                Operation::EmacsEditingMode => {
                    editor.keys.set_active(EMACS);
                }
                Operation::Interrupt => {
                    return Err(ReadlineError::Interrupted);
                }
                _ => {}
            }

            if !is_arg_digit {
                repeat_count = 0;
            }
        }

        if !success {
            s.beep()?;
        }
        pending.clear();
        s.flush()?;
    }
}

/// Expand event designators, emit the final newline and commit the line
/// to the history. `None` when expansion failed and editing resumes.
fn finish_line<H: History>(editor: &mut Editor<H>, s: &mut State<'_>) -> Result<Option<String>> {
    let line = s.buffer_string();
    let mut result = line.clone();
    let mut history_line = line.clone();

    if editor.config.expand_events() {
        match expand::expand_events(&line, &editor.history) {
            Ok(expanded) => {
                history_line = expanded.replace('!', "\\!");
                s.accept()?;
                if expanded != line {
                    s.print_str(&expanded)?;
                    s.println()?;
                    s.flush()?;
                }
                result = expanded;
            }
            Err(message) => {
                s.println()?;
                s.print_str(&message)?;
                s.println()?;
                s.redraw_line()?;
                s.flush()?;
                return Ok(None);
            }
        }
    } else {
        s.accept()?;
    }

    if !result.is_empty() && s.mask().is_none() && editor.history_enabled {
        editor.history.add(&history_line);
    }
    editor.history.move_to_end();
    Ok(Some(result))
}

/// Prepend the comment prefix and accept the line.
fn insert_comment<H: History>(
    editor: &mut Editor<H>,
    s: &mut State<'_>,
    vi_mode: bool,
) -> Result<Option<String>> {
    let comment = editor.comment_begin();
    s.set_cursor_position(0)?;
    s.put_string(&comment)?;
    if vi_mode {
        editor.keys.set_active(VI_INSERT);
    }
    finish_line(editor, s)
}

/// Replace the buffer with the previous or next history entry.
fn move_history<H: History>(editor: &mut Editor<H>, s: &mut State<'_>, next: bool) -> Result<bool> {
    let moved = if next {
        editor.history.next()
    } else {
        editor.history.previous()
    };
    if !moved {
        return Ok(false);
    }
    let entry = editor.history.current().to_owned();
    s.set_buffer(&entry)?;
    Ok(true)
}

fn move_history_count<H: History>(
    editor: &mut Editor<H>,
    s: &mut State<'_>,
    next: bool,
    count: usize,
) -> Result<bool> {
    for _ in 0..count {
        if !move_history(editor, s, next)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Ask the completers in order and hand the candidates to the handler.
fn complete<H: History>(editor: &mut Editor<H>, s: &mut State<'_>) -> Result<bool> {
    if editor.completers.is_empty() {
        return Ok(false);
    }
    let line = s.buffer_string();
    let cursor = s.buf.cursor();
    let mut candidates = Vec::new();
    let mut position = None;
    for completer in &editor.completers {
        if let Some(pos) = completer.complete(&line, cursor, &mut candidates) {
            position = Some(pos);
            break;
        }
    }
    match position {
        Some(position) if !candidates.is_empty() => {
            editor.completion_handler.complete(s, &candidates, position)
        }
        _ => Ok(false),
    }
}

/// List the candidates without installing anything, then redraw.
fn print_completion_candidates<H: History>(
    editor: &mut Editor<H>,
    s: &mut State<'_>,
) -> Result<()> {
    if editor.completers.is_empty() {
        return Ok(());
    }
    let line = s.buffer_string();
    let cursor = s.buf.cursor();
    let mut candidates = Vec::new();
    for completer in &editor.completers {
        if completer.complete(&line, cursor, &mut candidates).is_some() {
            break;
        }
    }
    print_candidates(s, &candidates)?;
    s.draw_line()
}

#[cfg(test)]
mod test;
