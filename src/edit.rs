//! Command processor: reconciles the line buffer with the terminal
use std::borrow::Cow;

use log::trace;
use memchr::memchr;

use crate::config::Config;
use crate::consts::{echoed_columns, BACKSPACE, ESC, RESET_LINE, TAB_WIDTH};
use crate::history::History;
use crate::line_buffer::LineBuffer;
use crate::tty::{read_position_report, RawReader, Renderer};
use crate::Result;

/// Per-line editing state: the buffer being edited, the prompt and the
/// input/output handles. Constructed on `readline` entry and discarded
/// on exit.
///
/// Every mutation keeps the terminal's visual cursor in sync with
/// `buf.cursor()`: the visual column is the displayed prompt width plus
/// the buffer cursor, modulo the terminal width.
pub struct State<'a> {
    pub rdr: &'a mut dyn RawReader,
    pub out: &'a mut dyn Renderer,
    pub buf: LineBuffer,
    pub config: Config,
    prompt: String,
    mask: Option<char>,
}

fn is_delimiter(c: Option<char>) -> bool {
    // anything that is not a letter or digit; the probe beyond the
    // buffer edge counts as a delimiter
    c.map_or(true, |c| !c.is_alphanumeric())
}

fn is_whitespace(c: Option<char>) -> bool {
    c.map_or(false, char::is_whitespace)
}

/// The text after the last `'\n'` of the prompt: the only part that
/// counts toward the cursor column.
fn last_line(s: &str) -> &str {
    match s.rfind('\n') {
        Some(i) => &s[i + 1..],
        None => s,
    }
}

/// Drop ANSI escape sequences so prompt widths count visible columns
/// only.
fn strip_ansi(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if memchr(0x1b, bytes).is_none() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != ESC {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                // parameters and intermediates end at a final byte @..~
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }
    Cow::Owned(out)
}

fn upper(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

fn lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Nearest entry below `bound` containing `term`; entry 0 is never
/// scanned.
fn backward_containing(history: &dyn History, term: &str, bound: usize) -> Option<usize> {
    let mut i = bound.min(history.size());
    while i > 1 {
        i -= 1;
        if history.get(i).map_or(false, |e| e.contains(term)) {
            return Some(i);
        }
    }
    None
}

/// Bracket class for `vi-match`: 1 square, 2 curly, 3 paren; negative
/// for the closing form, 0 for anything else.
fn bracket_type(ch: char) -> i32 {
    match ch {
        '[' => 1,
        ']' => -1,
        '{' => 2,
        '}' => -2,
        '(' => 3,
        ')' => -3,
        _ => 0,
    }
}

impl<'a> State<'a> {
    pub fn new(
        rdr: &'a mut dyn RawReader,
        out: &'a mut dyn Renderer,
        config: Config,
        prompt: &str,
        mask: Option<char>,
    ) -> State<'a> {
        State {
            rdr,
            out,
            buf: LineBuffer::new(),
            config,
            prompt: prompt.to_owned(),
            mask,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_owned();
    }

    pub fn mask(&self) -> Option<char> {
        self.mask
    }

    pub fn buffer_string(&self) -> String {
        self.buf.as_string()
    }

    //
    // Printing
    //

    /// Output `s` without touching the buffer. Tabs print as spaces.
    pub fn print_str(&mut self, s: &str) -> Result<()> {
        if s.contains('\t') {
            let expanded: String = s
                .chars()
                .flat_map(|c| {
                    let (c, n) = if c == '\t' { (' ', TAB_WIDTH) } else { (c, 1) };
                    std::iter::repeat(c).take(n)
                })
                .collect();
            self.out.write_str(&expanded)
        } else {
            self.out.write_str(s)
        }
    }

    fn print_char_n(&mut self, c: char, num: usize) -> Result<()> {
        if c == '\t' {
            return self.out.write_char_n(' ', num * TAB_WIDTH);
        }
        self.out.write_char_n(c, num)
    }

    pub fn println(&mut self) -> Result<()> {
        self.print_str("\n")
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }

    pub fn beep(&mut self) -> Result<()> {
        self.out.beep()
    }

    //
    // Cursor accounting
    //

    /// Width of the last prompt line as displayed.
    fn prompt_width(&self) -> usize {
        strip_ansi(last_line(&self.prompt)).chars().count()
    }

    /// Absolute column of the logical cursor: prompt width plus buffer
    /// cursor.
    pub fn cursor_position(&self) -> usize {
        self.prompt_width() + self.buf.cursor()
    }

    /// Row reported by the terminal, when it answers the `CSI 6n`
    /// query. `None` means unknown; callers carry on without it.
    fn current_ansi_row(&mut self) -> Result<Option<usize>> {
        if !self.out.is_ansi_supported() {
            return Ok(None);
        }
        self.out.csi("6n")?;
        self.out.flush()?;
        Ok(read_position_report(&mut *self.rdr)?.map(|(row, _)| row))
    }

    //
    // Drawing
    //

    /// Output the prompt and the whole buffer, leaving the visual
    /// cursor on the buffer cursor.
    pub fn draw_line(&mut self) -> Result<()> {
        let prompt = self.prompt.clone();
        self.print_str(&prompt)?;
        let text = self.display_text(0);
        self.print_str(&text)?;
        if self.buf.len() != self.buf.cursor() {
            self.back(self.buf.len() - self.buf.cursor() - 1)?;
        }
        // force the tail redraw to re-check for weird wrap
        self.draw_buffer(0)
    }

    /// Carriage-return and redraw the whole line.
    pub fn redraw_line(&mut self) -> Result<()> {
        self.print_char_n(RESET_LINE, 1)?;
        self.draw_line()
    }

    /// The buffer tail from char index `from`, with the echo mask
    /// applied. An empty string under the null mask.
    fn display_text(&self, from: usize) -> String {
        match self.mask {
            Some('\0') => String::new(),
            Some(mask) => std::iter::repeat(mask)
                .take(self.buf.len().saturating_sub(from))
                .collect(),
            None => self.buf.string_from(from),
        }
    }

    /// Redraw the buffer from the cursor onwards and erase `clear`
    /// columns past the end, returning the visual cursor to the logical
    /// one.
    fn draw_buffer(&mut self, clear: usize) -> Result<()> {
        if self.buf.cursor() != self.buf.len() || clear != 0 {
            let chars: Vec<char> = self.display_text(self.buf.cursor()).chars().collect();
            if self.out.has_weird_wrap() {
                let width = self.out.width();
                let pos = self.cursor_position();
                for (i, &c) in chars.iter().enumerate() {
                    self.print_char_n(c, 1)?;
                    if (pos + i + 1) % width == 0 {
                        // force the wrap with a dummy space and return
                        self.print_str(" \r")?;
                    }
                }
            } else {
                let text: String = chars.iter().collect();
                self.print_str(&text)?;
            }
            self.clear_ahead(clear, chars.len())?;
            self.back(chars.len())?;
        }
        if self.out.has_weird_wrap() {
            let width = self.out.width();
            let pos = self.cursor_position();
            if pos > 0
                && pos % width == 0
                && self.buf.cursor() == self.buf.len()
                && clear == 0
            {
                self.print_str(" \r")?;
            }
        }
        Ok(())
    }

    /// Erase `num` columns ahead of the cursor without moving it.
    /// `delta` is how far the screen cursor sits past the logical one.
    fn clear_ahead(&mut self, num: usize, delta: usize) -> Result<()> {
        if num == 0 {
            return Ok(());
        }
        if self.out.is_ansi_supported() {
            let width = self.out.width();
            let screen_cursor = self.cursor_position() + delta;
            // clear to the end of the current line
            self.out.csi("K")?;
            // when cursor+num wraps, the lines below need clearing too
            let cur_col = screen_cursor % width;
            let end_col = (screen_cursor + num - 1) % width;
            let mut lines = num / width;
            if end_col < cur_col {
                lines += 1;
            }
            for _ in 0..lines {
                self.out.csi("B")?;
                self.out.csi("2K")?;
            }
            for _ in 0..lines {
                self.out.csi("A")?;
            }
            return Ok(());
        }
        // dumb terminal: blank the columns, then back up over them
        self.print_char_n(' ', num)?;
        self.back(num)
    }

    /// Move the visual cursor back onto the logical one, `num` columns
    /// to the left of where the screen cursor currently sits.
    fn back(&mut self, num: usize) -> Result<()> {
        if num == 0 {
            return Ok(());
        }
        if self.out.is_ansi_supported() {
            let width = self.out.width();
            let cursor = self.cursor_position();
            let real_cursor = cursor + num;
            let real_col = real_cursor % width;
            let new_col = cursor % width;
            let mut move_up = num / width;
            if real_col < new_col {
                move_up += 1;
            }
            if move_up > 0 {
                self.out.csi(&format!("{}A", move_up))?;
            }
            self.out.csi(&format!("{}G", 1 + new_col))?;
            return Ok(());
        }
        self.print_char_n(BACKSPACE, num)
    }

    //
    // Buffer mutation
    //

    /// Write `text` into the buffer at the cursor and echo it (through
    /// the mask, when one is set).
    pub fn put_string(&mut self, text: &str) -> Result<()> {
        self.buf.write(text);
        match self.mask {
            None => self.print_str(text)?,
            Some('\0') => {}
            Some(mask) => self.print_char_n(mask, text.chars().count())?,
        }
        self.draw_buffer(0)
    }

    /// Move the cursor `num` chars (negative is left), clamped to the
    /// buffer. Returns how far it moved.
    pub fn move_cursor(&mut self, num: isize) -> Result<isize> {
        let cursor = self.buf.cursor() as isize;
        let len = self.buf.len() as isize;
        let mut step = num;
        if cursor == 0 && step <= 0 {
            return Ok(0);
        }
        if cursor == len && step >= 0 {
            return Ok(0);
        }
        if cursor + step < 0 {
            step = -cursor;
        } else if cursor + step > len {
            step = len - cursor;
        }
        self.move_internal(step)?;
        Ok(step)
    }

    /// Move the cursor `step` chars without bounds checking.
    fn move_internal(&mut self, step: isize) -> Result<()> {
        let old_cursor = self.buf.cursor();
        self.buf
            .set_cursor((old_cursor as isize + step) as usize);

        if self.out.is_ansi_supported() {
            if step < 0 {
                return self.back(-step as usize);
            }
            let width = self.out.width();
            let cursor = self.cursor_position();
            let old_line = (cursor - step as usize) / width;
            let new_line = cursor / width;
            if new_line > old_line {
                if self.out.has_weird_wrap() {
                    // scroll up when already on the bottom row
                    let height = self.out.height();
                    if self.current_ansi_row()? == Some(height) {
                        self.out.csi(&format!("{}S", new_line - old_line))?;
                    }
                }
                self.out.csi(&format!("{}B", new_line - old_line))?;
            }
            self.out.csi(&format!("{}G", 1 + cursor % width))?;
            return Ok(());
        }

        if step < 0 {
            // tabs occupy TAB_WIDTH columns on the way back
            let from = self.buf.cursor();
            let to = (self.buf.cursor() as isize - step) as usize;
            let mut len = 0;
            for i in from..to {
                len += match self.buf.char_at(i) {
                    Some('\t') => TAB_WIDTH,
                    _ => 1,
                };
            }
            return self.print_char_n(BACKSPACE, len);
        }
        if old_cursor == 0 {
            return Ok(());
        }
        match self.mask {
            None => {
                let text: String = (old_cursor..self.buf.cursor())
                    .filter_map(|i| self.buf.char_at(i))
                    .collect();
                self.print_str(&text)
            }
            Some('\0') => Ok(()),
            Some(mask) => self.print_char_n(mask, step as usize),
        }
    }

    /// Move the cursor to the absolute position `pos`.
    pub fn set_cursor_position(&mut self, pos: usize) -> Result<bool> {
        let delta = pos as isize - self.buf.cursor() as isize;
        Ok(self.move_cursor(delta)? != 0)
    }

    pub fn move_to_end(&mut self) -> Result<bool> {
        let delta = self.buf.len() as isize - self.buf.cursor() as isize;
        Ok(self.move_cursor(delta)? > 0)
    }

    /// Delete `num` chars before the cursor. Returns how many went.
    pub fn backspace_n(&mut self, num: usize) -> Result<usize> {
        if self.buf.cursor() == 0 {
            return Ok(0);
        }
        let width = self.out.width();
        let lines = self.cursor_position() / width;
        let count = (-self.move_cursor(-(num.min(self.buf.len()) as isize))?) as usize;
        let cursor = self.buf.cursor();
        self.buf.delete_range(cursor, cursor + count);
        if self.cursor_position() / width != lines && self.out.is_ansi_supported() {
            self.out.csi("K")?;
        }
        self.draw_buffer(count)?;
        Ok(count)
    }

    /// Delete the char before the cursor.
    pub fn backspace(&mut self) -> Result<bool> {
        Ok(self.backspace_n(1)? == 1)
    }

    fn backspace_all(&mut self) -> Result<()> {
        let num = self.buf.cursor();
        self.backspace_n(num)?;
        Ok(())
    }

    /// Delete the char under the cursor and pull the tail in.
    pub fn delete_current_character(&mut self) -> Result<bool> {
        if self.buf.is_empty() || self.buf.cursor() == self.buf.len() {
            return Ok(false);
        }
        let cursor = self.buf.cursor();
        self.buf.delete_at(cursor);
        self.draw_buffer(1)?;
        Ok(true)
    }

    /// Delete one char under the cursor (the repeat count of the
    /// delete-char command is deliberately not honored).
    fn delete_one(&mut self) -> Result<bool> {
        self.delete_current_character()
    }

    /// Kill from the cursor to the end of the line.
    pub fn kill_line(&mut self) -> Result<bool> {
        let cursor = self.buf.cursor();
        let len = self.buf.len();
        if cursor >= len {
            return Ok(false);
        }
        self.clear_ahead(len - cursor, 0)?;
        self.buf.truncate(cursor);
        Ok(true)
    }

    /// Erase from the cursor back to the start of the line.
    pub fn reset_line(&mut self) -> Result<bool> {
        if self.buf.cursor() == 0 {
            return Ok(false);
        }
        self.backspace_all()?;
        Ok(true)
    }

    /// ANSI clear screen, then redraw the line at the top.
    pub fn clear_screen(&mut self) -> Result<bool> {
        if !self.out.is_ansi_supported() {
            return Ok(false);
        }
        self.out.csi("2J")?;
        self.out.csi("1;1H")?;
        self.redraw_line()?;
        Ok(true)
    }

    /// Replace the buffer (and the display) with `buffer`, patching
    /// only from the first difference onward. Assumes prefix-compatible
    /// edits; a shorter replacement relies on the kill-line to clear
    /// the tail.
    pub fn set_buffer(&mut self, buffer: &str) -> Result<()> {
        let new: Vec<char> = buffer.chars().collect();
        let mut same = 0;
        while same < new.len()
            && same < self.buf.len()
            && self.buf.char_at(same) == Some(new[same])
        {
            same += 1;
        }
        if same == new.len() && self.buf.len() == new.len() {
            return Ok(());
        }
        let mut diff = self.buf.cursor() as isize - same as isize;
        if diff < 0 {
            // can't backspace from here, go through the end of the buffer
            self.move_to_end()?;
            diff = self.buf.len() as isize - same as isize;
        }
        self.backspace_n(diff as usize)?;
        self.kill_line()?;
        self.buf.truncate(same);
        let tail: String = new[same.min(new.len())..].iter().collect();
        self.put_string(&tail)
    }

    //
    // Word and case commands
    //

    pub fn previous_word(&mut self) -> Result<bool> {
        while is_delimiter(self.buf.char_before_cursor()) && self.move_cursor(-1)? != 0 {}
        while !is_delimiter(self.buf.char_before_cursor()) && self.move_cursor(-1)? != 0 {}
        Ok(true)
    }

    pub fn next_word(&mut self) -> Result<bool> {
        while is_delimiter(self.buf.char_at_cursor()) && self.move_cursor(1)? != 0 {}
        while !is_delimiter(self.buf.char_at_cursor()) && self.move_cursor(1)? != 0 {}
        Ok(true)
    }

    pub fn delete_previous_word(&mut self) -> Result<bool> {
        while is_delimiter(self.buf.char_before_cursor()) && self.backspace()? {}
        while !is_delimiter(self.buf.char_before_cursor()) && self.backspace()? {}
        Ok(true)
    }

    pub fn delete_next_word(&mut self) -> Result<bool> {
        while is_delimiter(self.buf.char_at_cursor()) && self.delete_one()? {}
        while !is_delimiter(self.buf.char_at_cursor()) && self.delete_one()? {}
        Ok(true)
    }

    /// Delete back over a whitespace run, then over one word.
    pub fn unix_word_rubout(&mut self, count: usize) -> Result<bool> {
        for _ in 0..count {
            if self.buf.cursor() == 0 {
                return Ok(false);
            }
            while is_whitespace(self.buf.char_before_cursor()) && self.backspace()? {}
            while self.buf.cursor() > 0
                && !is_whitespace(self.buf.char_before_cursor())
                && self.backspace()?
            {}
        }
        Ok(true)
    }

    pub fn capitalize_word(&mut self) -> Result<bool> {
        let mut first = true;
        let mut i = 1;
        while self.buf.cursor() + i - 1 < self.buf.len()
            && !is_delimiter(self.buf.char_at(self.buf.cursor() + i - 1))
        {
            let at = self.buf.cursor() + i - 1;
            let c = self.buf.char_at(at).unwrap_or('\0');
            self.buf
                .set_char_at(at, if first { upper(c) } else { lower(c) });
            first = false;
            i += 1;
        }
        self.draw_buffer(0)?;
        self.move_cursor(i as isize - 1)?;
        Ok(true)
    }

    pub fn upcase_word(&mut self) -> Result<bool> {
        self.case_word(upper)
    }

    pub fn downcase_word(&mut self) -> Result<bool> {
        self.case_word(lower)
    }

    fn case_word(&mut self, convert: fn(char) -> char) -> Result<bool> {
        let mut i = 1;
        while self.buf.cursor() + i - 1 < self.buf.len()
            && !is_delimiter(self.buf.char_at(self.buf.cursor() + i - 1))
        {
            let at = self.buf.cursor() + i - 1;
            let c = self.buf.char_at(at).unwrap_or('\0');
            self.buf.set_char_at(at, convert(c));
            i += 1;
        }
        self.draw_buffer(0)?;
        self.move_cursor(i as isize - 1)?;
        Ok(true)
    }

    /// Swap the two chars straddling the cursor and advance one; at the
    /// end of the line the two preceding chars swap and the cursor
    /// stays put.
    pub fn transpose_chars(&mut self, count: usize) -> Result<bool> {
        for _ in 0..count {
            let cursor = self.buf.cursor();
            if cursor == 0 || self.buf.len() < 2 {
                return Ok(false);
            }
            let at_end = cursor == self.buf.len();
            let second = if at_end { cursor - 1 } else { cursor };
            let first = second - 1;
            let a = self.buf.char_at(first).unwrap_or('\0');
            let b = self.buf.char_at(second).unwrap_or('\0');
            self.buf.set_char_at(first, b);
            self.buf.set_char_at(second, a);
            if at_end {
                self.move_internal(-2)?;
                self.draw_buffer(0)?;
                self.move_internal(2)?;
            } else {
                self.move_internal(-1)?;
                self.draw_buffer(0)?;
                self.move_internal(2)?;
            }
        }
        Ok(true)
    }

    //
    // Vi commands
    //

    pub fn vi_rubout(&mut self, count: usize) -> Result<bool> {
        for _ in 0..count {
            if !self.backspace()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn vi_delete(&mut self, count: usize) -> Result<bool> {
        for _ in 0..count {
            if !self.delete_current_character()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Toggle the case under the cursor and advance, `count` times.
    pub fn vi_change_case(&mut self, count: usize) -> Result<bool> {
        for _ in 0..count {
            match self.buf.char_at_cursor() {
                Some(ch) => {
                    let flipped = if ch.is_uppercase() {
                        lower(ch)
                    } else if ch.is_lowercase() {
                        upper(ch)
                    } else {
                        ch
                    };
                    let cursor = self.buf.cursor();
                    self.buf.set_char_at(cursor, flipped);
                    self.draw_buffer(1)?;
                    self.move_cursor(1)?;
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Vi word motion: back over whitespace, then to the start of the
    /// word.
    pub fn vi_previous_word(&mut self, count: usize) -> Result<bool> {
        if self.buf.cursor() == 0 {
            return Ok(false);
        }
        let mut pos = self.buf.cursor() - 1;
        let mut i = 0;
        while pos > 0 && i < count {
            while pos > 0 && is_whitespace(self.buf.char_at(pos)) {
                pos -= 1;
            }
            while pos > 0 && !is_delimiter(self.buf.char_at(pos - 1)) {
                pos -= 1;
            }
            if pos > 0 && i < count - 1 {
                pos -= 1;
            }
            i += 1;
        }
        self.set_cursor_position(pos)?;
        Ok(true)
    }

    pub fn vi_next_word(&mut self, count: usize) -> Result<bool> {
        let end = self.buf.len();
        let mut pos = self.buf.cursor();
        let mut i = 0;
        while pos < end && i < count {
            while pos < end && !is_delimiter(self.buf.char_at(pos)) {
                pos += 1;
            }
            while pos < end && is_delimiter(self.buf.char_at(pos)) {
                pos += 1;
            }
            i += 1;
        }
        self.set_cursor_position(pos)?;
        Ok(true)
    }

    /// Vi end-of-word: from inside a word to its last character, from
    /// the last character (or whitespace) to the end of the next word.
    pub fn vi_end_word(&mut self, count: usize) -> Result<bool> {
        let end = self.buf.len();
        let mut pos = self.buf.cursor();
        let mut i = 0;
        while pos < end && i < count {
            if pos < end.saturating_sub(1)
                && !is_delimiter(self.buf.char_at(pos))
                && is_delimiter(self.buf.char_at(pos + 1))
            {
                pos += 1;
            }
            while pos < end && is_delimiter(self.buf.char_at(pos)) {
                pos += 1;
            }
            while pos < end.saturating_sub(1) && !is_delimiter(self.buf.char_at(pos + 1)) {
                pos += 1;
            }
            i += 1;
        }
        self.set_cursor_position(pos)?;
        Ok(true)
    }

    /// Jump to the bracket matching the one under the cursor.
    pub fn vi_match(&mut self) -> Result<bool> {
        let mut pos = self.buf.cursor() as isize;
        if pos == self.buf.len() as isize {
            return Ok(false);
        }
        let kind = bracket_type(self.buf.char_at(pos as usize).unwrap_or('\0'));
        if kind == 0 {
            return Ok(false);
        }
        let step: isize = if kind < 0 { -1 } else { 1 };
        let mut depth = 1;
        while depth > 0 {
            pos += step;
            if pos < 0 || pos >= self.buf.len() as isize {
                return Ok(false);
            }
            let cur = bracket_type(self.buf.char_at(pos as usize).unwrap_or('\0'));
            if cur == kind {
                depth += 1;
            } else if cur == -kind {
                depth -= 1;
            }
        }
        self.set_cursor_position(pos as usize)?;
        Ok(true)
    }

    /// The `/` and `?` search sub-loop: read a term on a cleared line,
    /// search the history, then let `n`/`N` walk the matches. Returns
    /// the key that ended the post-loop, to be replayed by the caller.
    pub fn vi_search(
        &mut self,
        history: &dyn History,
        search_char: char,
    ) -> Result<Option<char>> {
        let is_forward = search_char == '/';
        let orig = self.buf.clone();

        self.set_cursor_position(0)?;
        self.kill_line()?;
        self.put_string(&search_char.to_string())?;
        self.flush()?;

        let mut aborted = false;
        let mut complete = false;
        let mut ch = self.read_character()?;
        while !aborted && !complete {
            match ch {
                None => break,
                Some(ESC) => aborted = true,
                Some('\x08') | Some('\x7f') => {
                    self.backspace()?;
                    // backspacing through the prompt aborts the search
                    if self.buf.cursor() == 0 {
                        aborted = true;
                    }
                }
                Some('\n') | Some('\r') => complete = true,
                Some(c) => self.put_string(&c.to_string())?,
            }
            self.flush()?;
            if !aborted && !complete {
                ch = self.read_character()?;
            }
        }

        if ch.is_none() || aborted {
            self.set_cursor_position(0)?;
            self.kill_line()?;
            self.put_string(&orig.as_string())?;
            self.set_cursor_position(orig.cursor())?;
            return Ok(None);
        }

        // the first char of the buffer is the search char itself
        let term = self.buf.string_from(1);
        let found = if is_forward {
            history.search_forwards(&term, 0)
        } else {
            backward_containing(history, &term, history.size())
        };

        let mut idx = match found {
            Some(idx) => idx,
            None => {
                self.set_cursor_position(0)?;
                self.kill_line()?;
                self.put_string(&orig.as_string())?;
                self.set_cursor_position(0)?;
                return Ok(None);
            }
        };

        self.show_search_entry(history.get(idx).unwrap_or(""))?;
        self.flush()?;

        // only n/N move within the matches; any other key goes back to
        // the main loop for interpretation
        loop {
            match self.read_character()? {
                Some('n') | Some('N') => {
                    let next = if is_forward {
                        history.search_forwards(&term, idx + 1)
                    } else {
                        backward_containing(history, &term, idx)
                    };
                    if let Some(next) = next {
                        idx = next;
                        let entry = history.get(idx).unwrap_or("").to_owned();
                        self.show_search_entry(&entry)?;
                    }
                    self.flush()?;
                }
                other => return Ok(other),
            }
        }
    }

    fn show_search_entry(&mut self, entry: &str) -> Result<()> {
        self.set_cursor_position(0)?;
        self.kill_line()?;
        self.put_string(entry)?;
        self.set_cursor_position(0)?;
        Ok(())
    }

    //
    // Input
    //

    /// Read the next code point, erasing any terminal echo.
    pub fn read_character(&mut self) -> Result<Option<char>> {
        let c = self.rdr.next_char()?;
        if let Some(c) = c {
            self.clear_echo(c)?;
        }
        Ok(c)
    }

    /// Keep reading until one of `allowed` shows up.
    pub fn read_character_allowed(&mut self, allowed: &[char]) -> Result<Option<char>> {
        loop {
            match self.read_character()? {
                None => return Ok(None),
                Some(c) if allowed.contains(&c) => return Ok(Some(c)),
                Some(_) => {}
            }
        }
    }

    /// Erase the columns the terminal echoed for `c`, when it echoes.
    fn clear_echo(&mut self, c: char) -> Result<usize> {
        if !self.out.is_echo_enabled() {
            return Ok(0);
        }
        let num = echoed_columns(c, self.cursor_position());
        self.back(num)?;
        self.draw_buffer(num)?;
        Ok(num)
    }

    //
    // Prompt swapping (incremental search)
    //

    /// Erase the current line with its prompt, then redraw with the
    /// given prompt and buffer, parking the cursor at `cursor_dest`
    /// (end of line when `None`).
    pub fn reset_prompt_line(
        &mut self,
        prompt: &str,
        buffer: &str,
        cursor_dest: Option<usize>,
    ) -> Result<()> {
        self.move_to_end()?;

        // backspace over everything, prompt included, by temporarily
        // treating the prompt as buffer content
        let old_prompt = std::mem::take(&mut self.prompt);
        self.buf.write(&old_prompt);
        self.backspace_all()?;

        self.prompt = prompt.to_owned();
        self.redraw_line()?;
        self.set_buffer(buffer)?;

        let dest = cursor_dest.unwrap_or_else(|| buffer.chars().count());
        self.set_cursor_position(dest)?;
        self.flush()
    }

    /// Show the incremental search status line.
    pub fn print_search_status(&mut self, term: &str, matched: &str) -> Result<()> {
        let prompt = format!("(reverse-i-search)`{}': ", term);
        let cursor_dest = matched
            .find(term)
            .map(|byte| matched[..byte].chars().count());
        self.reset_prompt_line(&prompt, matched, cursor_dest)
    }

    /// Swap the search status line back for the real prompt.
    pub fn restore_line(&mut self, original_prompt: &str, cursor_dest: Option<usize>) -> Result<()> {
        let prompt = last_line(original_prompt).to_owned();
        let buffer = self.buffer_string();
        self.reset_prompt_line(&prompt, &buffer, cursor_dest)
    }

    //
    // Accepting
    //

    /// Park the cursor at the end and emit the final newline.
    pub fn accept(&mut self) -> Result<()> {
        self.move_to_end()?;
        self.println()?;
        self.flush()
    }

    //
    // Candidate columns
    //

    /// Print `items` in columns sized to the widest item, paging when
    /// enabled and the listing is taller than the screen.
    pub fn print_columns(&mut self, items: &[&str]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        const MORE: &str = "--More--";
        let width = self.out.width();
        let height = self.out.height();
        let max_width = items.iter().map(|i| i.chars().count()).max().unwrap_or(0) + 3;
        trace!(target: "termline", "candidate column width: {}", max_width);

        let mut show_lines = if self.config.pagination() {
            height.saturating_sub(1)
        } else {
            usize::MAX
        };

        let mut buff = String::new();
        for item in items {
            if buff.chars().count() + max_width > width {
                self.print_str(&buff)?;
                self.println()?;
                buff.clear();

                show_lines = show_lines.saturating_sub(1);
                if show_lines == 0 {
                    // overflow: ask before going on
                    self.print_str(MORE)?;
                    self.flush()?;
                    let c = self.read_character()?;
                    match c {
                        Some('\r') | Some('\n') => show_lines = 1,
                        Some(c) if c != 'q' => show_lines = height.saturating_sub(1),
                        _ => {}
                    }
                    self.back(MORE.len())?;
                    if c.is_none() || c == Some('q') {
                        break;
                    }
                }
            }
            buff.push_str(item);
            for _ in item.chars().count()..max_width {
                buff.push(' ');
            }
        }
        if !buff.is_empty() {
            self.print_str(&buff)?;
            self.println()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub fn init_state<'a>(
    rdr: &'a mut dyn RawReader,
    out: &'a mut dyn Renderer,
    line: &str,
    pos: usize,
) -> State<'a> {
    let mut state = State::new(rdr, out, Config::default(), "", None);
    state.buf = LineBuffer::init(line, pos);
    state
}
