//! Key constants and echo accounting

/// Escape, starts multi-key sequences and the vi mode switch.
pub const ESC: char = '\x1b';
/// ASCII delete, sent by most terminals for the backspace key.
pub const DELETE: char = '\x7f';
/// Audible bell.
pub const KEYBOARD_BELL: char = '\x07';
/// Backspace control character.
pub const BACKSPACE: char = '\x08';
/// Carriage return, resets the cursor to column 0 on a raw terminal.
pub const RESET_LINE: char = '\r';

/// Width used when a tab is printed inside the edited line.
pub const TAB_WIDTH: usize = 4;
/// Terminals echo tabs to the next multiple-of-8 column.
pub const TAB_STOP: usize = 8;

/// Control character for an ASCII letter: `ctrl('A')` == `'\x01'`.
pub const fn ctrl(c: char) -> char {
    ((c as u8) & 0x1f) as char
}

/// The printable (caret notation) form of a character: `^X` for control
/// characters, `M-x` for high-bit characters, `^?` for delete.
///
/// Adapted from cat by Torbjorn Granlund, as repeated in stty by David
/// MacKenzie.
pub fn printable_characters(ch: u32) -> String {
    let mut s = String::new();
    if ch >= 32 {
        if ch < 127 {
            s.push(char_from(ch));
        } else if ch == 127 {
            s.push_str("^?");
        } else {
            s.push_str("M-");
            if ch >= 128 + 32 {
                if ch < 128 + 127 {
                    s.push(char_from(ch - 128));
                } else {
                    s.push_str("^?");
                }
            } else {
                s.push('^');
                s.push(char_from(ch - 128 + 64));
            }
        }
    } else {
        s.push('^');
        s.push(char_from(ch + 64));
    }
    s
}

/// Number of columns the terminal used to echo `ch` when the cursor sat
/// at absolute column `position`. Tabs echo up to the next tab stop.
pub fn echoed_columns(ch: char, position: usize) -> usize {
    if ch == '\t' {
        return TAB_STOP - (position % TAB_STOP);
    }
    printable_characters(ch as u32).chars().count()
}

fn char_from(u: u32) -> char {
    // only reachable for values already reduced to the ASCII range
    std::char::from_u32(u).unwrap_or('?')
}
