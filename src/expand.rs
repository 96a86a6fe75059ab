//! History event designators: `!!`, `!n`, `!-n`, `!?str?`, `!str`,
//! `!#` and `^old^new` substitution.
//! See <http://www.gnu.org/software/bash/manual/html_node/Event-Designators.html>

use crate::history::History;

/// Expand the event designators in `line` against `history`.
///
/// Returns the expanded line, or the `"…: event not found"` message when
/// a designator refers to a missing entry. A line without designators
/// comes back unchanged.
pub fn expand_events<H: History + ?Sized>(line: &str, history: &H) -> Result<String, String> {
    let chars: Vec<char> = line.chars().collect();
    let mut sb = String::new();
    let mut escaped = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if escaped {
            sb.push(c);
            escaped = false;
            i += 1;
            continue;
        }
        if c == '\\' {
            escaped = true;
            i += 1;
            continue;
        }
        match c {
            '!' if i + 1 < chars.len() => {
                i += 1;
                let c = chars[i];
                let mut rep: Option<String> = None;
                match c {
                    '!' => {
                        rep = history
                            .index()
                            .checked_sub(1)
                            .and_then(|prev| history.get(prev))
                            .map(str::to_owned);
                        if rep.is_none() {
                            return Err("!!: event not found".to_owned());
                        }
                    }
                    '#' => {
                        let so_far = sb.clone();
                        sb.push_str(&so_far);
                    }
                    '?' => {
                        let close = chars[i + 1..]
                            .iter()
                            .position(|&c| c == '?')
                            .map(|p| p + i + 1)
                            .unwrap_or(chars.len());
                        let term: String = chars[i + 1..close].iter().collect();
                        i = close;
                        match history.search_backwards(&term, history.index(), false) {
                            Some(idx) => rep = history.get(idx).map(str::to_owned),
                            None => return Err(format!("!?{}: event not found", term)),
                        }
                    }
                    ' ' | '\t' => {
                        sb.push('!');
                        sb.push(c);
                    }
                    '-' | '0'..='9' => {
                        let neg = c == '-';
                        if neg {
                            i += 1;
                        }
                        let start = i;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                        let digits: String = chars[start..i].iter().collect();
                        let sign = if neg { "!-" } else { "!" };
                        let idx: usize = digits
                            .parse()
                            .map_err(|_| format!("{}{}: event not found", sign, digits))?;
                        let found = if neg {
                            if idx < history.size() {
                                history
                                    .index()
                                    .checked_sub(idx)
                                    .and_then(|at| history.get(at))
                            } else {
                                None
                            }
                        } else if idx < history.index() {
                            history.get(idx)
                        } else {
                            None
                        };
                        match found {
                            Some(entry) => rep = Some(entry.to_owned()),
                            None => return Err(format!("{}{}: event not found", sign, digits)),
                        }
                    }
                    _ => {
                        let term: String = chars[i..].iter().collect();
                        i = chars.len();
                        match history.search_backwards(&term, history.index(), true) {
                            Some(idx) => rep = history.get(idx).map(str::to_owned),
                            None => return Err(format!("!{}: event not found", term)),
                        }
                    }
                }
                if let Some(rep) = rep {
                    sb.push_str(&rep);
                }
            }
            '!' => sb.push(c),
            '^' if i == 0 => {
                let i1 = chars[1..].iter().position(|&c| c == '^').map(|p| p + 1);
                match i1 {
                    Some(i1) => {
                        let i2 = chars[i1 + 1..]
                            .iter()
                            .position(|&c| c == '^')
                            .map(|p| p + i1 + 1)
                            .unwrap_or(chars.len());
                        let old: String = chars[1..i1].iter().collect();
                        let new: String = chars[i1 + 1..i2].iter().collect();
                        let previous = history
                            .index()
                            .checked_sub(1)
                            .and_then(|prev| history.get(prev));
                        match previous {
                            Some(entry) => sb.push_str(&entry.replacen(&old, &new, 1)),
                            None => return Err("!!: event not found".to_owned()),
                        }
                        i = i2 + 1;
                    }
                    None => sb.push(c),
                }
            }
            _ => sb.push(c),
        }
        i += 1;
    }
    if escaped {
        sb.push('\\');
    }
    Ok(sb)
}
