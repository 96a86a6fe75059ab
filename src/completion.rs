//! Tab completion API
use crate::edit::State;
use crate::Result;

/// A completion candidate source.
///
/// Completers are consulted in registration order; the first one that
/// returns a replacement position wins.
pub trait Completer {
    /// Populate `candidates` for `line` with the cursor at char index
    /// `cursor`. Returns the char position candidates replace from, or
    /// `None` when this completer has nothing to offer.
    fn complete(&self, line: &str, cursor: usize, candidates: &mut Vec<String>) -> Option<usize>;
}

/// Consumes the candidates produced by a [`Completer`].
///
/// Returns `true` iff the buffer was modified.
pub trait CompletionHandler {
    fn complete(
        &self,
        state: &mut State<'_>,
        candidates: &[String],
        position: usize,
    ) -> Result<bool>;
}

/// Default handler: installs a single candidate, extends multiple
/// candidates to their unambiguous prefix and lists them in columns,
/// asking first when there are more than the configured threshold.
pub struct ListCompletionHandler;

impl CompletionHandler for ListCompletionHandler {
    fn complete(
        &self,
        state: &mut State<'_>,
        candidates: &[String],
        position: usize,
    ) -> Result<bool> {
        if candidates.len() == 1 {
            let value = &candidates[0];
            if *value == state.buffer_string() {
                return Ok(false);
            }
            install(state, value, position)?;
            return Ok(true);
        }
        if candidates.len() > 1 {
            let common = common_prefix(candidates);
            install(state, &common, position)?;
        }
        print_candidates(state, candidates)?;
        state.draw_line()?;
        Ok(true)
    }
}

/// Replace the text between `position` and the cursor with `value` and
/// park the cursor after it.
fn install(state: &mut State<'_>, value: &str, position: usize) -> Result<()> {
    while state.buf.cursor() > position && state.backspace()? {}
    state.put_string(value)?;
    state.set_cursor_position(position + value.chars().count())?;
    Ok(())
}

/// Print the candidate list in columns, prompting first when it is
/// larger than the autoprint threshold.
pub fn print_candidates(state: &mut State<'_>, candidates: &[String]) -> Result<()> {
    let mut distinct: Vec<&str> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !distinct.contains(&candidate.as_str()) {
            distinct.push(candidate);
        }
    }
    if distinct.len() > state.config.autoprint_threshold() {
        state.print_str(&format!(
            "Display all {} possibilities? (y or n)",
            candidates.len()
        ))?;
        state.flush()?;
        match state.read_character_allowed(&['y', 'n'])? {
            Some('y') => {}
            _ => {
                state.println()?;
                return Ok(());
            }
        }
    }
    state.println()?;
    state.print_columns(&distinct)?;
    Ok(())
}

/// Longest common prefix of all candidates.
fn common_prefix(candidates: &[String]) -> String {
    let mut prefix: Vec<char> = match candidates.first() {
        Some(first) => first.chars().collect(),
        None => return String::new(),
    };
    for candidate in &candidates[1..] {
        let mut len = 0;
        for (a, b) in prefix.iter().zip(candidate.chars()) {
            if *a != b {
                break;
            }
            len += 1;
        }
        prefix.truncate(len);
    }
    prefix.into_iter().collect()
}
