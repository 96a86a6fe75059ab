//! Incremental reverse search state

/// State of the `reverse-search-history` sub-machine: the accumulated
/// term, the index of the current match and the term of the previous
/// search (reused when Ctrl-R is struck on an empty term).
#[derive(Debug, Default)]
pub struct SearchState {
    pub term: String,
    pub index: Option<usize>,
    pub previous_term: String,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter search mode, seeding the term with the current buffer
    /// content and remembering the term of the previous search.
    pub fn start(&mut self, seed: String) {
        self.previous_term = std::mem::replace(&mut self.term, seed);
        self.index = None;
    }
}
