//! Customize line editor behavior
use std::default::Default;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Milliseconds to wait for the byte after a lone ESC before
    /// committing it as a literal escape.
    escape_timeout: u64,
    /// Ring the terminal bell on command failure.
    bell_enabled: bool,
    /// Number of completion candidates above which listing asks for
    /// confirmation first.
    autoprint_threshold: usize,
    /// Expand `!`/`^` event designators on accept.
    expand_events: bool,
    /// Page candidate listings that exceed the terminal height.
    pagination: bool,
    /// Maximum length for the history.
    max_history_size: usize,
    history_ignore_dups: bool,
    history_ignore_space: bool,
    edit_mode: EditMode,
}

impl Config {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn escape_timeout(&self) -> u64 {
        self.escape_timeout
    }

    pub fn bell_enabled(&self) -> bool {
        self.bell_enabled
    }

    pub fn autoprint_threshold(&self) -> usize {
        self.autoprint_threshold
    }

    pub fn expand_events(&self) -> bool {
        self.expand_events
    }

    pub fn pagination(&self) -> bool {
        self.pagination
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Tell if lines which match the previous history entry are saved
    /// or not in the history list. By default, they are ignored.
    pub fn history_ignore_dups(&self) -> bool {
        self.history_ignore_dups
    }

    /// Tell if lines which begin with a space character are saved or
    /// not in the history list. By default, they are saved.
    pub fn history_ignore_space(&self) -> bool {
        self.history_ignore_space
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            escape_timeout: 150,
            bell_enabled: false,
            autoprint_threshold: 100,
            expand_events: true,
            pagination: false,
            max_history_size: 500,
            history_ignore_dups: true,
            history_ignore_space: false,
            edit_mode: EditMode::Emacs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMode {
    Emacs,
    Vi,
}

#[derive(Clone, Debug, Default)]
pub struct Builder {
    p: Config,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            p: Config::default(),
        }
    }

    /// Set the delay in milliseconds before a lone ESC is taken
    /// literally (default 150). Zero disables the non-blocking peek.
    pub fn escape_timeout(mut self, timeout_ms: u64) -> Self {
        self.p.escape_timeout = timeout_ms;
        self
    }

    /// Enable the audible bell on command failure (default off).
    pub fn bell_enabled(mut self, yes: bool) -> Self {
        self.p.bell_enabled = yes;
        self
    }

    /// Set the number of candidates to list without asking (default
    /// 100, same as bash).
    pub fn autoprint_threshold(mut self, threshold: usize) -> Self {
        self.p.autoprint_threshold = threshold;
        self
    }

    /// Expand history event designators on accept (default on).
    pub fn expand_events(mut self, yes: bool) -> Self {
        self.p.expand_events = yes;
        self
    }

    /// Paginate completion listings taller than the screen (default
    /// off).
    pub fn pagination(mut self, yes: bool) -> Self {
        self.p.pagination = yes;
        self
    }

    /// Set the maximum length for the history.
    pub fn max_history_size(mut self, max_size: usize) -> Self {
        self.p.max_history_size = max_size;
        self
    }

    pub fn history_ignore_dups(mut self, yes: bool) -> Self {
        self.p.history_ignore_dups = yes;
        self
    }

    pub fn history_ignore_space(mut self, yes: bool) -> Self {
        self.p.history_ignore_space = yes;
        self
    }

    /// Choose between Emacs and Vi key bindings.
    pub fn edit_mode(mut self, edit_mode: EditMode) -> Self {
        self.p.edit_mode = edit_mode;
        self
    }

    pub fn build(self) -> Config {
        self.p
    }
}
