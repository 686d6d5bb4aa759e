use crate::StateID;

/// Settings for compiling a pattern into an automaton.
///
/// ```
/// # use bytere_automata::CompileOptions;
/// let options = CompileOptions::default()
///     .with_max_repetition(64)
///     .with_max_dfa_states(10_000);
/// assert_eq!(options.max_repetition, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Largest number of copies bounded repetition may make of any operand.
    ///
    /// Each `{n}` and `{n,m}` copies its operand `n` (or `m`) times, and nested repetitions
    /// multiply, so `(a{10}){20}` needs 200. This bounds the NFA size.
    pub max_repetition: u32,
    /// Upper bound on the number of states the determinizer may create.
    /// `None` means unbounded.
    pub max_dfa_states: Option<usize>,
    /// The first id handed out to an NFA state. Only useful to make state ids reproducible
    /// across runs, e.g. when comparing dumps.
    pub first_state_id: StateID,
}

impl CompileOptions {
    pub fn with_max_repetition(mut self, max: u32) -> Self {
        self.max_repetition = max;
        self
    }

    pub fn with_max_dfa_states(mut self, max: usize) -> Self {
        self.max_dfa_states = Some(max);
        self
    }

    pub fn with_first_state_id(mut self, first: StateID) -> Self {
        self.first_state_id = first;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_repetition: 1000,
            max_dfa_states: None,
            first_state_id: 0,
        }
    }
}
