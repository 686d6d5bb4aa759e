use crate::dynamic::DfaMatcher;
use crate::{RegexMatcher, StateID};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// One state of a [`Dfa`]: its exact-byte transitions, an optional wildcard, and whether
/// it accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchState {
    pub(crate) accepting: bool,
    pub(crate) transition_table: BTreeMap<u8, StateID>,
    /// Taken for any byte without an entry in `transition_table`.
    pub(crate) default_transition: Option<StateID>,
}

impl MatchState {
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn transition_table(&self) -> &BTreeMap<u8, StateID> {
        &self.transition_table
    }

    pub fn default_transition(&self) -> Option<StateID> {
        self.default_transition
    }

    /// The state reached on `byte`, falling back to the wildcard.
    pub fn next(&self, byte: u8) -> Option<StateID> {
        self.transition_table
            .get(&byte)
            .copied()
            .or(self.default_transition)
    }
}

/// A deterministic automaton over bytes.
///
/// Once built (by [`determinize`](crate::determinize) or [`Dfa::load`]) a `Dfa` is never
/// mutated, so it can be shared freely between threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dfa {
    pub(crate) states: BTreeMap<StateID, MatchState>,
    pub(crate) start: Option<StateID>,
}

impl Dfa {
    pub(crate) fn add_state(&mut self, state: StateID) -> &mut MatchState {
        self.states.entry(state).or_default()
    }

    pub(crate) fn set_start_state(&mut self, state: StateID) {
        self.add_state(state);
        self.start = Some(state);
    }

    pub(crate) fn add_end_state(&mut self, state: StateID) {
        self.add_state(state).accepting = true;
    }

    /// Returns the previous target when `from` already had a transition on `byte`.
    pub(crate) fn add_transition(
        &mut self,
        from: StateID,
        byte: Option<u8>,
        to: StateID,
    ) -> Option<StateID> {
        self.add_state(to);
        let state = self.add_state(from);
        match byte {
            Some(b) => state.transition_table.insert(b, to),
            None => state.default_transition.replace(to),
        }
    }

    pub fn start_state(&self) -> Option<StateID> {
        self.start
    }

    pub fn end_states(&self) -> BTreeSet<StateID> {
        self.states
            .iter()
            .filter(|(_, state)| state.accepting)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_accepting(&self, state: StateID) -> bool {
        self.states.get(&state).is_some_and(MatchState::is_accepting)
    }

    pub fn state(&self, state: StateID) -> Option<&MatchState> {
        self.states.get(&state)
    }

    pub fn states(&self) -> impl Iterator<Item = StateID> + '_ {
        self.states.keys().copied()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The state reached from `state` on `byte`, taking the wildcard if no exact transition exists.
    pub fn next_state(&self, state: StateID, byte: u8) -> Option<StateID> {
        self.states.get(&state)?.next(byte)
    }

    /// Every transition as `(from, byte, to)`, where a `None` byte is the wildcard.
    /// Ordered by source state, then byte, with the wildcard last.
    pub fn transitions(&self) -> impl Iterator<Item = (StateID, Option<u8>, StateID)> + '_ {
        self.states.iter().flat_map(|(&from, state)| {
            state
                .transition_table
                .iter()
                .map(move |(&b, &to)| (from, Some(b), to))
                .chain(state.default_transition.map(|to| (from, None, to)))
        })
    }

    /// Starts a step-by-step match at the start state.
    pub fn matcher(&self) -> DfaMatcher<'_> {
        DfaMatcher::new(self)
    }

    /// Length of the longest prefix of `text[offset..]` this automaton accepts.
    ///
    /// The match is anchored at `offset`; no other starting positions are tried.
    /// Returns `None` when nothing matches there, when `offset` lies past the end of `text`,
    /// or when the automaton has no start state.
    pub fn match_at(&self, text: impl AsRef<[u8]>, offset: usize) -> Option<usize> {
        let rest = text.as_ref().get(offset..)?;
        self.matcher().longest_prefix(rest.iter().copied())
    }
}

pub(crate) fn fmt_symbol(byte: Option<u8>) -> String {
    match byte {
        Some(b) => std::ascii::escape_default(b).to_string(),
        None => "ANY".to_string(),
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "deterministic automaton")?;
        match self.start {
            Some(start) => writeln!(f, "start state : {start}")?,
            None => writeln!(f, "start state : -")?,
        }
        writeln!(f, "end states : {}", self.end_states().iter().join(" "))?;
        writeln!(f, "transition table :")?;
        for (id, state) in &self.states {
            let edges = state
                .transition_table
                .iter()
                .map(|(&b, to)| (Some(b), to))
                .chain(state.default_transition.as_ref().map(|to| (None, to)))
                .map(|(b, to)| format!("({}, {to})", fmt_symbol(b)))
                .join(" ");
            writeln!(f, "{id} => {edges}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{compile, Dfa};
    use pretty_assertions::assert_eq;

    fn match_len(pattern: &str, text: &str) -> Option<usize> {
        compile(pattern).unwrap().match_at(text, 0)
    }

    #[test]
    fn scenarios() {
        assert_eq!(match_len("a+", "aaab"), Some(3));
        assert_eq!(match_len("(ab|c)*", "ababc"), Some(5));
        assert_eq!(match_len("a{2,3}", "aaaa"), Some(3));
        assert_eq!(match_len("[abc]", "d"), None);
        assert_eq!(match_len("a?b", "b"), Some(1));
    }

    #[test]
    fn longest_prefix_falls_back_to_last_accepting_position() {
        // accepts "ab" and "abcd", input stops after "abc"
        assert_eq!(match_len("ab|abcd", "abcx"), Some(2));
        assert_eq!(match_len("ab|abcd", "abcd"), Some(4));
        assert_eq!(match_len("ab|abcd", "a"), None);
    }

    #[test]
    fn empty_matches() {
        assert_eq!(match_len("a*", ""), Some(0));
        assert_eq!(match_len("a*", "b"), Some(0));
        assert_eq!(match_len("a+", ""), None);
    }

    #[test]
    fn offsets() {
        let dfa = compile("b+").unwrap();
        assert_eq!(dfa.match_at("abbbc", 0), None);
        assert_eq!(dfa.match_at("abbbc", 1), Some(3));
        assert_eq!(dfa.match_at("abbbc", 3), Some(1));
        assert_eq!(dfa.match_at("abbbc", 5), None);
        assert_eq!(dfa.match_at("abbbc", 6), None);
        assert_eq!(compile("b*").unwrap().match_at("abbbc", 5), Some(0));
    }

    #[test]
    fn exclusion() {
        let dfa = compile("[^ab]").unwrap();
        assert_eq!(dfa.match_at("a", 0), None);
        assert_eq!(dfa.match_at("b", 0), None);
        for b in (0..=u8::MAX).filter(|b| ![b'a', b'b'].contains(b)) {
            assert_eq!(dfa.match_at([b], 0), Some(1), "byte {b}");
        }
    }

    #[test]
    fn literal_dot_is_not_a_wildcard() {
        let dfa = compile("a.b").unwrap();
        assert_eq!(dfa.match_at("a.b", 0), Some(3));
        assert_eq!(dfa.match_at("axb", 0), None);
    }

    #[test]
    fn classes() {
        assert_eq!(match_len("\\d+", "2024-10"), Some(4));
        assert_eq!(match_len("\\a+", "foo_bar9 baz"), Some(8));
        assert_eq!(match_len("\\w+", "foo_bar"), Some(3));
    }

    #[test]
    fn empty_automaton_matches_nothing() {
        let dfa = Dfa::default();
        assert_eq!(dfa.match_at("", 0), None);
        assert_eq!(dfa.match_at("abc", 0), None);
    }

    #[test]
    fn determinism() {
        let dfa = compile("(a|ab)(c|bcd)").unwrap();
        for _ in 0..3 {
            assert_eq!(dfa.match_at("abcd", 0), Some(4));
        }
        for (id, state) in &dfa.states {
            for (b, _) in state.transition_table() {
                assert_eq!(
                    dfa.transitions()
                        .filter(|(from, byte, _)| from == id && *byte == Some(*b))
                        .count(),
                    1
                );
            }
        }
    }

    #[test]
    fn display() {
        let dfa = compile("a[^b]").unwrap();
        assert_eq!(
            dfa.to_string(),
            "deterministic automaton\n\
             start state : 0\n\
             end states : 3\n\
             transition table :\n\
             0 => (a, 1)\n\
             1 => (b, 2) (ANY, 3)\n\
             2 => \n\
             3 => \n"
        );
    }
}
