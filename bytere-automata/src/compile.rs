use crate::nfa::{Nfa, Symbol, UidGenerator};
use crate::{CompileError, Dfa, StateID};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A set of NFA states that forms one DFA state.
type Subset = BTreeSet<StateID>;

/// Subset construction.
struct SubsetCompiler<'a> {
    nfa: &'a Nfa,
    state_ids: HashMap<Subset, StateID>,
    uids: UidGenerator,
    max_states: Option<usize>,
    dfa: Dfa,
}

impl<'a> SubsetCompiler<'a> {
    fn new(nfa: &'a Nfa, max_states: Option<usize>) -> Self {
        Self {
            nfa,
            state_ids: HashMap::new(),
            uids: UidGenerator::default(),
            max_states,
            dfa: Dfa::default(),
        }
    }

    /// The DFA state for `subset`, creating and enqueueing it if it was not seen before.
    fn state_for(
        &mut self,
        subset: Subset,
        work_list: &mut VecDeque<Subset>,
    ) -> Result<StateID, CompileError> {
        if let Some(&id) = self.state_ids.get(&subset) {
            return Ok(id);
        }
        if let Some(limit) = self.max_states {
            if self.state_ids.len() >= limit {
                return Err(CompileError::TooManyStates { limit });
            }
        }

        let id = self.uids.fresh();
        self.dfa.add_state(id);
        if !subset.is_disjoint(self.nfa.end_states()) {
            self.dfa.add_end_state(id);
        }
        self.state_ids.insert(subset.clone(), id);
        work_list.push_back(subset);
        Ok(id)
    }

    fn create_transitions_step(
        &mut self,
        subset: Subset,
        work_list: &mut VecDeque<Subset>,
    ) -> Result<(), CompileError> {
        let from = self.state_ids[&subset];

        let mut bytes = BTreeSet::new();
        let mut wildcard = false;
        for &state in &subset {
            let edges = self.nfa.transition_table().get(&state);
            for symbol in edges.into_iter().flat_map(|edges| edges.keys()) {
                match symbol {
                    Symbol::Byte(b) => {
                        bytes.insert(*b);
                    }
                    Symbol::Any => wildcard = true,
                    Symbol::Epsilon => {}
                }
            }
        }
        log::trace!(
            "expanding {from} = {subset:?}: {} bytes, wildcard: {wildcard}",
            bytes.len()
        );

        let inputs = bytes.into_iter().map(Some).chain(wildcard.then_some(None));
        for byte in inputs {
            let next = self.nfa.closure(self.nfa.moves(&subset, byte));
            let to = self.state_for(next, work_list)?;
            self.dfa.add_transition(from, byte, to);
        }
        Ok(())
    }

    fn compile(mut self) -> Result<Dfa, CompileError> {
        let Some(start) = self.nfa.start_state() else {
            return Ok(self.dfa);
        };

        let mut work_list = VecDeque::new();
        let initial = self.nfa.closure([start].into());
        let start = self.state_for(initial, &mut work_list)?;
        self.dfa.set_start_state(start);

        while let Some(subset) = work_list.pop_front() {
            self.create_transitions_step(subset, &mut work_list)?;
        }

        log::debug!(
            "determinized {} NFA states into {} DFA states",
            self.nfa.state_count(),
            self.dfa.state_count()
        );
        Ok(self.dfa)
    }
}

/// Converts `nfa` into an equivalent deterministic automaton.
///
/// DFA state ids are numbered from zero in the order the subsets are discovered.
/// Fails when more than `max_states` states would be needed.
pub fn determinize(nfa: &Nfa, max_states: Option<usize>) -> Result<Dfa, CompileError> {
    SubsetCompiler::new(nfa, max_states).compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_nfa, compile, compile_with, parse_regex, CompileOptions};
    use pretty_assertions::assert_eq;

    fn dfa(pattern: &str) -> Dfa {
        let nfa = build_nfa(&parse_regex(pattern).unwrap(), &CompileOptions::default());
        determinize(&nfa, None).unwrap()
    }

    #[test]
    fn start_subset_is_epsilon_closed() {
        // `a*` accepts the empty string, so the start state accepts
        let star = dfa("a*");
        assert_eq!(star.start_state(), Some(0));
        assert!(star.is_accepting(0));

        let single = dfa("a");
        assert!(!single.is_accepting(single.start_state().unwrap()));
    }

    #[test]
    fn equal_subsets_share_a_state() {
        // after the `b`, every further `a` leads back to the same subset
        let tail = dfa("ba*");
        assert_eq!(tail.state_count(), 3);
        assert_eq!(tail.next_state(1, b'a'), Some(2));
        assert_eq!(tail.next_state(2, b'a'), Some(2));

        // `a*` loops on its start subset
        let star = dfa("a*");
        assert_eq!(star.state_count(), 1);
        assert_eq!(star.next_state(0, b'a'), Some(0));
    }

    #[test]
    fn no_epsilon_or_empty_moves() {
        let dfa = dfa("(a|b)*c?");
        for (_, byte, _) in dfa.transitions() {
            assert!(matches!(byte, Some(b'a' | b'b' | b'c')));
        }
    }

    #[test]
    fn wildcard_falls_back_per_state() {
        // `b` is listed by the right branch only; the left branch still takes it via its wildcard
        let dfa = compile("[^a]x|bc").unwrap();
        assert_eq!(dfa.match_at("bx", 0), Some(2));
        assert_eq!(dfa.match_at("bc", 0), Some(2));
        assert_eq!(dfa.match_at("zx", 0), Some(2));
        assert_eq!(dfa.match_at("ax", 0), None);
    }

    #[test]
    fn state_limit() {
        let options = CompileOptions::default().with_max_dfa_states(3);
        assert_eq!(
            compile_with("abcdef", &options).unwrap_err(),
            CompileError::TooManyStates { limit: 3 }
        );
        assert!(compile_with("ab", &options).is_ok());
    }

    #[test]
    fn empty_nfa() {
        let dfa = determinize(&Nfa::default(), None).unwrap();
        assert_eq!(dfa.start_state(), None);
        assert_eq!(dfa.state_count(), 0);
    }
}
