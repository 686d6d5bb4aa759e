//! Contains the [`DfaMatcher`], which walks a [`Dfa`] one byte at a time.
//! Unlike a matcher generated through the `compile_regex!` macro, the automaton it runs
//! does not need to be known at compile time: it can be compiled or loaded at runtime.

use crate::{Dfa, RegexMatcher, StateID};

#[derive(Debug, Clone)]
pub struct DfaMatcher<'a> {
    dfa: &'a Dfa,
    current_state: Option<StateID>,
}

impl<'a> DfaMatcher<'a> {
    pub(crate) fn new(dfa: &'a Dfa) -> Self {
        Self {
            dfa,
            current_state: dfa.start_state(),
        }
    }

    /// `None` only for an automaton without a start state.
    pub fn current_state(&self) -> Option<StateID> {
        self.current_state
    }
}

impl RegexMatcher for DfaMatcher<'_> {
    type Alphabet = u8;

    fn accept(&mut self, inp: u8) -> bool {
        let next = self
            .current_state
            .and_then(|state| self.dfa.next_state(state, inp));
        match next {
            Some(next) => {
                self.current_state = Some(next);
                true
            }
            None => false,
        }
    }

    fn is_accepting(&self) -> bool {
        self.current_state
            .is_some_and(|state| self.dfa.is_accepting(state))
    }

    fn reset(&mut self) {
        self.current_state = self.dfa.start_state();
    }
}
