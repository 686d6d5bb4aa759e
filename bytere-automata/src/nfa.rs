//! Thompson-style construction of a non-deterministic automaton from an [`Ast`].
//!
//! Every AST node becomes a fragment with one start and one end state, wired to the fragments
//! of its operands with epsilon transitions. State ids come from a [`UidGenerator`] that is
//! scoped to one compilation, so every state minted while building a fragment falls in one
//! contiguous id range. Bounded repetition relies on that to duplicate a fragment.

use crate::ast::{Ast, CharAtom, Node, NodeId};
use crate::StateID;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// The label of an NFA transition.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Symbol {
    /// A silent transition.
    Epsilon,
    Byte(u8),
    /// Matches any byte the source state has no [`Symbol::Byte`] transition for.
    Any,
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Byte(b) => write!(f, "{}", std::ascii::escape_default(*b)),
            Symbol::Any => write!(f, "ANY"),
        }
    }
}

/// Hands out unique, increasing state ids.
#[derive(Debug, Clone, Default)]
pub struct UidGenerator {
    next: StateID,
}

impl UidGenerator {
    pub fn starting_at(first: StateID) -> Self {
        Self { next: first }
    }

    pub fn fresh(&mut self) -> StateID {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Reserves `count` consecutive ids.
    pub fn reserve(&mut self, count: usize) -> Range<StateID> {
        let ids = self.next..self.next + count;
        self.next = ids.end;
        ids
    }

    /// The id the next call to [`fresh`](Self::fresh) returns.
    pub fn peek(&self) -> StateID {
        self.next
    }
}

pub type TransitionTable = BTreeMap<StateID, BTreeMap<Symbol, BTreeSet<StateID>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nfa {
    transitions: TransitionTable,
    start: Option<StateID>,
    accepting: BTreeSet<StateID>,
}

impl Nfa {
    /// Builds the automaton for `ast`, taking state ids from `uids`.
    pub fn build(ast: &Ast, uids: &mut UidGenerator) -> Self {
        let mut builder = NfaBuilder {
            ast,
            uids,
            nfa: Nfa::default(),
        };
        let root = builder.build_node(ast.root());
        let mut nfa = builder.nfa;
        nfa.start = Some(root.start);
        nfa.accepting.insert(root.end);
        nfa
    }

    pub fn start_state(&self) -> Option<StateID> {
        self.start
    }

    pub fn end_states(&self) -> &BTreeSet<StateID> {
        &self.accepting
    }

    pub fn transition_table(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn states(&self) -> impl Iterator<Item = StateID> + '_ {
        self.transitions.keys().copied()
    }

    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn next_states(&self, state: StateID, symbol: Symbol) -> Option<&BTreeSet<StateID>> {
        self.transitions.get(&state)?.get(&symbol)
    }

    fn add_state(&mut self, state: StateID) {
        self.transitions.entry(state).or_default();
    }

    pub(crate) fn add_transition(&mut self, from: StateID, symbol: Symbol, to: StateID) {
        self.transitions
            .entry(from)
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(to);
        self.add_state(to);
    }

    /// All states reachable from `states` through epsilon transitions only, `states` included.
    pub fn closure(&self, states: BTreeSet<StateID>) -> BTreeSet<StateID> {
        let mut stack: Vec<_> = states.iter().copied().collect();
        let mut closure = states;
        while let Some(state) = stack.pop() {
            for &next in self.next_states(state, Symbol::Epsilon).into_iter().flatten() {
                if closure.insert(next) {
                    stack.push(next);
                }
            }
        }
        closure
    }

    /// The states reached from `states` by consuming `byte`, or by consuming a byte that is
    /// not listed anywhere when `byte` is `None`.
    ///
    /// A state without a transition on `byte` falls back to its [`Symbol::Any`] transitions.
    pub fn moves(&self, states: &BTreeSet<StateID>, byte: Option<u8>) -> BTreeSet<StateID> {
        let mut res = BTreeSet::new();
        for &state in states {
            let explicit = byte.and_then(|b| self.next_states(state, Symbol::Byte(b)));
            let targets = explicit.or_else(|| self.next_states(state, Symbol::Any));
            res.extend(targets.into_iter().flatten().copied());
        }
        res
    }

    /// Duplicates the states in `states` (and the transitions leaving them) under fresh ids.
    /// Returns the ids of the copy; old id `i` maps to `copy.start + (i - states.start)`.
    fn copy_states(&mut self, states: &Range<StateID>, uids: &mut UidGenerator) -> Range<StateID> {
        let copy = uids.reserve(states.len());
        let remap = |id: StateID| {
            if states.contains(&id) {
                id - states.start + copy.start
            } else {
                id
            }
        };

        let originals: Vec<_> = self
            .transitions
            .range(states.clone())
            .map(|(state, edges)| (*state, edges.clone()))
            .collect();
        for (state, edges) in originals {
            let new_state = remap(state);
            self.add_state(new_state);
            for (symbol, targets) in edges {
                for target in targets {
                    self.add_transition(new_state, symbol, remap(target));
                }
            }
        }
        copy
    }
}

impl Display for Nfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "non deterministic automaton")?;
        match self.start {
            Some(start) => writeln!(f, "start state : {start}")?,
            None => writeln!(f, "start state : -")?,
        }
        writeln!(f, "end states : {}", self.accepting.iter().join(" "))?;
        writeln!(f, "transition table :")?;
        for (state, edges) in &self.transitions {
            let edges = edges
                .iter()
                .flat_map(|(symbol, targets)| targets.iter().map(move |t| format!("({symbol}, {t})")))
                .join(" ");
            writeln!(f, "{state} => {edges}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Fragment {
    start: StateID,
    end: StateID,
    /// Every state created while building this fragment.
    states: Range<StateID>,
}

struct NfaBuilder<'a> {
    ast: &'a Ast,
    uids: &'a mut UidGenerator,
    nfa: Nfa,
}

impl NfaBuilder<'_> {
    fn new_state(&mut self) -> StateID {
        let state = self.uids.fresh();
        self.nfa.add_state(state);
        state
    }

    fn epsilon(&mut self, from: StateID, to: StateID) {
        self.nfa.add_transition(from, Symbol::Epsilon, to);
    }

    fn copy_fragment(&mut self, fragment: &Fragment) -> Fragment {
        let states = self.nfa.copy_states(&fragment.states, self.uids);
        let offset = |id: StateID| id - fragment.states.start + states.start;
        Fragment {
            start: offset(fragment.start),
            end: offset(fragment.end),
            states,
        }
    }

    /// `count` independent instances of `fragment`, the original first. Nothing is chained yet.
    fn instances(&mut self, fragment: Fragment, count: u32) -> Vec<Fragment> {
        let mut copies = Vec::with_capacity(count as usize);
        for _ in 1..count {
            copies.push(self.copy_fragment(&fragment));
        }
        copies.insert(0, fragment);
        copies
    }

    fn chain(&mut self, copies: &[Fragment]) {
        for pair in copies.windows(2) {
            self.epsilon(pair[0].end, pair[1].start);
        }
    }

    fn build_node(&mut self, id: NodeId) -> Fragment {
        let first = self.uids.peek();
        let (start, end) = match self.ast.node(id) {
            Node::Pipe(l, r) => {
                let left = self.build_node(*l);
                let right = self.build_node(*r);
                let start = self.new_state();
                let end = self.new_state();
                self.epsilon(start, left.start);
                self.epsilon(start, right.start);
                self.epsilon(left.end, end);
                self.epsilon(right.end, end);
                (start, end)
            }
            Node::Concat(l, r) => {
                let left = self.build_node(*l);
                let right = self.build_node(*r);
                self.epsilon(left.end, right.start);
                (left.start, right.end)
            }
            Node::StarRep(c) => {
                let inner = self.build_node(*c);
                self.epsilon(inner.start, inner.end);
                self.epsilon(inner.end, inner.start);
                (inner.start, inner.end)
            }
            Node::OptRep(c) => {
                let inner = self.build_node(*c);
                self.epsilon(inner.start, inner.end);
                (inner.start, inner.end)
            }
            Node::PlusRep(c) => {
                let inner = self.build_node(*c);
                self.epsilon(inner.end, inner.start);
                (inner.start, inner.end)
            }
            Node::ValRep(c, count) => {
                let inner = self.build_node(*c);
                if *count == 0 {
                    self.epsilon(inner.start, inner.end);
                    (inner.start, inner.end)
                } else {
                    let copies = self.instances(inner, *count);
                    self.chain(&copies);
                    (copies[0].start, copies[copies.len() - 1].end)
                }
            }
            Node::BoundedRep(c, min, max) => {
                let inner = self.build_node(*c);
                let copies = self.instances(inner, *max);
                self.chain(&copies);
                let end = copies[copies.len() - 1].end;
                if *min == 0 {
                    self.epsilon(copies[0].start, copies[0].end);
                }
                // once `min` copies matched, every further copy is optional
                let first_optional_exit = (*min).max(1) as usize - 1;
                for copy in &copies[first_optional_exit..copies.len() - 1] {
                    self.epsilon(copy.end, end);
                }
                (copies[0].start, end)
            }
            Node::CharSelect(set) => {
                let start = self.new_state();
                let end = self.new_state();
                for &b in set {
                    self.nfa.add_transition(start, Symbol::Byte(b), end);
                }
                (start, end)
            }
            Node::CharExcl(set) => {
                let start = self.new_state();
                let dead = self.new_state();
                let end = self.new_state();
                for &b in set {
                    self.nfa.add_transition(start, Symbol::Byte(b), dead);
                }
                self.nfa.add_transition(start, Symbol::Any, end);
                (start, end)
            }
            Node::Char(atom) => {
                let start = self.new_state();
                let end = self.new_state();
                match atom {
                    CharAtom::Class(class) => {
                        for b in class.bytes() {
                            self.nfa.add_transition(start, Symbol::Byte(b), end);
                        }
                    }
                    CharAtom::Byte(b) | CharAtom::Escaped(b) => {
                        self.nfa.add_transition(start, Symbol::Byte(*b), end);
                    }
                }
                (start, end)
            }
        };
        Fragment {
            start,
            end,
            states: first..self.uids.peek(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_regex;
    use pretty_assertions::assert_eq;

    fn nfa(pattern: &str) -> Nfa {
        Nfa::build(&parse_regex(pattern).unwrap(), &mut UidGenerator::default())
    }

    fn set<const N: usize>(ids: [StateID; N]) -> BTreeSet<StateID> {
        ids.into()
    }

    /// Runs the NFA directly over `input`, reporting whether it ends in an accepting state.
    fn accepts(nfa: &Nfa, input: &str) -> bool {
        let mut current = nfa.closure(set([nfa.start_state().unwrap()]));
        for b in input.bytes() {
            current = nfa.closure(nfa.moves(&current, Some(b)));
        }
        !current.is_disjoint(nfa.end_states())
    }

    #[test]
    fn single_char() {
        let nfa = nfa("a");
        assert_eq!(nfa.start_state(), Some(0));
        assert_eq!(nfa.end_states(), &set([1]));
        assert_eq!(nfa.next_states(0, Symbol::Byte(b'a')), Some(&set([1])));
        assert_eq!(nfa.state_count(), 2);
    }

    #[test]
    fn pipe_wiring() {
        // a: 0 -> 1, b: 2 -> 3, pipe: 4 -> 5
        let nfa = nfa("a|b");
        assert_eq!(nfa.start_state(), Some(4));
        assert_eq!(nfa.next_states(4, Symbol::Epsilon), Some(&set([0, 2])));
        assert_eq!(nfa.next_states(1, Symbol::Epsilon), Some(&set([5])));
        assert_eq!(nfa.next_states(3, Symbol::Epsilon), Some(&set([5])));
    }

    #[test]
    fn every_state_is_a_key() {
        let nfa = nfa("[]|[^ab]{2,3}(c|d)*");
        for edges in nfa.transition_table().values() {
            for target in edges.values().flatten() {
                assert!(nfa.transition_table().contains_key(target));
            }
        }
        // the end of `[]` is unreachable but still present
        assert!(nfa.transition_table().contains_key(&1));
    }

    #[test]
    fn exclusion_has_dead_end() {
        // start 0, dead 1, end 2
        let nfa = nfa("[^ab]");
        assert_eq!(nfa.next_states(0, Symbol::Byte(b'a')), Some(&set([1])));
        assert_eq!(nfa.next_states(0, Symbol::Any), Some(&set([2])));
        assert!(nfa.transition_table()[&1].is_empty());
    }

    #[test]
    fn classes_expand() {
        let nfa = nfa("\\a");
        assert_eq!(nfa.transition_table()[&0].len(), 63);
        assert!(nfa.next_states(0, Symbol::Byte(b'_')).is_some());
    }

    #[test]
    fn escaped_literal_is_plain_byte() {
        let nfa = nfa("\\(");
        assert_eq!(nfa.next_states(0, Symbol::Byte(b'(')), Some(&set([1])));
    }

    #[test]
    fn repetition_copies_are_independent() {
        let nfa = nfa("(ab)+{3}");
        let ids: Vec<_> = nfa.states().collect();
        // three copies of a four-state fragment, no sharing
        assert_eq!(ids.len(), 12);
        assert_eq!(ids, (0..12).collect::<Vec<_>>());
        // the self loop of `+` is remapped inside every copy
        assert_eq!(nfa.next_states(3, Symbol::Epsilon), Some(&set([0, 4])));
        assert_eq!(nfa.next_states(7, Symbol::Epsilon), Some(&set([4, 8])));
        assert_eq!(nfa.next_states(11, Symbol::Epsilon), Some(&set([8])));
        assert_eq!(nfa.end_states(), &set([11]));
    }

    #[test]
    fn seeded_ids() {
        let ast = parse_regex("ab").unwrap();
        let nfa = Nfa::build(&ast, &mut UidGenerator::starting_at(100));
        assert_eq!(nfa.states().collect::<Vec<_>>(), vec![100, 101, 102, 103]);
    }

    #[test]
    fn languages() {
        let cases: &[(&str, &[&str], &[&str])] = &[
            ("a{3}", &["aaa"], &["", "aa", "aaaa"]),
            ("a{0}", &["", "a"], &["aa"]),
            ("a{2,3}", &["aa", "aaa"], &["a", "aaaa"]),
            ("a{0,2}", &["", "a", "aa"], &["aaa"]),
            ("(ab){1,2}", &["ab", "abab"], &["", "a", "aba", "ababab"]),
            ("[^ab]", &["c", "z"], &["a", "b", "", "cc"]),
            ("a?b", &["b", "ab"], &["a", "aab"]),
            ("(ab|c)*", &["", "ab", "cab", "ababc"], &["a", "abb"]),
        ];
        for (pattern, yes, no) in cases {
            let nfa = nfa(pattern);
            for input in *yes {
                assert!(accepts(&nfa, input), "{pattern} should accept {input:?}");
            }
            for input in *no {
                assert!(!accepts(&nfa, input), "{pattern} should reject {input:?}");
            }
        }
    }

    #[test]
    fn display() {
        let nfa = nfa("a?");
        assert_eq!(
            nfa.to_string(),
            "non deterministic automaton\n\
             start state : 0\n\
             end states : 1\n\
             transition table :\n\
             0 => (ε, 1) (a, 1)\n\
             1 => \n"
        );
    }
}
