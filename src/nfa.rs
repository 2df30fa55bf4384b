use bitvec::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::fa::{Symbol, FA};
use crate::regex::{Base, Factor, Quantifier, RegEx, Term};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NFAState {
    id: usize,
    transitions: HashMap<Symbol, HashSet<usize>>,
}

/// Thompson-constructed automaton. States live in an arena indexed by id;
/// the combinators below consume their operands and renumber their states
/// into the result.
#[derive(Debug)]
pub struct NFA {
    states: Vec<NFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: HashSet<char>,
    pattern: String,
}

impl NFAState {
    fn new(id: usize) -> Self {
        NFAState {
            id,
            transitions: HashMap::new(),
        }
    }

    fn add_transition(&mut self, symbol: Symbol, to: usize) {
        self.transitions.entry(symbol).or_default().insert(to);
    }

    pub fn get_transitions(&self) -> &HashMap<Symbol, HashSet<usize>> {
        &self.transitions
    }

    pub fn get_id(&self) -> usize {
        self.id
    }
}

impl FA for NFA {
    fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn get_start_state(&self) -> usize {
        self.start_state
    }

    fn get_alphabet(&self) -> &HashSet<char> {
        &self.alphabet
    }

    fn get_acceptor_states(&self) -> &BitVec<u8> {
        &self.accept_states
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)> {
        let mut edges = Vec::new();
        for (symbol, targets) in &self.states[state_id].transitions {
            for target in targets {
                edges.push((symbol.clone(), *target));
            }
        }
        edges
    }
}

impl NFA {
    fn new() -> Self {
        NFA {
            states: Vec::new(),
            start_state: 0,
            accept_states: BitVec::new(),
            alphabet: HashSet::new(),
            pattern: String::new(),
        }
    }

    fn add_state(&mut self) -> usize {
        let state_id = self.states.len();
        self.states.push(NFAState::new(state_id));
        self.accept_states.push(false);
        state_id
    }

    fn add_transition(&mut self, from: usize, symbol: Symbol, to: usize) {
        self.states[from].add_transition(symbol, to);
    }

    fn set_start_state(&mut self, state_id: usize) {
        self.start_state = state_id;
    }

    fn set_accept_state(&mut self, state_id: usize) {
        self.accept_states.set(state_id, true);
    }

    pub fn get_state(&self, id: usize) -> &NFAState {
        &self.states[id]
    }

    pub fn get_pattern(&self) -> &str {
        &self.pattern
    }

    /// Copy another automaton's states into this one, renumbering them past
    /// the states already present. Returns the id offset that was applied.
    fn absorb(&mut self, other: &NFA) -> usize {
        let offset = self.states.len();
        for state in &other.states {
            let mut copied = NFAState::new(state.id + offset);
            for (symbol, targets) in &state.transitions {
                for target in targets {
                    copied.add_transition(symbol.clone(), target + offset);
                }
            }
            self.states.push(copied);
            self.accept_states.push(false);
        }
        offset
    }

    fn literal_construction(character: char) -> NFA {
        let mut result = NFA::new();
        let start_state = result.add_state();
        let end_state = result.add_state();
        result.alphabet.insert(character);
        result.add_transition(start_state, Symbol::Char(character), end_state);

        result.set_start_state(start_state);
        result.set_accept_state(end_state);
        result
    }

    fn concatenate(nfa1: NFA, nfa2: NFA) -> NFA {
        let mut result = NFA::new();
        let offset1 = result.absorb(&nfa1);
        let offset2 = result.absorb(&nfa2);

        // Stitch every acceptor of NFA1 to the start of NFA2
        for accept in nfa1.accept_states.iter_ones() {
            result.add_transition(accept + offset1, Symbol::Epsilon, nfa2.start_state + offset2);
        }

        result.set_start_state(nfa1.start_state + offset1);
        for accept in nfa2.accept_states.iter_ones() {
            result.set_accept_state(accept + offset2);
        }

        result.alphabet = nfa1.alphabet.union(&nfa2.alphabet).cloned().collect();
        result
    }

    fn alternation(nfa1: NFA, nfa2: NFA) -> NFA {
        let mut result = NFA::new();
        let new_start = result.add_state();

        let offset1 = result.absorb(&nfa1);
        result.add_transition(new_start, Symbol::Epsilon, nfa1.start_state + offset1);

        let offset2 = result.absorb(&nfa2);
        result.add_transition(new_start, Symbol::Epsilon, nfa2.start_state + offset2);

        let new_accept = result.add_state();
        for accept in nfa1.accept_states.iter_ones() {
            result.add_transition(accept + offset1, Symbol::Epsilon, new_accept);
        }
        for accept in nfa2.accept_states.iter_ones() {
            result.add_transition(accept + offset2, Symbol::Epsilon, new_accept);
        }

        result.set_start_state(new_start);
        result.set_accept_state(new_accept);
        result.alphabet = nfa1.alphabet.union(&nfa2.alphabet).cloned().collect();
        result
    }

    fn closure(nfa: NFA, quantifier: Quantifier) -> NFA {
        let mut result = NFA::new();
        let new_start = result.add_state();

        let offset = result.absorb(&nfa);
        result.add_transition(new_start, Symbol::Epsilon, nfa.start_state + offset);

        let new_accept = result.add_state();
        match quantifier {
            // Star and Question may skip the operand entirely
            Quantifier::Star | Quantifier::Question => {
                result.add_transition(new_start, Symbol::Epsilon, new_accept);
            }
            Quantifier::Plus => {}
        }

        for accept in nfa.accept_states.iter_ones() {
            match quantifier {
                // Star and Plus may loop back for another round
                Quantifier::Star | Quantifier::Plus => {
                    result.add_transition(accept + offset, Symbol::Epsilon, nfa.start_state + offset);
                }
                Quantifier::Question => {}
            }
            result.add_transition(accept + offset, Symbol::Epsilon, new_accept);
        }

        result.set_start_state(new_start);
        result.set_accept_state(new_accept);
        result.alphabet = nfa.alphabet.clone();
        result
    }
}

fn parse_base_tree(tree: &Base) -> NFA {
    match tree {
        Base::Character(character) => NFA::literal_construction(*character),
        Base::EscapeCharacter(character) => NFA::literal_construction(*character),
        Base::Exp(regex) => parse_regex_tree(regex),
        Base::CharSet(char_set) => {
            let mut result: Option<NFA> = None;
            for member in char_set {
                let member_nfa = NFA::literal_construction(*member);
                result = Some(match result {
                    None => member_nfa,
                    Some(prev) => NFA::alternation(member_nfa, prev),
                });
            }
            match result {
                Some(nfa) => nfa,
                // The class expander rejects empty classes; an empty set
                // compiles to an automaton that accepts nothing.
                None => {
                    let mut dead = NFA::new();
                    let start = dead.add_state();
                    dead.set_start_state(start);
                    dead
                }
            }
        }
    }
}

fn parse_factor_tree(tree: &Factor) -> NFA {
    match tree {
        Factor::SimpleFactor(base, quantifier) => match quantifier {
            None => parse_base_tree(base),
            // One-or-more is one copy followed by the starred copy
            Some(Quantifier::Plus) => {
                let first = parse_base_tree(base);
                let repeated = NFA::closure(parse_base_tree(base), Quantifier::Star);
                NFA::concatenate(first, repeated)
            }
            Some(quantifier) => NFA::closure(parse_base_tree(base), *quantifier),
        },
    }
}

fn parse_term_tree(tree: &Term) -> NFA {
    match tree {
        Term::SimpleTerm(factor) => parse_factor_tree(factor),
        Term::ConcatTerm(rfactor, lterm) => {
            let nfa1 = parse_term_tree(lterm);
            let nfa2 = parse_factor_tree(rfactor);
            NFA::concatenate(nfa1, nfa2)
        }
    }
}

fn parse_regex_tree(tree: &RegEx) -> NFA {
    match tree {
        RegEx::SimpleRegex(term) => parse_term_tree(term),
        RegEx::AlterRegex(lterm, rregex) => {
            let nfa1 = parse_term_tree(lterm);
            let nfa2 = parse_regex_tree(rregex);
            NFA::alternation(nfa1, nfa2)
        }
    }
}

/// Compile a parsed pattern into its NFA.
pub fn construct_nfa(pattern: &str, syntax_tree: &RegEx) -> NFA {
    let mut result = parse_regex_tree(syntax_tree);
    result.pattern = pattern.to_string();
    result
}

#[cfg(test)]
mod nfa_tests {
    use super::*;
    use crate::regex::build_syntax_tree;

    fn compile(pattern: &str) -> NFA {
        let tree = build_syntax_tree(pattern).unwrap();
        construct_nfa(pattern, &tree)
    }

    #[test]
    fn test_literal_shape() {
        let nfa = compile("a");
        assert_eq!(nfa.get_num_states(), 2);
        assert_eq!(nfa.get_start_state(), 0);
        assert!(nfa.get_acceptor_states()[1]);
        assert_eq!(nfa.get_alphabet().len(), 1);
        assert!(nfa.get_alphabet().contains(&'a'));
    }

    #[test]
    fn test_concatenation_merges_alphabets() {
        let nfa = compile("ab");
        assert_eq!(nfa.get_num_states(), 4);
        assert_eq!(nfa.get_alphabet().len(), 2);
        // A single acceptor, inherited from the right operand
        assert_eq!(nfa.get_acceptor_states().count_ones(), 1);
    }

    #[test]
    fn test_alternation_adds_fork_and_join() {
        let nfa = compile("a|b");
        assert_eq!(nfa.get_num_states(), 6);
        let start_edges = nfa.get_state_transitions(nfa.get_start_state());
        assert_eq!(start_edges.len(), 2);
        assert!(start_edges.iter().all(|(sym, _)| *sym == Symbol::Epsilon));
    }

    #[test]
    fn test_star_can_skip_operand() {
        let nfa = compile("a*");
        let start_edges = nfa.get_state_transitions(nfa.get_start_state());
        // One edge into the operand, one straight to the acceptor
        assert_eq!(start_edges.len(), 2);
        let accept: Vec<usize> = nfa.get_acceptor_states().iter_ones().collect();
        assert!(start_edges.iter().any(|(_, target)| *target == accept[0]));
    }

    #[test]
    fn test_question_has_no_loop_back() {
        let nfa = compile("a?");
        for state_id in 0..nfa.get_num_states() {
            for (symbol, target) in nfa.get_state_transitions(state_id) {
                // No edge may return to an earlier point than the start edge
                if symbol == Symbol::Epsilon && target == nfa.get_start_state() {
                    panic!("optional operand must not loop");
                }
            }
        }
    }

    #[test]
    fn test_plus_is_copy_then_star() {
        let plus = compile("a+");
        let concat = compile("aa*");
        assert_eq!(plus.get_num_states(), concat.get_num_states());
        assert_eq!(plus.get_alphabet(), concat.get_alphabet());
    }

    #[test]
    fn test_char_set_unions_members_once() {
        let nfa = compile("[ab]");
        // Two literal automatons joined by one alternation
        assert_eq!(nfa.get_num_states(), 6);
        assert_eq!(nfa.get_alphabet().len(), 2);
    }
}
