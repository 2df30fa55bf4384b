/* Subset construction to convert an NFA into a DFA, and the execution
 * engine that runs the result over candidate lexemes. */

use crate::fa::{Symbol, FA};
use crate::nfa::NFA;
use bitvec::prelude::*;
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write as _;
use std::fs::File;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A bitvec stored together with its hash so the subset-construction map
/// does not rehash the same state set on every probe.
#[derive(Clone)]
struct HashedBitVec {
    bv: BitVec<u8>,
    hash: u64,
}

impl HashedBitVec {
    fn new(bv: BitVec<u8>) -> Self {
        let mut hasher = DefaultHasher::new();
        bv.hash(&mut hasher);
        let hash = hasher.finish();
        Self { bv, hash }
    }
}

impl Hash for HashedBitVec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for HashedBitVec {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bv == other.bv
    }
}

impl Eq for HashedBitVec {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DFAState {
    transitions: HashMap<char, usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DFA {
    states: Vec<DFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: HashSet<char>,
    pattern: String,
}

impl FA for DFA {
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
        self.states[state_id]
            .transitions
            .iter()
            .map(|(ch, target)| (Symbol::Char(*ch), *target))
            .collect()
    }
}

impl DFAState {
    fn new() -> Self {
        DFAState {
            transitions: HashMap::new(),
        }
    }

    pub fn get_transitions(&self) -> &HashMap<char, usize> {
        &self.transitions
    }
}

impl DFA {
    fn new() -> Self {
        DFA {
            states: Vec::new(),
            start_state: 0,
            accept_states: BitVec::new(),
            alphabet: HashSet::new(),
            pattern: String::new(),
        }
    }

    fn add_state(&mut self) -> usize {
        let state_id = self.states.len();
        self.states.push(DFAState::new());
        self.accept_states.push(false);
        state_id
    }

    pub fn get_state(&self, id: usize) -> &DFAState {
        &self.states[id]
    }

    pub fn get_pattern(&self) -> &str {
        &self.pattern
    }

    /// Run the automaton over a candidate lexeme. Execution state is a
    /// local of this call, so the same DFA can be reused for any number of
    /// candidates and repeated calls always agree. Plain spaces are not
    /// consumed; reassembled string literals carry them.
    pub fn validate(&self, input: &str) -> bool {
        let mut current_state = self.start_state;
        for ch in input.chars() {
            if ch == ' ' {
                continue;
            }
            match self.states[current_state].transitions.get(&ch) {
                Some(target) => current_state = *target,
                None => return false,
            }
        }
        self.accept_states[current_state]
    }

    /// Human-readable transition table, rows sorted by state id and symbol.
    /// `>` marks the start state and `*` marks acceptors.
    pub fn transition_table(&self) -> String {
        let mut alphabet: Vec<char> = self.alphabet.iter().cloned().collect();
        alphabet.sort_unstable();

        let mut table = String::new();
        let _ = writeln!(table, "pattern: {}", self.pattern);
        for state_id in 0..self.states.len() {
            let start_mark = if state_id == self.start_state { ">" } else { " " };
            let accept_mark = if self.accept_states[state_id] { "*" } else { " " };
            let _ = write!(table, "{}{} {}:", start_mark, accept_mark, state_id);
            for ch in &alphabet {
                if let Some(target) = self.states[state_id].transitions.get(ch) {
                    let _ = write!(table, "  {} -> {}", ch, target);
                }
            }
            let _ = writeln!(table);
        }
        table
    }

    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(json)
    }

    pub fn from_json(json: &str) -> Result<DFA> {
        let dfa = serde_json::from_str(json)?;
        Ok(dfa)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<DFA> {
        let file = File::open(path)?;
        let dfa = serde_json::from_reader(BufReader::new(file))?;
        Ok(dfa)
    }
}

/// Every NFA state reachable from `nfa_states` over epsilon edges alone,
/// including the seed states themselves.
fn get_epsilon_closure(nfa: &NFA, nfa_states: BitVec<u8>) -> HashedBitVec {
    let num_states = nfa.get_num_states();

    let mut epsilon_closure: BitVec<u8> = BitVec::repeat(false, num_states);
    let mut visited: BitVec<u8> = BitVec::repeat(false, num_states);

    let mut queue: VecDeque<usize> = nfa_states.iter_ones().collect();
    for seed in &queue {
        visited.set(*seed, true);
    }

    while let Some(state_id) = queue.pop_front() {
        epsilon_closure.set(state_id, true);

        let transitions = nfa.get_state(state_id).get_transitions();
        if let Some(targets) = transitions.get(&Symbol::Epsilon) {
            for target in targets {
                if !visited[*target] {
                    visited.set(*target, true);
                    queue.push_back(*target);
                }
            }
        }
    }

    HashedBitVec::new(epsilon_closure)
}

// The set of states reachable from any state in q on the character c
fn delta(nfa: &NFA, q: &HashedBitVec, c: char) -> BitVec<u8> {
    let mut result = BitVec::repeat(false, q.bv.len());
    for node in q.bv.iter_ones() {
        let transitions = nfa.get_state(node).get_transitions();
        let targets = match transitions.get(&Symbol::Char(c)) {
            None => continue,
            Some(targets) => targets,
        };
        for target in targets {
            result.set(*target, true);
        }
    }
    result
}

/// Subset construction. The start state is always id 0, and the alphabet is
/// walked in sorted order so state numbering is deterministic.
pub fn construct_dfa(nfa: &NFA) -> DFA {
    let mut result = DFA::new();
    result.alphabet = nfa.get_alphabet().clone();
    result.pattern = nfa.get_pattern().to_string();

    let mut alphabet: Vec<char> = nfa.get_alphabet().iter().cloned().collect();
    alphabet.sort_unstable();

    let nfa_accepts = nfa.get_acceptor_states();

    let di = result.add_state();
    result.start_state = di;

    let mut nfa_states = BitVec::repeat(false, nfa.get_num_states());
    nfa_states.set(nfa.get_start_state(), true);

    let q0 = get_epsilon_closure(nfa, nfa_states);

    // Mapping from canonical NFA state set to DFA state id
    let mut q_list: HashMap<HashedBitVec, usize> = HashMap::new();
    let mut work_list: VecDeque<(HashedBitVec, usize)> = VecDeque::new();

    if (q0.bv.clone() & nfa_accepts).any() {
        result.accept_states.set(di, true);
    }
    q_list.insert(q0.clone(), di);
    work_list.push_back((q0, di));

    while let Some((q, q_id)) = work_list.pop_front() {
        for c in &alphabet {
            let end_states = delta(nfa, &q, *c);
            if end_states.not_any() {
                continue;
            }

            let t = get_epsilon_closure(nfa, end_states);

            let target_id = if let Some(&existing_id) = q_list.get(&t) {
                existing_id
            } else {
                let new_id = result.add_state();
                if (t.bv.clone() & nfa_accepts).any() {
                    result.accept_states.set(new_id, true);
                }
                q_list.insert(t.clone(), new_id);
                work_list.push_back((t, new_id));
                new_id
            };

            result.states[q_id].transitions.insert(*c, target_id);
        }
    }

    result
}
