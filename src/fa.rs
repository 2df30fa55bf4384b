use bitvec::prelude::BitVec;
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};

/// Label on an automaton edge. Epsilon edges are traversed without
/// consuming input and only ever appear in NFAs.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Char(c) => write!(f, "{}", c),
            Symbol::Epsilon => write!(f, "𝛆"),
        }
    }
}

pub trait FA {
    fn get_num_states(&self) -> usize;
    fn get_start_state(&self) -> usize;
    fn get_alphabet(&self) -> &HashSet<char>;
    fn get_acceptor_states(&self) -> &BitVec<u8>;
    /// All labeled edges leaving the given state.
    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)>;
}

/// Render an automaton as a Graphviz dot graph for offline inspection.
pub fn to_dot<T: FA>(fa: &T) -> String {
    let mut graph = DiGraph::new();
    let mut node_map = HashMap::new();

    for state_id in 0..fa.get_num_states() {
        let label = if state_id == fa.get_start_state() {
            format!("Start\nState {}", state_id)
        } else if fa.get_acceptor_states()[state_id] {
            format!("Accept\nState {}", state_id)
        } else {
            format!("State {}", state_id)
        };
        let node = graph.add_node(label);
        node_map.insert(state_id, node);
    }

    for state_id in 0..fa.get_num_states() {
        for (symbol, target) in fa.get_state_transitions(state_id) {
            graph.add_edge(node_map[&state_id], node_map[&target], symbol.to_string());
        }
    }

    Dot::new(&graph).to_string()
}
