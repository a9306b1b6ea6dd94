//! Read-only views handed to rendering collaborators.
use std::fmt::Write as FmtWrite;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::net::core::DataPetriNet;
use crate::net::ids::{PlaceId, TransitionId};
use crate::net::structure::Tokens;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetNode {
    Place {
        id: PlaceId,
        label: String,
        tokens: Tokens,
    },
    Transition {
        id: TransitionId,
        label: String,
        visible: bool,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DotOptions {
    /// Print labels on invisible transitions instead of filling them black.
    pub show_invisible_labels: bool,
}

impl DataPetriNet {
    /// Bipartite graph of the net; edges follow the token flow.
    pub fn to_graph(&self) -> DiGraph<NetNode, ()> {
        let mut graph = DiGraph::new();
        let mut place_nodes: IndexMap<&PlaceId, NodeIndex> = IndexMap::new();
        for place in self.places().values() {
            let node = graph.add_node(NetNode::Place {
                id: place.id.clone(),
                label: place.label.clone(),
                tokens: place.tokens,
            });
            place_nodes.insert(&place.id, node);
        }
        for transition in self.transitions().values() {
            let node = graph.add_node(NetNode::Transition {
                id: transition.id.clone(),
                label: transition.label.clone(),
                visible: transition.visible,
            });
            for input in &transition.inputs {
                if let Some(&place) = place_nodes.get(input) {
                    graph.add_edge(place, node, ());
                }
            }
            for output in &transition.outputs {
                if let Some(&place) = place_nodes.get(output) {
                    graph.add_edge(node, place, ());
                }
            }
        }
        graph
    }

    pub fn to_dot(&self) -> String {
        self.to_dot_with(DotOptions::default())
    }

    pub fn to_dot_with(&self, options: DotOptions) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph {{");
        for place in self.places().values() {
            let tokens = if place.tokens == 0 {
                String::new()
            } else {
                place.tokens.to_string()
            };
            let _ = writeln!(
                &mut dot,
                "\t\"place_{}\" [label=\"{}\" shape=circle xlabel=\"{}\"]",
                escape_label(place.id.as_str()),
                tokens,
                escape_label(&place.label)
            );
        }
        for transition in self.transitions().values() {
            let node = format!("transition_{}", escape_label(transition.id.as_str()));
            let style = match (transition.visible, options.show_invisible_labels) {
                (true, _) => String::new(),
                (false, true) => " style=filled".to_owned(),
                (false, false) => " style=filled fillcolor=black".to_owned(),
            };
            let _ = writeln!(
                &mut dot,
                "\t\"{node}\" [label=\"{}\" shape=rectangle{style}]",
                escape_label(&transition.label)
            );
            for input in &transition.inputs {
                let _ = writeln!(
                    &mut dot,
                    "\t\"place_{}\" -> \"{node}\"",
                    escape_label(input.as_str())
                );
            }
            for output in &transition.outputs {
                let _ = writeln!(
                    &mut dot,
                    "\t\"{node}\" -> \"place_{}\"",
                    escape_label(output.as_str())
                );
            }
        }
        let _ = writeln!(&mut dot, "}}");
        dot
    }
}

fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
