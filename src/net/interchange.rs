//! Structural interchange with process-mining toolkits and event-log
//! derived construction.
//!
//! The description covers places, transitions and arcs only. Guards and
//! variables stay local to this crate.
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::net::core::{DataPetriNet, Result};
use crate::net::structure::{Arc, ArcDirection, Marking, Place, Tokens, Transition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDescription {
    pub id: String,
    #[serde(default)]
    pub tokens: Tokens,
}

/// A transition is visible iff it carries a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescription {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDescription {
    pub places: Vec<PlaceDescription>,
    pub transitions: Vec<TransitionDescription>,
    pub arcs: Vec<Arc>,
}

impl NetDescription {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// One token on every place without incoming arc.
    pub fn initial_marking(&self) -> Marking {
        self.boundary_marking(ArcDirection::TransitionToPlace)
    }

    /// One token on every place without outgoing arc.
    pub fn final_marking(&self) -> Marking {
        self.boundary_marking(ArcDirection::PlaceToTransition)
    }

    fn boundary_marking(&self, excluded: ArcDirection) -> Marking {
        let touched: IndexSet<&str> = self
            .arcs
            .iter()
            .filter(|arc| arc.direction == excluded)
            .map(|arc| arc.place.as_str())
            .collect();
        let connected: IndexSet<&str> = self.arcs.iter().map(|arc| arc.place.as_str()).collect();
        self.places
            .iter()
            .filter(|place| connected.contains(place.id.as_str()))
            .map(|place| {
                let tokens = u64::from(!touched.contains(place.id.as_str()));
                (place.id.as_str(), tokens)
            })
            .collect()
    }
}

impl DataPetriNet {
    pub fn to_description(&self) -> NetDescription {
        let places = self
            .places()
            .values()
            .map(|place| PlaceDescription {
                id: place.id.as_str().to_owned(),
                tokens: place.tokens,
            })
            .collect();
        let mut transitions = Vec::with_capacity(self.transitions_len());
        let mut arcs = Vec::new();
        for transition in self.transitions().values() {
            transitions.push(TransitionDescription {
                id: transition.id.as_str().to_owned(),
                label: transition.visible.then(|| transition.label.clone()),
            });
            for input in &transition.inputs {
                arcs.push(Arc::input(input.clone(), transition.id.clone()));
            }
            for output in &transition.outputs {
                arcs.push(Arc::output(transition.id.clone(), output.clone()));
            }
        }
        NetDescription {
            places,
            transitions,
            arcs,
        }
    }

    /// Builds a net from a description; places get empty labels.
    pub fn from_description(description: &NetDescription) -> Result<Self> {
        let mut net = DataPetriNet::new();
        for place in &description.places {
            net.add_place(Place::new(place.id.as_str(), String::new(), place.tokens))?;
        }
        for transition in &description.transitions {
            let added = match &transition.label {
                Some(label) => Transition::with_label(transition.id.as_str(), label.clone(), true),
                None => Transition::with_label(transition.id.as_str(), transition.id.clone(), false),
            };
            net.add_transition(added)?;
        }
        for arc in &description.arcs {
            match arc.direction {
                ArcDirection::PlaceToTransition => net.add_input_arc(&arc.place, &arc.transition)?,
                ArcDirection::TransitionToPlace => net.add_output_arc(&arc.transition, &arc.place)?,
            }
        }
        Ok(net)
    }

    /// Founds a net on directly-follows pairs `(a, b)`.
    ///
    /// Each activity becomes a visible transition, each distinct pair a place
    /// `a->b` between them. Activities that never follow another get an
    /// input place `>a`, activities never followed get an output place `a>`.
    pub fn from_directly_follows<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let pairs: IndexSet<(String, String)> = pairs
            .into_iter()
            .map(|(from, to)| (from.as_ref().to_owned(), to.as_ref().to_owned()))
            .collect();
        let mut activities = IndexSet::new();
        for (from, to) in &pairs {
            activities.insert(from.clone());
            activities.insert(to.clone());
        }

        let mut net = DataPetriNet::new();
        for activity in &activities {
            net.add_transition(Transition::new(activity.as_str()))?;
        }
        for (from, to) in &pairs {
            let place = net.insert_fresh_place(&format!("{from}->{to}"));
            net.add_output_arc(from, &place)?;
            net.add_input_arc(&place, to)?;
        }
        for activity in &activities {
            if !pairs.iter().any(|(_, to)| to == activity) {
                let place = net.insert_fresh_place(&format!(">{activity}"));
                net.add_input_arc(&place, activity)?;
            }
            if !pairs.iter().any(|(from, _)| from == activity) {
                let place = net.insert_fresh_place(&format!("{activity}>"));
                net.add_output_arc(activity, &place)?;
            }
        }
        Ok(net)
    }
}
