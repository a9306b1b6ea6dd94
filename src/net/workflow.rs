//! Workflow-net invariant: exactly one source place and one sink place.
use indexmap::IndexSet;
use itertools::Itertools;

use crate::net::core::{DataPetriNet, NetError, Result};
use crate::net::ids::{PlaceId, TransitionId, make_id_unique};
use crate::net::structure::{Place, Transition};

impl DataPetriNet {
    /// Sources feed some transition but are never fed; sinks are the dual.
    /// Places without arcs are neither.
    pub fn source_sink_places(&self) -> (IndexSet<PlaceId>, IndexSet<PlaceId>) {
        let mut consumed = IndexSet::new();
        let mut produced = IndexSet::new();
        for transition in self.transitions().values() {
            consumed.extend(transition.inputs.iter().cloned());
            produced.extend(transition.outputs.iter().cloned());
        }
        let sources = consumed.difference(&produced).cloned().collect();
        let sinks = produced.difference(&consumed).cloned().collect();
        (sources, sinks)
    }

    pub fn is_workflow_net(&self) -> bool {
        let (sources, sinks) = self.source_sink_places();
        self.places_len() >= 2 && sources.len() == 1 && sinks.len() == 1
    }

    /// The unique source and sink, or `NotWorkflowNet`.
    pub fn workflow_endpoints(&self) -> Result<(PlaceId, PlaceId)> {
        let (sources, sinks) = self.source_sink_places();
        match (sources.first(), sinks.first()) {
            (Some(source), Some(sink))
                if self.places_len() >= 2 && sources.len() == 1 && sinks.len() == 1 =>
            {
                Ok((source.clone(), sink.clone()))
            }
            _ => Err(NetError::NotWorkflowNet {
                places: self.places_len(),
                sources: sources.len(),
                sinks: sinks.len(),
            }),
        }
    }

    /// Returns a copy with a synthetic source (sink) place in front of
    /// (behind) multiple sources (sinks), each linked by an invisible
    /// transition. A net that already is a workflow net is copied unchanged.
    pub fn transform_to_workflow_net(&self) -> DataPetriNet {
        let mut copy = self.copy();
        let (sources, sinks) = copy.source_sink_places();
        if sources.len() > 1 {
            copy.introduce_new_source_place(&sources);
        }
        if sinks.len() > 1 {
            copy.introduce_new_sink_place(&sinks);
        }
        copy
    }

    fn introduce_new_source_place(&mut self, old_sources: &IndexSet<PlaceId>) {
        let new_source = self.insert_fresh_place(&old_sources.iter().join(","));
        for old_source in old_sources {
            let transition = self.insert_fresh_invisible(old_source.as_str());
            self.link(&new_source, &transition, old_source);
        }
    }

    /// Joins `old_sinks` into a new sink place, which is returned.
    pub(crate) fn introduce_new_sink_place(&mut self, old_sinks: &IndexSet<PlaceId>) -> PlaceId {
        let new_sink = self.insert_fresh_place(&old_sinks.iter().join(","));
        for old_sink in old_sinks {
            let transition = self.insert_fresh_invisible(old_sink.as_str());
            self.link(old_sink, &transition, &new_sink);
        }
        new_sink
    }

    /// Inserts an empty-labelled place whose id is derived from `base`.
    pub(crate) fn insert_fresh_place(&mut self, base: &str) -> PlaceId {
        let id = make_id_unique(base, |candidate| self.place(candidate).is_some());
        let id = PlaceId::new(id);
        self.places_mut()
            .insert(id.clone(), Place::new(id.clone(), String::new(), 0));
        id
    }

    /// Inserts an invisible, unguarded transition whose id is derived from
    /// `base`.
    pub(crate) fn insert_fresh_invisible(&mut self, base: &str) -> TransitionId {
        let id = make_id_unique(base, |candidate| self.transition(candidate).is_some());
        let transition = Transition::invisible(id);
        let id = transition.id.clone();
        self.transitions_mut().insert(id.clone(), transition);
        id
    }

    /// Arc insertion for ids that are known to exist.
    pub(crate) fn link(&mut self, input: &PlaceId, transition: &TransitionId, output: &PlaceId) {
        if let Some(target) = self.transitions_mut().get_mut(transition) {
            target.inputs.insert(input.clone());
            target.outputs.insert(output.clone());
        }
    }
}
