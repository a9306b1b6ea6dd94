//! Net reduction: removal of redundant silent routing transitions.
use log::info;

use crate::net::core::DataPetriNet;
use crate::net::ids::{PlaceId, TransitionId};

mod silent_transition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReductionStep {
    /// `transition` was dropped and the producers of `place` now produce
    /// into `redirected_to`.
    SilentTransitionRemoved {
        transition: TransitionId,
        place: PlaceId,
        redirected_to: PlaceId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub steps: Vec<ReductionStep>,
    pub removed_transitions: Vec<TransitionId>,
    pub removed_places: Vec<PlaceId>,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.removed_transitions.is_empty() && self.removed_places.is_empty()
    }

    fn absorb(&mut self, other: PruneReport) {
        self.steps.extend(other.steps);
        self.removed_transitions.extend(other.removed_transitions);
        self.removed_places.extend(other.removed_places);
    }
}

impl DataPetriNet {
    /// One pass of silent-transition removal over the transitions present
    /// at call time.
    ///
    /// Sources are computed once, before the pass; each candidate
    /// is checked against the net as already modified by earlier removals in
    /// the same pass. Places no longer touched by any transition are dropped
    /// at the end. A further call may find opportunities this pass created.
    pub fn prune(&mut self) -> PruneReport {
        let (sources, _) = self.source_sink_places();
        let candidates: Vec<TransitionId> = self.transitions().keys().cloned().collect();

        let mut report = PruneReport::default();
        for transition in candidates {
            if let Some(step) = self.prune_silent_transition(&transition, &sources) {
                report.removed_transitions.push(transition);
                report.steps.push(step);
            }
        }
        report.removed_places = self.drop_unconnected_places();

        info!(
            "prune removed {} transitions and {} places",
            report.removed_transitions.len(),
            report.removed_places.len()
        );
        report
    }

    /// Repeats [`DataPetriNet::prune`] until a pass removes nothing.
    pub fn prune_exhaustively(&mut self) -> PruneReport {
        let mut total = PruneReport::default();
        loop {
            let report = self.prune();
            if report.is_empty() {
                return total;
            }
            total.absorb(report);
        }
    }

    fn drop_unconnected_places(&mut self) -> Vec<PlaceId> {
        let connected: indexmap::IndexSet<PlaceId> = self
            .transitions()
            .values()
            .flat_map(|transition| transition.inputs.iter().chain(&transition.outputs))
            .cloned()
            .collect();
        let removed: Vec<PlaceId> = self
            .places()
            .keys()
            .filter(|id| !connected.contains(*id))
            .cloned()
            .collect();
        self.places_mut().retain(|id, _| connected.contains(id));
        removed
    }
}
