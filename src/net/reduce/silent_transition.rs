use indexmap::IndexSet;
use log::debug;

use crate::net::core::DataPetriNet;
use crate::net::ids::{PlaceId, TransitionId};

use super::ReductionStep;

impl DataPetriNet {
    /// # Silent transition removal
    ///
    /// A transition `t` with `•t = {p}` and `t• = {q}` is removed when
    /// - `t` is invisible and its guard is `AcceptAlways`,
    /// - `p• = {t}`, so no branching is lost,
    /// - no transition consuming from `p` also produces into `p`,
    /// - `p` is not a source of the net.
    ///
    /// Since `t` is the only consumer of `p`, `q` may be the sink.
    ///
    /// Every producer of `p` then produces into `q` instead. Tokens lying on
    /// `p` move to `q`.
    pub(super) fn prune_silent_transition(
        &mut self,
        id: &TransitionId,
        sources: &IndexSet<PlaceId>,
    ) -> Option<ReductionStep> {
        let (place, redirected_to) = self.silent_bypass(id, sources)?;

        self.transitions_mut().shift_remove(id);
        for producer in self.transitions_mut().values_mut() {
            if producer.outputs.shift_remove(&place) {
                producer.outputs.insert(redirected_to.clone());
            }
        }
        let stranded = self.place(place.as_str()).map_or(0, |p| p.tokens);
        if stranded > 0 {
            if let Some(target) = self.places_mut().get_mut(&redirected_to) {
                target.tokens += stranded;
            }
            if let Some(source) = self.places_mut().get_mut(&place) {
                source.tokens = 0;
            }
        }

        debug!("pruned silent transition '{id}' ('{place}' -> '{redirected_to}')");
        Some(ReductionStep::SilentTransitionRemoved {
            transition: id.clone(),
            place,
            redirected_to,
        })
    }

    fn silent_bypass(
        &self,
        id: &TransitionId,
        sources: &IndexSet<PlaceId>,
    ) -> Option<(PlaceId, PlaceId)> {
        let transition = self.transition(id.as_str())?;
        if transition.visible
            || !transition.guard.is_accept_always()
            || transition.inputs.len() != 1
            || transition.outputs.len() != 1
        {
            return None;
        }
        let input = transition.inputs.first()?;
        let output = transition.outputs.first()?;

        let only_consumer = self.outgoing_transitions(input.as_str()).count() == 1;
        let self_loop = self
            .outgoing_transitions(input.as_str())
            .any(|consumer| consumer.outputs.contains(input));
        if self_loop || sources.contains(input) || !only_consumer {
            return None;
        }
        Some((input.clone(), output.clone()))
    }
}
