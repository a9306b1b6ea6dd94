//! Composition operators. Operands are only read: each result is built in a
//! fresh net into which renamed copies of the operands are absorbed.
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use log::info;

use crate::net::{DataPetriNet, NetError, Place, PlaceId, Result, TransitionId, make_id_unique};

use super::{ActivityMap, ActivityPattern};

#[derive(Default)]
struct Composition {
    net: DataPetriNet,
    activities: ActivityMap,
}

impl Composition {
    /// Copies `pattern` into the composition, appending `'` to every place,
    /// transition or variable name that is already taken. Guards are
    /// rewritten to read the renamed variables. Returns the renamed source
    /// and sink.
    fn absorb(&mut self, pattern: &ActivityPattern) -> (PlaceId, PlaceId) {
        let mut renamed: IndexMap<&PlaceId, PlaceId> = IndexMap::new();
        for place in pattern.net().places().values() {
            let id = PlaceId::new(make_id_unique(place.id.as_str(), |candidate| {
                self.net.place(candidate).is_some()
            }));
            self.net.places_mut().insert(
                id.clone(),
                Place::new(id.clone(), place.label.clone(), place.tokens),
            );
            renamed.insert(&place.id, id);
        }
        let rename = |place: &PlaceId| renamed.get(place).cloned().unwrap_or_else(|| place.clone());

        let variables: IndexMap<&str, String> = pattern
            .net()
            .variables()
            .values()
            .map(|variable| (variable.name.as_str(), self.net.insert_fresh_variable(variable)))
            .collect();
        let rename_variable = |name: &str| {
            variables
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_owned())
        };

        for transition in pattern.net().transitions().values() {
            let id = TransitionId::new(make_id_unique(transition.id.as_str(), |candidate| {
                self.net.transition(candidate).is_some()
            }));
            let mut copy = transition.detached(id.clone());
            copy.inputs = transition.inputs.iter().map(rename).collect();
            copy.outputs = transition.outputs.iter().map(rename).collect();
            copy.guard.rename_variables(&rename_variable);
            if let Some(activity) = pattern.activity_of(transition.id.as_str()) {
                self.activities.insert(id.clone(), activity.to_owned());
            }
            self.net.transitions_mut().insert(id, copy);
        }
        (rename(pattern.source()), rename(pattern.sink()))
    }

    fn place(&mut self, base: &str) -> PlaceId {
        self.net.insert_fresh_place(base)
    }

    /// Adds an invisible transition consuming from `inputs` and producing
    /// into `outputs`.
    fn route(&mut self, base: &str, inputs: &[&PlaceId], outputs: &[&PlaceId]) -> TransitionId {
        let id = self.net.insert_fresh_invisible(base);
        if let Some(transition) = self.net.transitions_mut().get_mut(&id) {
            transition.inputs.extend(inputs.iter().map(|&place| place.clone()));
            transition.outputs.extend(outputs.iter().map(|&place| place.clone()));
        }
        id
    }

    fn finish(self, operator: &str, source: PlaceId, sink: PlaceId) -> ActivityPattern {
        info!(
            "{operator}: composed pattern with {} places and {} transitions",
            self.net.places_len(),
            self.net.transitions_len()
        );
        ActivityPattern::from_composition(self.net, self.activities, source, sink)
    }
}

/// `first` then `second`: an invisible transition from the sink of `first`
/// to the source of `second`.
pub fn sequence(first: &ActivityPattern, second: &ActivityPattern) -> ActivityPattern {
    let mut composition = Composition::default();
    let (start_1, end_1) = composition.absorb(first);
    let (start_2, end_2) = composition.absorb(second);

    composition.route(&format!("{end_1},{start_2}"), &[&end_1], &[&start_2]);
    composition.finish("sequence", start_1, end_2)
}

/// Exclusive choice between `first` and `second`.
pub fn choice(first: &ActivityPattern, second: &ActivityPattern) -> ActivityPattern {
    let mut composition = Composition::default();
    let (start_1, end_1) = composition.absorb(first);
    let (start_2, end_2) = composition.absorb(second);

    let source = composition.place(&format!("{start_1},{start_2}"));
    composition.route(start_1.as_str(), &[&source], &[&start_1]);
    composition.route(start_2.as_str(), &[&source], &[&start_2]);
    let sink = composition
        .net
        .introduce_new_sink_place(&IndexSet::from([end_1, end_2]));
    composition.finish("choice", source, sink)
}

/// Exclusive choice among all `patterns`, with one routing transition per
/// alternative on either side instead of the nesting pairwise [`choice`]
/// produces.
pub fn choice_list(patterns: &[ActivityPattern]) -> Result<ActivityPattern> {
    if patterns.is_empty() {
        return Err(NetError::EmptyInput);
    }
    let mut composition = Composition::default();
    let (starts, ends): (Vec<PlaceId>, Vec<PlaceId>) = patterns
        .iter()
        .map(|pattern| composition.absorb(pattern))
        .unzip();

    let source = composition.place(&starts.iter().join(","));
    for start in &starts {
        composition.route(&format!("{source},{start}"), &[&source], &[start]);
    }
    let sink = composition.place(&ends.iter().join(","));
    for end in &ends {
        composition.route(&format!("{end},{sink}"), &[end], &[&sink]);
    }
    Ok(composition.finish("choice_list", source, sink))
}

/// Concurrent execution: one AND-split into both sources, one AND-join from
/// both sinks.
pub fn parallel(first: &ActivityPattern, second: &ActivityPattern) -> ActivityPattern {
    let mut composition = Composition::default();
    let (start_1, end_1) = composition.absorb(first);
    let (start_2, end_2) = composition.absorb(second);

    let source = composition.place(&format!("{start_1},{start_2}"));
    composition.route(start_1.as_str(), &[&source], &[&start_1, &start_2]);

    let joined = format!("{end_1},{end_2}");
    let sink = composition.place(&joined);
    composition.route(&joined, &[&end_1, &end_2], &[&sink]);
    composition.finish("parallel", source, sink)
}

/// Both patterns run in either order, never overlapping.
///
/// A mutex place `px` is marked by the split. Entering a branch takes the
/// mutex, leaving it gives the mutex back, and the join consumes it.
pub fn interleaving(first: &ActivityPattern, second: &ActivityPattern) -> ActivityPattern {
    let mut composition = Composition::default();
    let (start_1, end_1) = composition.absorb(first);
    let (start_2, end_2) = composition.absorb(second);

    let starts = format!("{start_1},{start_2}");
    let ends = format!("{end_1},{end_2}");
    let source = composition.place(&starts);
    let mutex = composition.place(&format!("{starts},px"));
    let sink = composition.place(&ends);
    let entry_1 = composition.place(&format!("{start_1}_"));
    let entry_2 = composition.place(&format!("{start_2}_"));
    let exit_1 = composition.place(&format!("{end_1}_"));
    let exit_2 = composition.place(&format!("{end_2}_"));

    composition.route(&starts, &[&source], &[&entry_1, &entry_2, &mutex]);
    composition.route(&format!("{start_1}_"), &[&entry_1, &mutex], &[&start_1]);
    composition.route(&format!("{start_2}_"), &[&entry_2, &mutex], &[&start_2]);
    composition.route(&format!("{end_1}_"), &[&end_1], &[&exit_1, &mutex]);
    composition.route(&format!("{end_2}_"), &[&end_2], &[&exit_2, &mutex]);
    composition.route(&ends, &[&exit_1, &exit_2, &mutex], &[&sink]);
    composition.finish("interleaving", source, sink)
}

/// `pattern` executed one or more times.
pub fn unbounded_repetition(pattern: &ActivityPattern) -> ActivityPattern {
    let mut composition = Composition::default();
    let (start, end) = composition.absorb(pattern);

    let source = composition.place(start.as_str());
    let sink = composition.place(end.as_str());
    composition.route(start.as_str(), &[&source], &[&start]);
    composition.route(end.as_str(), &[&end], &[&sink]);
    composition.route(&format!("{start},{end}"), &[&end], &[&start]);
    composition.finish("unbounded_repetition", source, sink)
}
