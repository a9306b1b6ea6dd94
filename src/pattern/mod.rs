//! Activity patterns: workflow nets whose visible transitions are mapped to
//! high-level activity names, and the algebra composing them.
use indexmap::IndexMap;
use log::debug;

use crate::config::PruningConfig;
use crate::net::{DataPetriNet, Marking, NetError, PlaceId, PruneReport, Result, TransitionId};

mod compose;

pub use compose::{choice, choice_list, interleaving, parallel, sequence, unbounded_repetition};

/// High-level activity name per transition.
pub type ActivityMap = IndexMap<TransitionId, String>;

/// How activity names are assigned when building a pattern.
#[derive(Debug, Clone)]
pub enum ActivityLabels {
    /// Every transition of the supplied net gets this name.
    Uniform(String),
    PerTransition(ActivityMap),
}

impl From<&str> for ActivityLabels {
    fn from(name: &str) -> Self {
        ActivityLabels::Uniform(name.to_owned())
    }
}

impl From<String> for ActivityLabels {
    fn from(name: String) -> Self {
        ActivityLabels::Uniform(name)
    }
}

impl From<ActivityMap> for ActivityLabels {
    fn from(map: ActivityMap) -> Self {
        ActivityLabels::PerTransition(map)
    }
}

/// A workflow net plus the activity name of every visible transition.
#[derive(Debug, Clone)]
pub struct ActivityPattern {
    net: DataPetriNet,
    activities: ActivityMap,
    source: PlaceId,
    sink: PlaceId,
}

impl ActivityPattern {
    /// Wraps `net`, normalising it to a workflow net first if needed.
    ///
    /// Fails with `NotWorkflowNet` if normalisation cannot produce a single
    /// source and sink, with `MissingActivity` if a visible transition has
    /// no name, and with `UnknownReference` if a name is given for a
    /// transition the net does not have.
    pub fn new(net: DataPetriNet, labels: impl Into<ActivityLabels>) -> Result<Self> {
        let activities = match labels.into() {
            ActivityLabels::Uniform(name) => net
                .transitions()
                .keys()
                .map(|id| (id.clone(), name.clone()))
                .collect(),
            ActivityLabels::PerTransition(map) => map,
        };
        let net = if net.is_workflow_net() {
            net
        } else {
            net.transform_to_workflow_net()
        };
        let (source, sink) = net.workflow_endpoints()?;

        if let Some(unknown) = activities.keys().find(|id| net.transition(id.as_str()).is_none()) {
            return Err(NetError::UnknownReference {
                kind: "transition",
                id: unknown.as_str().to_owned(),
            });
        }
        if let Some(unlabelled) = net
            .transitions()
            .values()
            .find(|transition| transition.visible && !activities.contains_key(&transition.id))
        {
            return Err(NetError::MissingActivity {
                transition: unlabelled.id.clone(),
            });
        }

        Ok(Self {
            net,
            activities,
            source,
            sink,
        })
    }

    /// Composition results are workflow nets with labelled visible
    /// transitions by construction.
    pub(crate) fn from_composition(
        net: DataPetriNet,
        activities: ActivityMap,
        source: PlaceId,
        sink: PlaceId,
    ) -> Self {
        debug_assert!(net.is_workflow_net());
        debug_assert_eq!(net.workflow_endpoints().ok(), Some((source.clone(), sink.clone())));
        Self {
            net,
            activities,
            source,
            sink,
        }
    }

    pub fn net(&self) -> &DataPetriNet {
        &self.net
    }

    pub fn activities(&self) -> &ActivityMap {
        &self.activities
    }

    pub fn activity_of(&self, transition: &str) -> Option<&str> {
        self.activities.get(transition).map(String::as_str)
    }

    pub fn source(&self) -> &PlaceId {
        &self.source
    }

    pub fn sink(&self) -> &PlaceId {
        &self.sink
    }

    pub fn into_parts(self) -> (DataPetriNet, ActivityMap) {
        (self.net, self.activities)
    }

    /// Zero tokens on every place.
    pub fn all_zeros_marking(&self) -> Marking {
        self.net.places().keys().map(|id| (id.clone(), 0)).collect()
    }

    /// One token on the source, zero elsewhere.
    pub fn standard_initial_marking(&self) -> Marking {
        let mut marking = self.all_zeros_marking();
        marking.set(self.source.clone(), 1);
        marking
    }

    /// One token on the sink, zero elsewhere.
    pub fn standard_final_marking(&self) -> Marking {
        let mut marking = self.all_zeros_marking();
        marking.set(self.sink.clone(), 1);
        marking
    }

    /// Prunes the net and forgets the names of removed transitions.
    pub fn prune(&mut self) -> PruneReport {
        self.prune_with(&PruningConfig::default())
    }

    pub fn prune_with(&mut self, config: &PruningConfig) -> PruneReport {
        let report = if config.exhaustive {
            self.net.prune_exhaustively()
        } else {
            self.net.prune()
        };
        let net = &self.net;
        self.activities
            .retain(|id, _| net.transition(id.as_str()).is_some());
        debug!(
            "pattern pruned to {} places and {} transitions",
            self.net.places_len(),
            self.net.transitions_len()
        );
        report
    }
}
