//! Runtime: the data Petri net arena, firing semantics and the vote/commit
//! simulation step.
use std::fmt;

use indexmap::IndexMap;
use log::debug;
use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::net::guard::{Guard, Variable, VariableValue};
use crate::net::ids::{PlaceId, TransitionId, make_id_unique};
use crate::net::structure::{Marking, Place, Transition};

#[derive(Debug, Error)]
pub enum NetError {
    #[error("{kind} '{id}' does already exist")]
    DuplicateIdentifier { kind: &'static str, id: String },
    #[error("{kind} '{id}' is not in net")]
    UnknownReference { kind: &'static str, id: String },
    #[error("transition '{0}' is not in net")]
    UnknownTransition(TransitionId),
    #[error("no token available on place '{place}'")]
    InvariantViolation { place: PlaceId },
    #[error("at least one activity pattern is required")]
    EmptyInput,
    #[error("visible transition '{transition}' has no high level activity mapping")]
    MissingActivity { transition: TransitionId },
    #[error("not a workflow net: {places} places, {sources} sources, {sinks} sinks")]
    NotWorkflowNet {
        places: usize,
        sources: usize,
        sinks: usize,
    },
    #[error("variable '{0}' has no value")]
    UnsetVariable(String),
    #[error("invalid value for variable '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

pub type Result<T, E = NetError> = std::result::Result<T, E>;

/// Connectivity report for a net.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    /// Places without any arc.
    pub isolated_places: Vec<PlaceId>,
    /// Transitions without any arc.
    pub isolated_transitions: Vec<TransitionId>,
    pub warnings: Vec<String>,
    pub total_places: usize,
    pub total_transitions: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_places.is_empty()
            || !self.isolated_transitions.is_empty()
            || !self.warnings.is_empty()
    }
}

/// Data Petri net: places, transitions and variables owned by id.
///
/// Arcs live on the transitions (`inputs` / `outputs`), every arc endpoint is
/// a place of this net, and ids are unique per node kind. All mutating
/// operations validate before they touch any state.
#[derive(Debug, Clone, Default)]
pub struct DataPetriNet {
    places: IndexMap<PlaceId, Place>,
    transitions: IndexMap<TransitionId, Transition>,
    variables: IndexMap<String, Variable>,
}

impl DataPetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn places(&self) -> &IndexMap<PlaceId, Place> {
        &self.places
    }

    pub fn transitions(&self) -> &IndexMap<TransitionId, Transition> {
        &self.transitions
    }

    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.get(id)
    }

    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.get(id)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn add_place(&mut self, place: Place) -> Result<PlaceId> {
        if self.places.contains_key(&place.id) {
            return Err(NetError::DuplicateIdentifier {
                kind: "place",
                id: place.id.into_inner(),
            });
        }
        let id = place.id.clone();
        self.places.insert(id.clone(), place);
        Ok(id)
    }

    /// Inserts a transition. Arcs already present on `transition` must point
    /// at places of this net.
    pub fn add_transition(&mut self, transition: Transition) -> Result<TransitionId> {
        if self.transitions.contains_key(&transition.id) {
            return Err(NetError::DuplicateIdentifier {
                kind: "transition",
                id: transition.id.into_inner(),
            });
        }
        for place in transition.inputs.iter().chain(&transition.outputs) {
            self.require_place(place.as_str())?;
        }
        for name in transition.guard.variables() {
            self.require_variable(name)?;
        }
        let id = transition.id.clone();
        self.transitions.insert(id.clone(), transition);
        Ok(id)
    }

    pub fn add_variable(&mut self, variable: Variable) -> Result<String> {
        if self.variables.contains_key(&variable.name) {
            return Err(NetError::DuplicateIdentifier {
                kind: "variable",
                id: variable.name,
            });
        }
        if let Some(value) = variable.value {
            variable.validate(value)?;
        }
        let name = variable.name.clone();
        self.variables.insert(name.clone(), variable);
        Ok(name)
    }

    /// Connects `input -> transition -> output`. Repeated calls for the same
    /// transition accumulate further inputs and outputs.
    pub fn add_connection(
        &mut self,
        input: impl AsRef<str>,
        transition: impl AsRef<str>,
        output: impl AsRef<str>,
    ) -> Result<()> {
        let input = self.require_place(input.as_ref())?;
        let output = self.require_place(output.as_ref())?;
        let transition = self.require_transition_mut(transition.as_ref())?;
        transition.inputs.insert(input);
        transition.outputs.insert(output);
        Ok(())
    }

    /// Input arc: place -> transition.
    pub fn add_input_arc(&mut self, place: impl AsRef<str>, transition: impl AsRef<str>) -> Result<()> {
        let place = self.require_place(place.as_ref())?;
        self.require_transition_mut(transition.as_ref())?
            .inputs
            .insert(place);
        Ok(())
    }

    /// Output arc: transition -> place.
    pub fn add_output_arc(&mut self, transition: impl AsRef<str>, place: impl AsRef<str>) -> Result<()> {
        let place = self.require_place(place.as_ref())?;
        self.require_transition_mut(transition.as_ref())?
            .outputs
            .insert(place);
        Ok(())
    }

    pub fn set_guard(&mut self, transition: impl AsRef<str>, guard: Guard) -> Result<()> {
        for name in guard.variables() {
            self.require_variable(name)?;
        }
        self.require_transition_mut(transition.as_ref())?.guard = guard;
        Ok(())
    }

    pub fn set_variable(&mut self, name: &str, value: impl Into<VariableValue>) -> Result<()> {
        let value = value.into();
        let variable = self
            .variables
            .get_mut(name)
            .ok_or_else(|| NetError::UnknownReference {
                kind: "variable",
                id: name.to_owned(),
            })?;
        variable.validate(value)?;
        variable.value = Some(value);
        Ok(())
    }

    pub fn has_guards(&self) -> bool {
        self.transitions
            .values()
            .any(|transition| !transition.guard.is_accept_always())
    }

    /// Transitions consuming from `place`.
    pub fn outgoing_transitions<'a>(&'a self, place: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions
            .values()
            .filter(move |transition| transition.inputs.contains(place))
    }

    /// Transitions producing into `place`.
    pub fn incoming_transitions<'a>(&'a self, place: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions
            .values()
            .filter(move |transition| transition.outputs.contains(place))
    }

    pub fn marking(&self) -> Marking {
        self.places
            .values()
            .map(|place| (place.id.clone(), place.tokens))
            .collect()
    }

    /// Assigns the listed places; places absent from `marking` keep their
    /// tokens.
    pub fn set_marking(&mut self, marking: &Marking) -> Result<()> {
        for (place, _) in marking.iter() {
            self.require_place(place.as_str())?;
        }
        for (place, tokens) in marking.iter() {
            if let Some(target) = self.places.get_mut(place) {
                target.tokens = *tokens;
            }
        }
        Ok(())
    }

    pub fn matches_marking(&self, marking: &Marking) -> bool {
        marking.iter().all(|(place, tokens)| {
            self.places
                .get(place)
                .is_some_and(|target| target.tokens == *tokens)
        })
    }

    /// Every input place holds at least one token. Arc weight is always one.
    pub fn is_enabled(&self, transition: &Transition) -> bool {
        transition.inputs.iter().all(|place| {
            self.places
                .get(place)
                .is_some_and(|target| target.tokens >= 1)
        })
    }

    /// Transitions that are token-enabled and whose guard accepts.
    pub fn fireable_transitions(&self, ignore_guards: bool) -> Result<Vec<TransitionId>> {
        let mut fireable = Vec::new();
        for transition in self.transitions.values() {
            if !self.is_enabled(transition) {
                continue;
            }
            if ignore_guards || transition.can_fire(&self.variables)? {
                fireable.push(transition.id.clone());
            }
        }
        Ok(fireable)
    }

    /// Fires `transition` regardless of its guard.
    pub fn force_transition(&mut self, transition: impl AsRef<str>) -> Result<()> {
        let transition = transition.as_ref();
        if !self.transitions.contains_key(transition) {
            return Err(NetError::UnknownTransition(TransitionId::new(transition)));
        }
        self.fire(transition)
    }

    /// One discrete step under place-level conflict.
    ///
    /// Every marked place votes for one of its outgoing transitions whose
    /// guard accepts, chosen uniformly with `rng`. A transition fires when it
    /// received at least as many votes as it has input places. This is not
    /// classical step semantics: a transition sharing an input place with a
    /// competitor only fires when every one of its inputs picked it.
    pub fn simulate_one_timestep<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<TransitionId>> {
        let mut votes: IndexMap<TransitionId, usize> = IndexMap::new();
        for place in self.places.values().filter(|place| place.tokens > 0) {
            let mut candidates = Vec::new();
            for transition in self.outgoing_transitions(place.id.as_str()) {
                if transition.can_fire(&self.variables)? {
                    candidates.push(&transition.id);
                }
            }
            if let Some(&chosen) = candidates.choose(rng) {
                *votes.entry(chosen.clone()).or_default() += 1;
            }
        }

        let committed: Vec<TransitionId> = votes
            .into_iter()
            .filter(|(id, count)| {
                self.transitions
                    .get(id)
                    .is_some_and(|transition| *count >= transition.inputs.len())
            })
            .map(|(id, _)| id)
            .collect();

        for id in &committed {
            self.fire(id.as_str())?;
        }
        Ok(committed)
    }

    /// Fully independent structural copy.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn diagnose_connectivity(&self) -> DiagnosticReport {
        let mut isolated_places = Vec::new();
        let mut isolated_transitions = Vec::new();
        let mut warnings = Vec::new();

        for place in self.places.values() {
            let has_input = self.incoming_transitions(place.id.as_str()).next().is_some();
            let has_output = self.outgoing_transitions(place.id.as_str()).next().is_some();
            if !has_input && !has_output {
                isolated_places.push(place.id.clone());
            } else if !has_input && place.tokens == 0 && self.is_fed_nowhere(place) {
                warnings.push(format!(
                    "place '{}' has no incoming arc and no tokens, it can never be marked",
                    place.id
                ));
            }
        }

        for transition in self.transitions.values() {
            match (transition.inputs.is_empty(), transition.outputs.is_empty()) {
                (true, true) => isolated_transitions.push(transition.id.clone()),
                (true, false) => warnings.push(format!(
                    "transition '{}' has no preset and is always token-enabled",
                    transition.id
                )),
                (false, true) => warnings.push(format!(
                    "transition '{}' has no postset and only consumes tokens",
                    transition.id
                )),
                (false, false) => {}
            }
        }

        DiagnosticReport {
            isolated_places,
            isolated_transitions,
            warnings,
            total_places: self.places_len(),
            total_transitions: self.transitions_len(),
        }
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose_connectivity();
        if !report.has_issues() {
            log::info!(
                "connectivity check passed ({} places, {} transitions)",
                report.total_places,
                report.total_transitions
            );
            return;
        }
        log::warn!(
            "connectivity issues in net with {} places, {} transitions",
            report.total_places,
            report.total_transitions
        );
        for id in &report.isolated_places {
            log::warn!("  isolated place '{id}'");
        }
        for id in &report.isolated_transitions {
            log::warn!("  isolated transition '{id}'");
        }
        for warning in &report.warnings {
            log::warn!("  {warning}");
        }
    }

    /// Logs places and variables, one line each.
    pub fn log_state(&self) {
        for line in self.to_string().lines() {
            log::info!("{line}");
        }
    }

    // Source places are legitimately unfed; only warn when the place is not
    // the sole entry of the net.
    fn is_fed_nowhere(&self, place: &Place) -> bool {
        let (sources, _) = self.source_sink_places();
        !(sources.len() == 1 && sources.contains(&place.id))
    }

    fn fire(&mut self, transition: &str) -> Result<()> {
        let Some(target) = self.transitions.get(transition) else {
            return Err(NetError::UnknownTransition(TransitionId::new(transition)));
        };
        if let Some(empty) = target.inputs.iter().find(|place| {
            self.places
                .get(*place)
                .is_none_or(|input| input.tokens == 0)
        }) {
            return Err(NetError::InvariantViolation {
                place: empty.clone(),
            });
        }

        let inputs = target.inputs.clone();
        let outputs = target.outputs.clone();
        for place in &inputs {
            if let Some(input) = self.places.get_mut(place) {
                input.decrement()?;
            }
        }
        for place in &outputs {
            if let Some(output) = self.places.get_mut(place) {
                output.increment();
            }
        }
        debug!("fired transition '{transition}'");
        Ok(())
    }

    pub(crate) fn require_place(&self, id: &str) -> Result<PlaceId> {
        self.places
            .get_key_value(id)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| NetError::UnknownReference {
                kind: "place",
                id: id.to_owned(),
            })
    }

    fn require_variable(&self, name: &str) -> Result<()> {
        if self.variables.contains_key(name) {
            Ok(())
        } else {
            Err(NetError::UnknownReference {
                kind: "variable",
                id: name.to_owned(),
            })
        }
    }

    pub(crate) fn require_transition_mut(&mut self, id: &str) -> Result<&mut Transition> {
        self.transitions
            .get_mut(id)
            .ok_or_else(|| NetError::UnknownReference {
                kind: "transition",
                id: id.to_owned(),
            })
    }

    pub(crate) fn places_mut(&mut self) -> &mut IndexMap<PlaceId, Place> {
        &mut self.places
    }

    pub(crate) fn transitions_mut(&mut self) -> &mut IndexMap<TransitionId, Transition> {
        &mut self.transitions
    }

    /// Adds a copy of `variable`, renamed with `make_id_unique` if its name
    /// is taken. Returns the name it was stored under.
    pub(crate) fn insert_fresh_variable(&mut self, variable: &Variable) -> String {
        let name = make_id_unique(&variable.name, |candidate| {
            self.variables.contains_key(candidate)
        });
        let mut copy = variable.clone();
        copy.name = name.clone();
        self.variables.insert(name.clone(), copy);
        name
    }
}

impl fmt::Display for DataPetriNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Places:")?;
        for place in self.places.values() {
            writeln!(
                f,
                "\t<id={:?},label={:?},tokens={}>",
                place.id.as_str(),
                place.label,
                place.tokens
            )?;
        }
        writeln!(f, "Variables:")?;
        for variable in self.variables.values() {
            match variable.value {
                Some(value) => writeln!(f, "\t<name={:?},value={value}>", variable.name)?,
                None => writeln!(f, "\t<name={:?},value=unset>", variable.name)?,
            }
        }
        Ok(())
    }
}
