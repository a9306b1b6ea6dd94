//! Static net elements: places, transitions, arcs and markings.
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::net::core::{NetError, Result};
use crate::net::guard::{Guard, Variable};
use crate::net::ids::{PlaceId, TransitionId};

pub type Tokens = u64;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Place {
    pub id: PlaceId,
    pub label: String,
    pub tokens: Tokens,
}

impl Place {
    pub fn new(id: impl Into<PlaceId>, label: impl Into<String>, tokens: Tokens) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tokens,
        }
    }

    /// A place labelled with its own id.
    pub fn with_id_label(id: impl Into<String>, tokens: Tokens) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, tokens)
    }

    pub fn with_empty_label(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self::new(id, String::new(), 0)
    }

    pub fn increment(&mut self) {
        self.tokens += 1;
    }

    pub fn decrement(&mut self) -> Result<()> {
        if self.tokens == 0 {
            return Err(NetError::InvariantViolation {
                place: self.id.clone(),
            });
        }
        self.tokens -= 1;
        Ok(())
    }
}

/// A transition and the arcs attached to it.
///
/// Arcs are stored only here; the place side of the adjacency is derived by
/// the owning net. Equality and hashing look at the id alone.
#[derive(Clone)]
pub struct Transition {
    pub id: TransitionId,
    pub label: String,
    pub visible: bool,
    pub guard: Guard,
    pub inputs: IndexSet<PlaceId>,
    pub outputs: IndexSet<PlaceId>,
}

impl Transition {
    /// A visible transition labelled with its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::with_label(id.clone(), id, true)
    }

    pub fn invisible(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::with_label(id.clone(), id, false)
    }

    pub fn with_label(id: impl Into<TransitionId>, label: impl Into<String>, visible: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible,
            guard: Guard::AcceptAlways,
            inputs: IndexSet::new(),
            outputs: IndexSet::new(),
        }
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    /// Structural copy under a new id, without arcs.
    pub(crate) fn detached(&self, id: TransitionId) -> Self {
        Self {
            id,
            label: self.label.clone(),
            visible: self.visible,
            guard: self.guard.clone(),
            inputs: IndexSet::new(),
            outputs: IndexSet::new(),
        }
    }

    pub fn can_fire(&self, variables: &IndexMap<String, Variable>) -> Result<bool> {
        self.guard.accept(variables)
    }
}

impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Transition {}

impl Hash for Transition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("visible", &self.visible)
            .field("guard", &self.guard)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArcDirection {
    PlaceToTransition,
    TransitionToPlace,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Arc {
    pub place: PlaceId,
    pub transition: TransitionId,
    pub direction: ArcDirection,
}

impl Arc {
    pub fn input(place: PlaceId, transition: TransitionId) -> Self {
        Self {
            place,
            transition,
            direction: ArcDirection::PlaceToTransition,
        }
    }

    pub fn output(transition: TransitionId, place: PlaceId) -> Self {
        Self {
            place,
            transition,
            direction: ArcDirection::TransitionToPlace,
        }
    }
}

/// Token counts keyed by place id.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Marking(pub IndexMap<PlaceId, Tokens>);

impl Marking {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlaceId, &Tokens)> {
        self.0.iter()
    }

    /// Tokens on `place`; places not listed hold none.
    pub fn tokens(&self, place: &str) -> Tokens {
        self.0.get(place).copied().unwrap_or(0)
    }

    pub fn set(&mut self, place: impl Into<PlaceId>, tokens: Tokens) {
        self.0.insert(place.into(), tokens);
    }

    pub fn total(&self) -> Tokens {
        self.0.values().sum()
    }

    pub fn into_inner(self) -> IndexMap<PlaceId, Tokens> {
        self.0
    }
}

impl<K: Into<PlaceId>> FromIterator<(K, Tokens)> for Marking {
    fn from_iter<I: IntoIterator<Item = (K, Tokens)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (place, tokens) in self.iter() {
            map.entry(&place.as_str(), tokens);
        }
        map.finish()
    }
}
