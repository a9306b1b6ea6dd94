//! # Data Petri nets
//!
//! A net consists of places `P`, transitions `T` and named variables `V`.
//! Every transition `t` has a preset `•t ⊆ P`, a postset `t• ⊆ P` and a guard
//! over `V`. For a marking `M`:
//!
//! * `t` is **enabled** iff `∀p ∈ •t: M[p] ≥ 1`;
//! * `t` is **fireable** iff it is enabled and its guard accepts the current
//!   variable values;
//! * firing yields `M'[p] = M[p] - [p ∈ •t] + [p ∈ t•]`.
//!
//! A **workflow net** has exactly one source place (never produced into)
//! and one sink place (never consumed from).
//!
//! ## Example
//!
//! ```rust
//! use dpn_algebra::net::*;
//!
//! let mut net = DataPetriNet::new();
//! net.add_place(Place::with_id_label("start", 1)).unwrap();
//! net.add_place(Place::with_id_label("end", 0)).unwrap();
//! net.add_variable(Variable::int("time").with_value(3)).unwrap();
//! net.add_transition(Transition::new("work").with_guard(Guard::smaller("time", 5)))
//!     .unwrap();
//! net.add_connection("start", "work", "end").unwrap();
//!
//! assert!(net.is_workflow_net());
//! assert_eq!(net.fireable_transitions(false).unwrap(), vec![TransitionId::new("work")]);
//! net.force_transition("work").unwrap();
//! assert_eq!(net.marking().tokens("end"), 1);
//! ```

pub mod core;
pub mod guard;
pub mod ids;
pub mod interchange;
pub mod reduce;
pub mod structure;
pub mod view;
pub mod workflow;

pub use core::{DataPetriNet, DiagnosticReport, NetError, Result};
pub use guard::{Comparison, Guard, GuardFn, Variable, VariableKind, VariableValue};
pub use ids::{PlaceId, TransitionId, make_id_unique};
pub use interchange::{NetDescription, PlaceDescription, TransitionDescription};
pub use reduce::{PruneReport, ReductionStep};
pub use structure::{Arc, ArcDirection, Marking, Place, Tokens, Transition};
pub use view::{DotOptions, NetNode};
