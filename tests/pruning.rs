mod common;

use dpn_algebra::net::{DataPetriNet, NetError, Place, Transition};
use dpn_algebra::pattern::{
    ActivityPattern, choice, choice_list, interleaving, parallel, sequence, unbounded_repetition,
};
use proptest::prelude::*;

use common::{diligent_day, holiday, lazy_day, single};

#[derive(Debug, Clone)]
enum Shape {
    Activity(u8),
    Sequence(Box<Shape>, Box<Shape>),
    Choice(Box<Shape>, Box<Shape>),
    ChoiceList(Vec<Shape>),
    Parallel(Box<Shape>, Box<Shape>),
    Interleaving(Box<Shape>, Box<Shape>),
    Repetition(Box<Shape>),
}

impl Shape {
    fn build(&self) -> ActivityPattern {
        match self {
            Shape::Activity(n) => single(&format!("a{n}")),
            Shape::Sequence(a, b) => sequence(&a.build(), &b.build()),
            Shape::Choice(a, b) => choice(&a.build(), &b.build()),
            Shape::ChoiceList(all) => {
                let built: Vec<_> = all.iter().map(Shape::build).collect();
                choice_list(&built).unwrap()
            }
            Shape::Parallel(a, b) => parallel(&a.build(), &b.build()),
            Shape::Interleaving(a, b) => interleaving(&a.build(), &b.build()),
            Shape::Repetition(a) => unbounded_repetition(&a.build()),
        }
    }
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = (0u8..4).prop_map(Shape::Activity);
    leaf.prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::Sequence(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::Choice(Box::new(a), Box::new(b))),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Shape::ChoiceList),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::Parallel(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::Interleaving(Box::new(a), Box::new(b))),
            inner.prop_map(|a| Shape::Repetition(Box::new(a))),
        ]
    })
}

fn visible_ids(net: &DataPetriNet) -> Vec<String> {
    net.transitions()
        .values()
        .filter(|t| t.visible)
        .map(|t| t.id.as_str().to_owned())
        .collect()
}

#[test]
fn pruning_keeps_endpoints_and_visible_transitions() {
    for pattern in [
        sequence(&lazy_day(), &diligent_day()),
        choice_list(&[lazy_day(), diligent_day(), holiday()]).unwrap(),
        interleaving(&lazy_day(), &holiday()),
        unbounded_repetition(&holiday()),
    ] {
        let mut net = pattern.net().copy();
        let endpoints = net.source_sink_places();
        let visible = visible_ids(&net);
        net.prune_exhaustively();
        assert_eq!(net.source_sink_places(), endpoints);
        assert_eq!(visible_ids(&net), visible);
    }
}

#[test]
fn pruning_moves_stranded_tokens() {
    let mut net = DataPetriNet::new();
    for (id, tokens) in [("start", 0), ("mid", 2), ("end", 0)] {
        net.add_place(Place::with_id_label(id, tokens)).unwrap();
    }
    net.add_transition(Transition::new("t1")).unwrap();
    net.add_transition(Transition::invisible("tau")).unwrap();
    net.add_connection("start", "t1", "mid").unwrap();
    net.add_connection("mid", "tau", "end").unwrap();

    let report = net.prune();
    assert_eq!(report.removed_places.len(), 1);
    assert_eq!(net.marking().tokens("end"), 2);
    assert_eq!(net.marking().total(), 2);
}

proptest! {
    #[test]
    fn composition_closes_over_workflow_nets(shape in arb_shape()) {
        let pattern = shape.build();
        prop_assert!(pattern.net().is_workflow_net());
        for transition in pattern.net().transitions().values() {
            prop_assert!(!transition.visible || pattern.activity_of(transition.id.as_str()).is_some());
        }
    }

    #[test]
    fn pruning_is_safe_on_composed_nets(shape in arb_shape(), exhaustive in any::<bool>()) {
        let mut pattern = shape.build();
        let endpoints = pattern.net().source_sink_places();
        let visible = visible_ids(pattern.net());
        let config = dpn_algebra::PruningConfig { exhaustive };
        pattern.prune_with(&config);
        prop_assert_eq!(pattern.net().source_sink_places(), endpoints);
        prop_assert_eq!(visible_ids(pattern.net()), visible);
        prop_assert!(pattern.net().is_workflow_net());
        prop_assert!(pattern.activities().keys().all(|id| pattern.net().transition(id.as_str()).is_some()));
    }

    #[test]
    fn firing_conserves_tokens(inputs in 1usize..4, outputs in 1usize..4, surplus in 0u64..3) {
        let mut net = DataPetriNet::new();
        net.add_transition(Transition::new("t")).unwrap();
        for i in 0..inputs {
            net.add_place(Place::with_id_label(format!("in{i}"), 1 + surplus)).unwrap();
            net.add_input_arc(format!("in{i}"), "t").unwrap();
        }
        for i in 0..outputs {
            net.add_place(Place::with_id_label(format!("out{i}"), 0)).unwrap();
            net.add_output_arc("t", format!("out{i}")).unwrap();
        }
        let before = net.marking().total();
        net.force_transition("t").unwrap();
        let after = net.marking();
        prop_assert_eq!(after.total() + inputs as u64, before + outputs as u64);
        for i in 0..inputs {
            prop_assert_eq!(after.tokens(&format!("in{i}")), surplus);
        }
    }

    #[test]
    fn duplicate_ids_leave_net_unchanged(id in "[a-z]{1,6}", tokens in 0u64..5) {
        let mut net = DataPetriNet::new();
        net.add_place(Place::with_id_label(id.clone(), 1)).unwrap();
        let duplicate = net.add_place(Place::with_id_label(id.clone(), tokens));
        let is_duplicate = matches!(duplicate, Err(NetError::DuplicateIdentifier { .. }));
        prop_assert!(is_duplicate);
        prop_assert_eq!(net.places_len(), 1);
        prop_assert_eq!(net.marking().tokens(&id), 1);
    }
}
