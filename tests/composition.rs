mod common;

use dpn_algebra::net::{
    DataPetriNet, Guard, NetError, Place, Transition, TransitionId, Variable, VariableKind,
    VariableValue,
};
use dpn_algebra::pattern::{
    ActivityMap, ActivityPattern, choice, choice_list, interleaving, parallel, sequence,
    unbounded_repetition,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use common::{diligent_day, holiday, init_logging, lazy_day, lazy_day_net, single};

fn assert_labelled(pattern: &ActivityPattern) {
    for transition in pattern.net().transitions().values() {
        if transition.visible {
            assert!(
                pattern.activity_of(transition.id.as_str()).is_some(),
                "{} has no activity",
                transition.id
            );
        }
    }
}

fn assert_valid(pattern: &ActivityPattern) {
    assert!(pattern.net().is_workflow_net());
    let (source, sink) = pattern.net().workflow_endpoints().unwrap();
    assert_eq!(&source, pattern.source());
    assert_eq!(&sink, pattern.sink());
    assert_labelled(pattern);
}

/// Fires with the standard initial marking until nothing is fireable,
/// ignoring guards, and returns the visible transitions in firing order.
fn run_to_completion(pattern: &ActivityPattern, seed: u64) -> (DataPetriNet, Vec<TransitionId>) {
    let mut net = pattern.net().copy();
    net.set_marking(&pattern.standard_initial_marking()).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut visible = Vec::new();
    for _ in 0..100 {
        let fireable = net.fireable_transitions(true).unwrap();
        let Some(next) = fireable.choose(&mut rng).cloned() else {
            break;
        };
        net.force_transition(next.as_str()).unwrap();
        if net.transition(next.as_str()).unwrap().visible {
            visible.push(next);
        }
    }
    (net, visible)
}

#[test]
fn rejects_insufficient_activity_map() {
    let mut activities = ActivityMap::new();
    activities.insert(TransitionId::new("start computer"), "lazy day".to_owned());
    assert!(matches!(
        ActivityPattern::new(lazy_day_net(), activities),
        Err(NetError::MissingActivity { .. })
    ));
}

#[test]
fn every_operator_yields_labelled_workflow_net() {
    init_logging();
    let a = lazy_day();
    let b = diligent_day();
    assert_valid(&sequence(&a, &b));
    assert_valid(&choice(&a, &b));
    assert_valid(&choice_list(&[a.clone(), b.clone(), holiday()]).unwrap());
    assert_valid(&parallel(&a, &b));
    assert_valid(&interleaving(&a, &b));
    assert_valid(&unbounded_repetition(&a));
}

#[test]
fn parallel_counts_match_structure() {
    let composed = parallel(&single("a"), &single("b"));
    assert_eq!(composed.net().transitions_len(), 4);
    assert_eq!(composed.net().places_len(), 6);
    let invisible = composed
        .net()
        .transitions()
        .values()
        .filter(|t| !t.visible)
        .count();
    assert_eq!(invisible, 2);

    let days = parallel(&lazy_day(), &diligent_day());
    assert_eq!(days.net().transitions_len(), 8);
    assert_eq!(days.net().places_len(), 10);
}

#[test]
fn operands_are_left_untouched() {
    let a = lazy_day();
    let b = diligent_day();
    let before = (a.net().to_description(), b.net().to_description());
    let _ = interleaving(&a, &b);
    let _ = choice_list(&[a.clone(), b.clone()]).unwrap();
    assert_eq!((a.net().to_description(), b.net().to_description()), before);
    assert_eq!(a.activities().len(), 3);
}

#[test]
fn renamed_transitions_keep_their_activity() {
    let composed = sequence(&lazy_day(), &diligent_day());
    assert_eq!(composed.activity_of("start computer"), Some("lazy day"));
    assert_eq!(composed.activity_of("start computer'"), Some("diligent day"));
    assert_eq!(composed.activity_of("program"), Some("diligent day"));
    // the second operand's variables are renamed, not shared
    let names: Vec<&str> = composed.net().variables().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["time", "time'", "tired"]);
    assert_eq!(
        composed.net().transition("start computer'").unwrap().guard.variables(),
        vec!["time'"]
    );
}

fn guarded(activity: &str, variable: Variable, guard: Guard) -> ActivityPattern {
    let mut net = DataPetriNet::new();
    net.add_place(Place::with_id_label("start", 0)).unwrap();
    net.add_place(Place::with_id_label("end", 0)).unwrap();
    net.add_variable(variable).unwrap();
    net.add_transition(Transition::new(activity).with_guard(guard)).unwrap();
    net.add_connection("start", activity, "end").unwrap();
    ActivityPattern::new(net, activity).unwrap()
}

#[test]
fn guards_keep_reading_their_own_variable() {
    let a = guarded("a", Variable::boolean("x").with_value(true), Guard::is_true("x"));
    let b = guarded("b", Variable::int("x").with_value(7), Guard::greater("x", 5));

    let composed = sequence(&a, &b);
    let net = composed.net();
    assert_eq!(net.variable("x").unwrap().kind, VariableKind::Bool);
    assert_eq!(net.variable("x'").unwrap().kind, VariableKind::Int);
    assert_eq!(net.variable("x'").unwrap().value, Some(VariableValue::Int(7)));

    let mut net = net.copy();
    let mut marking = composed.all_zeros_marking();
    marking.set("start'", 1);
    net.set_marking(&marking).unwrap();
    assert_eq!(net.fireable_transitions(false).unwrap(), vec![TransitionId::new("b")]);

    net.set_variable("x'", 3i64).unwrap();
    assert!(net.fireable_transitions(false).unwrap().is_empty());
    net.set_variable("x", false).unwrap();
    assert!(net.set_variable("x", 7i64).is_err());
}

#[test]
fn sequence_runs_both_operands_in_order() {
    let composed = sequence(&single("a"), &single("b"));
    let (net, visible) = run_to_completion(&composed, 3);
    assert_eq!(visible, vec![TransitionId::new("a"), TransitionId::new("b")]);
    assert!(net.matches_marking(&composed.standard_final_marking()));
}

#[test]
fn choice_runs_exactly_one_alternative() {
    let composed = choice_list(&[single("a"), single("b"), single("c")]).unwrap();
    for seed in 0..8 {
        let (net, visible) = run_to_completion(&composed, seed);
        assert_eq!(visible.len(), 1);
        assert!(net.matches_marking(&composed.standard_final_marking()));
    }
    let pairwise = choice(&single("a"), &single("b"));
    let (net, visible) = run_to_completion(&pairwise, 5);
    assert_eq!(visible.len(), 1);
    assert!(net.matches_marking(&pairwise.standard_final_marking()));
}

#[test]
fn parallel_and_interleaving_run_both_operands() {
    for composed in [
        parallel(&single("a"), &single("b")),
        interleaving(&single("a"), &single("b")),
    ] {
        for seed in 0..8 {
            let (net, mut visible) = run_to_completion(&composed, seed);
            visible.sort();
            assert_eq!(visible, vec![TransitionId::new("a"), TransitionId::new("b")]);
            assert!(net.matches_marking(&composed.standard_final_marking()));
        }
    }
}

#[test]
fn interleaving_never_runs_branches_concurrently() {
    let a = sequence(&single("a1"), &single("a2"));
    let b = sequence(&single("b1"), &single("b2"));
    let composed = interleaving(&a, &b);
    for seed in 0..16 {
        let (_, visible) = run_to_completion(&composed, seed);
        let names: Vec<char> = visible
            .iter()
            .map(|id| id.as_str().chars().next().unwrap_or_default())
            .collect();
        assert_eq!(names.len(), 4);
        assert_eq!(names[0], names[1]);
        assert_eq!(names[2], names[3]);
        assert_ne!(names[0], names[2]);
    }
}

#[test]
fn repetition_can_loop_or_leave() {
    let composed = unbounded_repetition(&single("a"));
    let mut net = composed.net().copy();
    net.set_marking(&composed.standard_initial_marking()).unwrap();
    net.force_transition("start").unwrap();
    net.force_transition("a").unwrap();
    let repeat = TransitionId::new("start,end");
    let mut fireable = net.fireable_transitions(true).unwrap();
    fireable.sort();
    assert_eq!(fireable, vec![TransitionId::new("end"), repeat.clone()]);

    net.force_transition(repeat.as_str()).unwrap();
    net.force_transition("a").unwrap();
    net.force_transition("end").unwrap();
    assert!(net.matches_marking(&composed.standard_final_marking()));
}

#[test]
fn empty_choice_list_fails() {
    assert!(matches!(choice_list(&[]), Err(NetError::EmptyInput)));
}

#[test]
fn composed_patterns_prune_routing() {
    let mut composed = sequence(&single("a"), &single("b"));
    let transitions = composed.net().transitions_len();
    let report = composed.prune();
    assert!(!report.is_empty());
    assert!(composed.net().transitions_len() < transitions);
    assert_valid(&composed);
    let (net, visible) = run_to_completion(&composed, 1);
    assert_eq!(visible.len(), 2);
    assert!(net.matches_marking(&composed.standard_final_marking()));
}
