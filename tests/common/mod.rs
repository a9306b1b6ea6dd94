#![allow(dead_code)]

use dpn_algebra::net::{DataPetriNet, Guard, Place, Transition, Variable};
use dpn_algebra::pattern::ActivityPattern;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn working_day(task: &str) -> DataPetriNet {
    let mut net = DataPetriNet::new();
    net.add_place(Place::with_id_label("start", 1)).unwrap();
    net.add_place(Place::with_empty_label("mid_1")).unwrap();
    net.add_place(Place::with_empty_label("mid_2")).unwrap();
    net.add_place(Place::with_id_label("end", 0)).unwrap();

    net.add_variable(Variable::int("time").with_bounds(Some(0.0), Some(24.0)))
        .unwrap();
    net.add_transition(
        Transition::new("start computer").with_guard(Guard::smaller_or_equal("time", 9)),
    )
    .unwrap();
    net.add_transition(Transition::new(task)).unwrap();
    net.add_transition(
        Transition::new("shutdown computer").with_guard(Guard::greater_or_equal("time", 16)),
    )
    .unwrap();

    net.add_connection("start", "start computer", "mid_1").unwrap();
    net.add_connection("mid_1", task, "mid_2").unwrap();
    net.add_connection("mid_2", "shutdown computer", "end").unwrap();
    net
}

/// start -> start computer -> drink coffee -> shutdown computer -> end
pub fn lazy_day_net() -> DataPetriNet {
    working_day("drink coffee")
}

/// Like the lazy day, but programming is only possible when not tired.
pub fn diligent_day_net() -> DataPetriNet {
    let mut net = working_day("program");
    net.add_variable(Variable::boolean("tired")).unwrap();
    net.set_guard("program", Guard::is_false("tired")).unwrap();
    net
}

pub fn holiday_net() -> DataPetriNet {
    let mut net = DataPetriNet::new();
    net.add_place(Place::with_id_label("start", 1)).unwrap();
    net.add_place(Place::with_id_label("end", 0)).unwrap();
    net.add_transition(Transition::new("holiday")).unwrap();
    net.add_connection("start", "holiday", "end").unwrap();
    net
}

pub fn lazy_day() -> ActivityPattern {
    ActivityPattern::new(lazy_day_net(), "lazy day").unwrap()
}

pub fn diligent_day() -> ActivityPattern {
    ActivityPattern::new(diligent_day_net(), "diligent day").unwrap()
}

pub fn holiday() -> ActivityPattern {
    ActivityPattern::new(holiday_net(), "holiday").unwrap()
}

/// A two-place, one-transition workflow net labelled with its activity.
pub fn single(activity: &str) -> ActivityPattern {
    let mut net = DataPetriNet::new();
    net.add_place(Place::with_id_label("start", 0)).unwrap();
    net.add_place(Place::with_id_label("end", 0)).unwrap();
    net.add_transition(Transition::new(activity)).unwrap();
    net.add_connection("start", activity, "end").unwrap();
    ActivityPattern::new(net, activity).unwrap()
}
