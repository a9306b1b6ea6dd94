//! Step-bounded simulation runs over a [`DataPetriNet`].
use log::debug;
use rand::Rng;

use crate::config::SimulationConfig;
use crate::net::{DataPetriNet, Marking, Result, TransitionId};

#[derive(Debug, Clone, Default)]
pub struct SimulationTrace {
    /// Steps in which at least one transition fired.
    pub steps: usize,
    pub fired: Vec<Vec<TransitionId>>,
    pub final_marking: Marking,
}

impl SimulationTrace {
    pub fn fired_transitions(&self) -> impl Iterator<Item = &TransitionId> {
        self.fired.iter().flatten()
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    max_steps: usize,
}

impl Simulator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            max_steps: config.max_steps,
        }
    }

    /// Runs until a step fires nothing or `max_steps` steps have fired.
    pub fn run<R: Rng + ?Sized>(&self, net: &mut DataPetriNet, rng: &mut R) -> Result<SimulationTrace> {
        let mut trace = SimulationTrace::default();
        while trace.steps < self.max_steps {
            let fired = net.simulate_one_timestep(rng)?;
            if fired.is_empty() {
                break;
            }
            trace.steps += 1;
            trace.fired.push(fired);
        }
        debug!("simulation stopped after {} steps", trace.steps);
        trace.final_marking = net.marking();
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::net::{Place, Transition};

    fn chain(length: usize) -> DataPetriNet {
        let mut net = DataPetriNet::new();
        net.add_place(Place::with_id_label("p0", 1)).unwrap();
        for i in 1..=length {
            net.add_place(Place::with_id_label(format!("p{i}"), 0)).unwrap();
            net.add_transition(Transition::new(format!("t{i}"))).unwrap();
            net.add_connection(format!("p{}", i - 1), format!("t{i}"), format!("p{i}"))
                .unwrap();
        }
        net
    }

    #[test]
    fn runs_chain_to_completion() {
        let mut net = chain(3);
        let mut rng = StdRng::seed_from_u64(1);
        let trace = Simulator::new(&SimulationConfig::default())
            .run(&mut net, &mut rng)
            .unwrap();
        assert_eq!(trace.steps, 3);
        assert_eq!(
            trace.fired_transitions().map(|t| t.as_str()).collect::<Vec<_>>(),
            vec!["t1", "t2", "t3"]
        );
        assert_eq!(trace.final_marking.tokens("p3"), 1);
        assert_eq!(trace.final_marking.total(), 1);
    }

    #[test]
    fn stops_at_step_bound() {
        let mut net = chain(3);
        let config = SimulationConfig {
            seed: Some(3),
            max_steps: 2,
        };
        let trace = Simulator::new(&config).run(&mut net, &mut config.rng()).unwrap();
        assert_eq!(trace.steps, 2);
        assert_eq!(trace.final_marking.tokens("p2"), 1);
    }
}
