// tests/property_scheduler.rs

mod common;
use crate::common::builders::{Recorder, indexed_graph};

use std::collections::HashSet;

use proptest::prelude::*;

use assetdag::dag::{Scheduler, TaskRunState};
use assetdag::engine::TaskOutcome;
use assetdag::transform::TransformOutput;

// Acyclic by construction: task i may only depend on tasks 0..i.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let deps: HashSet<usize> = if i == 0 {
                        HashSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };
                    let mut deps: Vec<usize> = deps.into_iter().collect();
                    deps.sort_unstable();
                    deps
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn every_task_runs_at_most_once_after_its_prerequisites(
        deps in dag_strategy(10),
        target_seed in any::<usize>(),
        failing_seed in proptest::option::of(any::<usize>()),
        pick_seed in any::<u64>(),
    ) {
        let rec = Recorder::new();
        let graph = indexed_graph(&rec, &deps).unwrap();
        let scheduler = Scheduler::new(graph);

        let target = format!("t{}", target_seed % deps.len());
        let failing = failing_seed.map(|s| format!("t{}", s % deps.len()));
        let participants: HashSet<String> =
            scheduler.graph().prerequisite_closure(&target);

        let mut run = scheduler.begin(&target).unwrap();
        let mut running: Vec<String> = Vec::new();
        let mut dispatched: Vec<String> = Vec::new();
        let mut done: HashSet<String> = HashSet::new();

        let step = run.start();
        for t in step.newly_scheduled {
            running.push(t.name);
        }

        let mut pick = pick_seed;
        let mut steps = 0;
        while !running.is_empty() {
            steps += 1;
            prop_assert!(steps < 1000, "simulation did not terminate");

            // Complete an arbitrary running task.
            let idx = (pick as usize) % running.len();
            pick = pick.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let task = running.remove(idx);

            for prereq in scheduler.graph().prerequisites_of(&task) {
                prop_assert!(done.contains(prereq), "{} ran before {}", task, prereq);
            }
            prop_assert!(!dispatched.contains(&task), "{} dispatched twice", task);
            dispatched.push(task.clone());

            let outcome = if failing.as_deref() == Some(task.as_str()) {
                TaskOutcome::Failed("scripted".into())
            } else {
                done.insert(task.clone());
                TaskOutcome::Success(TransformOutput::default())
            };

            let step = run.handle_completion(&task, outcome);
            for t in step.newly_scheduled {
                prop_assert!(participants.contains(&t.name));
                running.push(t.name);
            }
        }

        prop_assert!(run.is_finished());
        for name in &participants {
            let state = run.state_of(name);
            prop_assert!(
                !matches!(state, TaskRunState::Pending | TaskRunState::Running),
                "{} left in {:?}", name, state
            );
        }
        if run.failure().is_none() {
            prop_assert_eq!(dispatched.len(), participants.len());
        }
    }
}
