//! Per-model orchestration for `rtgraph validate` and `rtgraph generate`.

use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::builder::build_actor;
use crate::core::error::ModelError;
use crate::core::registry::Registry;
use crate::io::emitter::Emitter;
use crate::model::{Actor, Model};

/// Counts reported for one processed actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSummary {
    pub actor: String,
    pub agent: String,
    pub goals: usize,
    pub plans: usize,
}

impl ActorSummary {
    fn new(actor: &Actor, registry: &Registry) -> Self {
        Self {
            actor: actor.name.clone(),
            agent: registry.agent_name().to_string(),
            goals: registry.goals().count(),
            plans: registry.plans().count(),
        }
    }
}

/// Build every actor without emitting anything.
pub fn validate_model(model: &Model, selection: &BTreeSet<String>) -> Result<Vec<ActorSummary>> {
    model
        .actors
        .iter()
        .map(|actor| {
            let registry = build(actor, selection)?;
            Ok(ActorSummary::new(actor, &registry))
        })
        .collect()
}

/// Build every actor and hand each finished graph to `emitter`.
///
/// Actors are processed in declaration order; the first failing actor aborts
/// the run, so nothing is emitted for it or any later actor.
pub fn generate(
    model: &Model,
    selection: &BTreeSet<String>,
    emitter: &mut dyn Emitter,
) -> Result<Vec<ActorSummary>> {
    let mut summaries = Vec::with_capacity(model.actors.len());
    for actor in &model.actors {
        let registry = build(actor, selection)?;
        emitter
            .emit(&registry, &actor.plans)
            .with_context(|| format!("emit actor '{}'", actor.name))?;
        summaries.push(ActorSummary::new(actor, &registry));
    }
    Ok(summaries)
}

/// True if the error chain carries a model rejection.
pub fn is_model_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.downcast_ref::<ModelError>().is_some())
}

fn build(actor: &Actor, selection: &BTreeSet<String>) -> Result<Registry> {
    let started = Instant::now();
    let registry =
        build_actor(actor, selection).with_context(|| format!("build actor '{}'", actor.name))?;
    info!(
        actor = %actor.name,
        goals = registry.goals().count(),
        plans = registry.plans().count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "actor graph built"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        RecordingEmitter, actor, and_goal, goal, means_end_goal, model, plan, root_goal,
    };

    fn two_actors() -> Model {
        let mut top = root_goal("G1: top [G1.1]");
        top.and = true;
        top.decomposition = vec!["G1.1: child".to_string()];
        model(vec![
            actor(
                "Alpha",
                vec![top, means_end_goal("G1.1: child", &["T1: act"])],
                vec![plan("T1: act"), plan("T9: unused")],
            ),
            actor("Beta", vec![root_goal("G1: alone")], vec![]),
        ])
    }

    #[test]
    fn generate_emits_once_per_actor() {
        let mut emitter = RecordingEmitter::default();
        let summaries = generate(&two_actors(), &BTreeSet::new(), &mut emitter).expect("generate");

        assert_eq!(emitter.snapshots.len(), 2);
        assert_eq!(emitter.snapshots[0].agent, "Alpha");
        assert_eq!(
            emitter.snapshots[0].actor_plans,
            vec!["T1: act".to_string(), "T9: unused".to_string()]
        );
        assert_eq!(
            summaries[0],
            ActorSummary {
                actor: "Alpha".to_string(),
                agent: "Alpha".to_string(),
                goals: 2,
                plans: 1,
            }
        );
        assert_eq!(summaries[1].goals, 1);
    }

    #[test]
    fn failing_actor_stops_emission() {
        let mut broken = two_actors();
        broken.actors[0].goals.push(goal("G1.1: duplicate"));
        let mut emitter = RecordingEmitter::default();
        let err = generate(&broken, &BTreeSet::new(), &mut emitter).expect_err("must fail");

        assert!(emitter.snapshots.is_empty());
        assert!(is_model_error(&err));
        assert!(format!("{:#}", err).contains("build actor 'Alpha'"));
    }

    #[test]
    fn validate_reports_without_emitting() {
        let summaries = validate_model(&two_actors(), &BTreeSet::new()).expect("validate");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].agent, "Beta");
    }

    #[test]
    fn io_errors_are_not_model_errors() {
        let err = anyhow::anyhow!("disk full").context("emit actor 'Alpha'");
        assert!(!is_model_error(&err));
        let duplicated = actor("A", vec![and_goal("G1: x", &[]), goal("G1: y")], vec![]);
        let rejected = build(&duplicated, &BTreeSet::new()).expect_err("duplicate ids");
        assert!(is_model_error(&rejected));
    }
}
