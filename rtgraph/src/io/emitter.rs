//! Emission of finished actor graphs.
//!
//! An [`Emitter`] receives each actor's registry exactly once, after build and
//! linking succeeded. [`JsonEmitter`] writes a snapshot of the graph where
//! node handles are replaced by element identifiers, one file per actor.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::registry::{Container, ContainerKind, Registry};
use crate::core::types::{Cardinality, Decomposition, GoalType, NodeId, TimeCoords, TryBranch};
use crate::model::Plan;

/// Consumer of finished actor graphs.
pub trait Emitter {
    /// Consume one actor's registry together with the actor's flat plan list.
    fn emit(&mut self, registry: &Registry, plans: &[Plan]) -> Result<()>;
}

/// Serializable view of one actor's graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub agent: String,
    pub roots: Vec<String>,
    pub goals: Vec<NodeSnapshot>,
    pub plans: Vec<NodeSnapshot>,
    /// Names of every raw plan declared by the actor, expanded or not.
    pub actor_plans: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub el_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<GoalType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<bool>,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt_regex: Option<String>,
    pub decomposition: Decomposition,
    pub goals: Vec<String>,
    pub plans: Vec<String>,
    #[serde(flatten)]
    pub time: TimeCoords,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    pub optional: bool,
    pub alternatives: BTreeMap<String, Vec<String>>,
    pub first_alternatives: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_failure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_try: Option<TryBranch>,
    pub fulfillment_conditions: Vec<String>,
}

impl GraphSnapshot {
    pub fn from_registry(registry: &Registry, plans: &[Plan]) -> Self {
        let ids = |handles: &[NodeId]| -> Vec<String> {
            handles
                .iter()
                .map(|handle| registry[*handle].el_id.clone())
                .collect()
        };
        Self {
            agent: registry.agent_name().to_string(),
            roots: ids(registry.roots()),
            goals: registry
                .goals()
                .map(|(_, container)| NodeSnapshot::new(registry, container))
                .collect(),
            plans: registry
                .plans()
                .map(|(_, container)| NodeSnapshot::new(registry, container))
                .collect(),
            actor_plans: plans.iter().map(|plan| plan.name.clone()).collect(),
        }
    }

    /// Snapshot of the goal or plan with `el_id`, goals searched first.
    pub fn node(&self, el_id: &str) -> Option<&NodeSnapshot> {
        self.goals
            .iter()
            .chain(self.plans.iter())
            .find(|node| node.el_id == el_id)
    }
}

impl NodeSnapshot {
    fn new(registry: &Registry, container: &Container) -> Self {
        let el_id = |handle: NodeId| registry[handle].el_id.clone();
        let el_ids = |handles: &[NodeId]| handles.iter().copied().map(el_id).collect::<Vec<_>>();
        let attrs = match container.kind {
            ContainerKind::Goal(attrs) => Some(attrs),
            ContainerKind::Plan => None,
        };
        Self {
            el_id: container.el_id.clone(),
            name: container.name.clone(),
            goal_type: attrs.map(|attrs| attrs.goal_type),
            included: attrs.map(|attrs| attrs.included),
            is_root: attrs.is_some_and(|attrs| attrs.is_root),
            rt_regex: container.rt_regex.clone(),
            decomposition: container.decomposition,
            goals: el_ids(&container.goals),
            plans: el_ids(&container.plans),
            time: container.time,
            cardinality: container.cardinality,
            optional: container.optional,
            alternatives: container
                .alternatives
                .iter()
                .map(|(key, values)| (el_id(*key), el_ids(values)))
                .collect(),
            first_alternatives: el_ids(&container.first_alternatives),
            try_success: container.try_success.map(el_id),
            try_failure: container.try_failure.map(el_id),
            try_original: container.try_original.map(el_id),
            success_try: container.success_try,
            fulfillment_conditions: container.fulfillment_conditions.clone(),
        }
    }
}

/// Writes `<output_dir>/<agent>.json` per actor.
#[derive(Debug)]
pub struct JsonEmitter {
    output_dir: PathBuf,
    pretty: bool,
    written: Vec<PathBuf>,
}

impl JsonEmitter {
    pub fn new(output_dir: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            pretty,
            written: Vec::new(),
        }
    }

    /// Files written so far, in emission order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn path_for(&self, agent: &str) -> PathBuf {
        self.output_dir.join(format!("{}.json", agent))
    }
}

impl Emitter for JsonEmitter {
    fn emit(&mut self, registry: &Registry, plans: &[Plan]) -> Result<()> {
        let snapshot = GraphSnapshot::from_registry(registry, plans);
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("create directory {}", self.output_dir.display()))?;
        let path = self.path_for(&snapshot.agent);
        if self.written.contains(&path) {
            bail!(
                "agent '{}' was already written to {} in this run",
                snapshot.agent,
                path.display()
            );
        }
        write_snapshot(&path, &snapshot, self.pretty)?;
        debug!(agent = %snapshot.agent, path = %path.display(), "graph written");
        self.written.push(path);
        Ok(())
    }
}

/// Read a snapshot previously written by [`JsonEmitter`].
pub fn read_snapshot(path: &Path) -> Result<GraphSnapshot> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read graph {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse graph {}", path.display()))
}

fn write_snapshot(path: &Path, snapshot: &GraphSnapshot, pretty: bool) -> Result<()> {
    let mut buf = if pretty {
        serde_json::to_string_pretty(snapshot)
    } else {
        serde_json::to_string(snapshot)
    }
    .context("serialize graph json")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write graph {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::new("Smart Home");
        let (g1, _) = registry.obtain_goal("G1: top [T1]", GoalType::Achieve).expect("goal");
        let (t1, _) = registry.obtain_plan("T1: act").expect("plan");
        registry[g1].plans.push(t1);
        registry[g1].decomposition = Decomposition::MeansEnd;
        registry[t1].try_original = Some(g1);
        registry.add_root(g1);
        registry
    }

    #[test]
    fn snapshot_replaces_handles_with_identifiers() {
        let snapshot = GraphSnapshot::from_registry(&registry(), &[]);
        assert_eq!(snapshot.agent, "Smart_Home");
        assert_eq!(snapshot.roots, vec!["G1".to_string()]);
        let goal = snapshot.node("G1").expect("goal");
        assert_eq!(goal.plans, vec!["T1".to_string()]);
        assert_eq!(goal.included, Some(false));
        assert!(goal.is_root);
        let plan = snapshot.node("T1").expect("plan");
        assert_eq!(plan.goal_type, None);
        assert_eq!(plan.try_original.as_deref(), Some("G1"));
    }

    #[test]
    fn json_emitter_writes_one_file_per_agent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("out");
        let mut emitter = JsonEmitter::new(&out, true);
        let plans = vec![Plan {
            name: "T1: act".to_string(),
            and: false,
            or: false,
            decomposition: Vec::new(),
        }];
        emitter.emit(&registry(), &plans).expect("emit");

        assert_eq!(emitter.written(), &[out.join("Smart_Home.json")]);
        let snapshot = read_snapshot(&out.join("Smart_Home.json")).expect("read");
        assert_eq!(snapshot, GraphSnapshot::from_registry(&registry(), &plans));
        assert_eq!(snapshot.actor_plans, vec!["T1: act".to_string()]);
    }

    #[test]
    fn colliding_agent_names_do_not_overwrite() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut emitter = JsonEmitter::new(temp.path(), false);
        emitter.emit(&registry(), &[]).expect("first actor");

        let mut other = Registry::new("Smart-Home");
        other.obtain_goal("G7: other", GoalType::Achieve).expect("goal");
        let err = emitter.emit(&other, &[]).expect_err("collision");
        assert!(format!("{:#}", err).contains("agent 'Smart_Home'"), "{err:#}");

        let snapshot = read_snapshot(&temp.path().join("Smart_Home.json")).expect("read");
        assert!(snapshot.node("G1").is_some());
        assert!(snapshot.node("G7").is_none());
        assert_eq!(emitter.written().len(), 1);
    }
}
