//! Test-only helpers for constructing raw models and capturing emissions.

use anyhow::Result;

use crate::core::registry::Registry;
use crate::io::emitter::{Emitter, GraphSnapshot};
use crate::model::{Actor, Goal, Model, Plan};

/// Create a goal with no flags and no children.
pub fn goal(name: &str) -> Goal {
    Goal {
        name: name.to_string(),
        root: false,
        and: false,
        or: false,
        decomposition: Vec::new(),
        means_end: Vec::new(),
        conditions: Vec::new(),
    }
}

/// Create a root goal.
pub fn root_goal(name: &str) -> Goal {
    Goal {
        root: true,
        ..goal(name)
    }
}

/// Create an AND-decomposed goal over the named subgoals.
pub fn and_goal(name: &str, subgoals: &[&str]) -> Goal {
    Goal {
        and: true,
        decomposition: names(subgoals),
        ..goal(name)
    }
}

/// Create an OR-decomposed goal over the named subgoals.
pub fn or_goal(name: &str, subgoals: &[&str]) -> Goal {
    Goal {
        or: true,
        decomposition: names(subgoals),
        ..goal(name)
    }
}

/// Create a goal refined by means-end into the named plans.
pub fn means_end_goal(name: &str, plans: &[&str]) -> Goal {
    Goal {
        means_end: names(plans),
        ..goal(name)
    }
}

/// Create a leaf plan.
pub fn plan(name: &str) -> Plan {
    Plan {
        name: name.to_string(),
        and: false,
        or: false,
        decomposition: Vec::new(),
    }
}

/// Create an AND-decomposed plan over the named subtasks.
pub fn and_plan(name: &str, subtasks: &[&str]) -> Plan {
    Plan {
        and: true,
        decomposition: names(subtasks),
        ..plan(name)
    }
}

pub fn actor(name: &str, goals: Vec<Goal>, plans: Vec<Plan>) -> Actor {
    Actor {
        name: name.to_string(),
        goals,
        plans,
    }
}

pub fn model(actors: Vec<Actor>) -> Model {
    Model { actors }
}

/// Emitter that keeps every snapshot in memory.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    pub snapshots: Vec<GraphSnapshot>,
}

impl Emitter for RecordingEmitter {
    fn emit(&mut self, registry: &Registry, plans: &[Plan]) -> Result<()> {
        self.snapshots.push(GraphSnapshot::from_registry(registry, plans));
        Ok(())
    }
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
