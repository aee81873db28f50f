//! Raw goal model as delivered by the model provider.
//!
//! Nodes reference their children by full label name within the same actor,
//! so one raw node may be reached from several parents.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Model {
    pub actors: Vec<Actor>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub name: String,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub and: bool,
    #[serde(default)]
    pub or: bool,
    /// Names of decomposed subgoals.
    #[serde(default)]
    pub decomposition: Vec<String>,
    /// Names of plans achieving this goal through means-end links.
    #[serde(default)]
    pub means_end: Vec<String>,
    /// Fulfillment conditions seeded on this goal and inherited downwards.
    #[serde(default)]
    pub conditions: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub and: bool,
    #[serde(default)]
    pub or: bool,
    /// Names of decomposed subtasks.
    #[serde(default)]
    pub decomposition: Vec<String>,
}

/// Read access shared by goals and plans.
pub trait RawElement {
    fn name(&self) -> &str;
    fn is_and(&self) -> bool;
    fn is_or(&self) -> bool;
    fn decomposition(&self) -> &[String];
}

impl RawElement for Goal {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_and(&self) -> bool {
        self.and
    }

    fn is_or(&self) -> bool {
        self.or
    }

    fn decomposition(&self) -> &[String] {
        &self.decomposition
    }
}

impl RawElement for Plan {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_and(&self) -> bool {
        self.and
    }

    fn is_or(&self) -> bool {
        self.or
    }

    fn decomposition(&self) -> &[String] {
        &self.decomposition
    }
}

impl Actor {
    /// Root goals in declaration order.
    pub fn root_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|goal| goal.root)
    }

    pub fn goal(&self, name: &str) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.name == name)
    }

    pub fn plan(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.name == name)
    }
}
