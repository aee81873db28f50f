//! Per-actor container arena.
//!
//! Containers are addressed by [`NodeId`] handles. Parents hold handles, so a
//! raw node reachable through several decomposition paths is represented by
//! one container shared by all of its parents. Goals and plans are deduplicated
//! by their full label name in separate indexes.

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use crate::core::error::ModelError;
use crate::core::label::parse_label;
use crate::core::types::{
    Cardinality, Decomposition, GoalType, NodeId, TimeCoords, TryBranch,
};

/// Goal-only attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GoalAttrs {
    pub goal_type: GoalType,
    /// Goal lies inside the generation scope; its means-end plans are expanded.
    pub included: bool,
    pub is_root: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Goal(GoalAttrs),
    Plan,
}

/// One raw goal or plan plus everything derived for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub el_id: String,
    pub name: String,
    pub kind: ContainerKind,
    pub rt_regex: Option<String>,
    pub decomposition: Decomposition,
    /// Decomposed subgoals (goals only).
    pub goals: Vec<NodeId>,
    /// Means-end plans of a goal, or decomposed subtasks of a plan.
    pub plans: Vec<NodeId>,
    pub time: TimeCoords,
    pub cardinality: Option<Cardinality>,
    pub optional: bool,
    /// Alternative sets this node belongs to, keyed by the element that
    /// declared them.
    pub alternatives: BTreeMap<NodeId, Vec<NodeId>>,
    /// Elements that consider this node (or its subtree root) an alternative.
    pub first_alternatives: Vec<NodeId>,
    pub try_success: Option<NodeId>,
    pub try_failure: Option<NodeId>,
    pub try_original: Option<NodeId>,
    pub success_try: Option<TryBranch>,
    pub fulfillment_conditions: Vec<String>,
}

impl Container {
    fn new(name: &str, kind: ContainerKind) -> Result<Self, ModelError> {
        let label = parse_label(name)?;
        Ok(Self {
            el_id: label.el_id,
            name: name.to_string(),
            kind,
            rt_regex: label.annotation,
            decomposition: Decomposition::None,
            goals: Vec::new(),
            plans: Vec::new(),
            time: TimeCoords::default(),
            cardinality: None,
            optional: false,
            alternatives: BTreeMap::new(),
            first_alternatives: Vec::new(),
            try_success: None,
            try_failure: None,
            try_original: None,
            success_try: None,
            fulfillment_conditions: Vec::new(),
        })
    }

    pub fn is_goal(&self) -> bool {
        matches!(self.kind, ContainerKind::Goal(_))
    }

    pub fn goal_attrs(&self) -> Option<&GoalAttrs> {
        match &self.kind {
            ContainerKind::Goal(attrs) => Some(attrs),
            ContainerKind::Plan => None,
        }
    }

    pub fn goal_attrs_mut(&mut self) -> Option<&mut GoalAttrs> {
        match &mut self.kind {
            ContainerKind::Goal(attrs) => Some(attrs),
            ContainerKind::Plan => None,
        }
    }

    /// Direct children, subgoals first.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.goals.iter().chain(self.plans.iter()).copied()
    }

    /// Append conditions not already present, keeping their order.
    pub fn add_fulfillment_conditions(&mut self, conditions: &[String]) {
        for condition in conditions {
            if !self.fulfillment_conditions.contains(condition) {
                self.fulfillment_conditions.push(condition.clone());
            }
        }
    }
}

/// Node pool of one actor.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    agent_name: String,
    nodes: Vec<Container>,
    goal_index: BTreeMap<String, NodeId>,
    plan_index: BTreeMap<String, NodeId>,
    roots: Vec<NodeId>,
}

impl Registry {
    pub fn new(actor_name: &str) -> Self {
        Self {
            agent_name: adjust_name(actor_name),
            ..Self::default()
        }
    }

    /// Actor name reduced to `[A-Za-z0-9_]`, usable as a module identifier.
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Return the goal container for `name`, creating it on first sight.
    ///
    /// The flag is true when the container was created by this call.
    pub fn obtain_goal(
        &mut self,
        name: &str,
        goal_type: GoalType,
    ) -> Result<(NodeId, bool), ModelError> {
        if let Some(id) = self.goal_index.get(name) {
            return Ok((*id, false));
        }
        let kind = ContainerKind::Goal(GoalAttrs {
            goal_type,
            ..GoalAttrs::default()
        });
        let id = self.push(Container::new(name, kind)?);
        self.goal_index.insert(name.to_string(), id);
        Ok((id, true))
    }

    /// Return the plan container for `name`, creating it on first sight.
    pub fn obtain_plan(&mut self, name: &str) -> Result<(NodeId, bool), ModelError> {
        if let Some(id) = self.plan_index.get(name) {
            return Ok((*id, false));
        }
        let id = self.push(Container::new(name, ContainerKind::Plan)?);
        self.plan_index.insert(name.to_string(), id);
        Ok((id, true))
    }

    fn push(&mut self, container: Container) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(container);
        id
    }

    pub fn add_root(&mut self, id: NodeId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        if let Some(attrs) = self.nodes[id.0].goal_attrs_mut() {
            attrs.is_root = true;
        }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All containers in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Container)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, container)| (NodeId(index), container))
    }

    pub fn goals(&self) -> impl Iterator<Item = (NodeId, &Container)> {
        self.iter().filter(|(_, container)| container.is_goal())
    }

    pub fn plans(&self) -> impl Iterator<Item = (NodeId, &Container)> {
        self.iter().filter(|(_, container)| !container.is_goal())
    }

    /// First goal container with identifier `el_id`.
    pub fn find_goal(&self, el_id: &str) -> Option<NodeId> {
        self.goals()
            .find(|(_, container)| container.el_id == el_id)
            .map(|(id, _)| id)
    }

    /// First plan container with identifier `el_id`.
    pub fn find_plan(&self, el_id: &str) -> Option<NodeId> {
        self.plans()
            .find(|(_, container)| container.el_id == el_id)
            .map(|(id, _)| id)
    }

    /// Direct child of `parent` carrying `el_id`, subgoals searched first.
    pub fn child_by_el_id(&self, parent: NodeId, el_id: &str) -> Option<NodeId> {
        self[parent]
            .children()
            .find(|child| self[*child].el_id == el_id)
    }
}

impl Index<NodeId> for Registry {
    type Output = Container;

    fn index(&self, id: NodeId) -> &Container {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Registry {
    fn index_mut(&mut self, id: NodeId) -> &mut Container {
        &mut self.nodes[id.0]
    }
}

fn adjust_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
