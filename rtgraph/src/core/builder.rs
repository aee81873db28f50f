//! Depth-first construction of one actor's container graph.
//!
//! Goals and plans share a single child loop: each child is obtained from the
//! registry (deduplicated by name), placed in time relative to its siblings,
//! expanded on first visit, and finally validated and linked together with
//! its siblings. The annotation facts of every expanded node accumulate in one
//! table owned by the pass and dropped with it.

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::annotation::parse_annotation;
use crate::core::error::ModelError;
use crate::core::facts::AnnotationFacts;
use crate::core::label::{compare_el_ids, parse_label};
use crate::core::linker::link_children;
use crate::core::registry::Registry;
use crate::core::types::{
    CardinalityKind, Decomposition, GoalType, NodeId, TemporalClass, TimeCoords,
};
use crate::core::validator::{
    GoalShape, PlanShape, TaskShape, check_unique_goal_ids, decomposition_kind, validate_goal,
    validate_plan,
};
use crate::model::{Actor, Goal, Plan, RawElement};

/// Build, validate and link the container graph of `actor`.
///
/// `selection` holds goal identifiers whose means-end plans are expanded; an
/// empty selection expands every goal.
pub fn build_actor(actor: &Actor, selection: &BTreeSet<String>) -> Result<Registry, ModelError> {
    let labels = actor
        .goals
        .iter()
        .map(|goal| parse_label(&goal.name))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique_goal_ids(&actor.name, labels.iter().map(|label| label.el_id.as_str()))?;

    let mut builder = GraphBuilder {
        actor,
        selection,
        registry: Registry::new(&actor.name),
        facts: AnnotationFacts::default(),
    };
    for goal in actor.root_goals() {
        let (id, fresh) = builder.registry.obtain_goal(&goal.name, GoalType::Achieve)?;
        builder.registry.add_root(id);
        if fresh {
            builder.expand_goal(id, goal, false)?;
        }
    }
    Ok(builder.registry)
}

#[derive(Clone, Copy)]
enum RawNode<'a> {
    Goal(&'a Goal),
    Plan(&'a Plan),
}

struct GraphBuilder<'a> {
    actor: &'a Actor,
    selection: &'a BTreeSet<String>,
    registry: Registry,
    facts: AnnotationFacts,
}

impl<'a> GraphBuilder<'a> {
    fn expand_goal(&mut self, id: NodeId, goal: &'a Goal, inherited: bool) -> Result<(), ModelError> {
        let el_id = self.registry[id].el_id.clone();
        let included = inherited || self.selection.is_empty() || self.selection.contains(&el_id);
        if let Some(attrs) = self.registry[id].goal_attrs_mut() {
            attrs.included = included;
        }
        self.registry[id].add_fulfillment_conditions(&goal.conditions);
        debug!(el_id = %el_id, included, "expanding goal");

        self.absorb_annotation(id)?;
        let mut decomposition = raw_decomposition(&el_id, goal)?;
        let subgoals = self.resolve_goals(goal.name(), goal.decomposition())?;
        let tasks = self.resolve_plans(goal.name(), &goal.means_end)?;
        if included && !tasks.is_empty() {
            decomposition = Decomposition::MeansEnd;
        }
        self.registry[id].decomposition = decomposition;

        let mut children: Vec<RawNode<'a>> = subgoals.into_iter().map(RawNode::Goal).collect();
        if included {
            children.extend(tasks.iter().copied().map(RawNode::Plan));
        }
        self.expand_children(id, &children, included)?;

        self.check_goal(id, &tasks)?;
        link_children(&mut self.registry, &self.facts, id);
        Ok(())
    }

    fn expand_plan(&mut self, id: NodeId, plan: &'a Plan, inherited: bool) -> Result<(), ModelError> {
        let el_id = self.registry[id].el_id.clone();
        debug!(el_id = %el_id, "expanding plan");

        self.absorb_annotation(id)?;
        let mut decomposition = raw_decomposition(&el_id, plan)?;
        let subtasks = self.resolve_plans(plan.name(), plan.decomposition())?;
        if decomposition == Decomposition::None && !subtasks.is_empty() {
            decomposition = Decomposition::Or;
        }
        self.registry[id].decomposition = decomposition;

        let children: Vec<RawNode<'a>> = subtasks.iter().copied().map(RawNode::Plan).collect();
        self.expand_children(id, &children, inherited)?;

        self.check_plan(id, &subtasks)?;
        link_children(&mut self.registry, &self.facts, id);
        Ok(())
    }

    fn expand(&mut self, id: NodeId, node: RawNode<'a>, inherited: bool) -> Result<(), ModelError> {
        match node {
            RawNode::Goal(goal) => self.expand_goal(id, goal, inherited),
            RawNode::Plan(plan) => self.expand_plan(id, plan, inherited),
        }
    }

    fn expand_children(
        &mut self,
        parent: NodeId,
        children: &[RawNode<'a>],
        included: bool,
    ) -> Result<(), ModelError> {
        let start = self.registry[parent].time;
        let conditions = self.registry[parent].fulfillment_conditions.clone();
        for node in children {
            let (child, fresh) = self.attach(parent, *node)?;
            let el_id = self.registry[child].el_id.clone();
            let current = self.registry[parent].time;
            let class = self.facts.classify(&el_id);
            let mut time = match class {
                TemporalClass::Sequential => TimeCoords {
                    prev_time_path: current.time_path,
                    time_path: start.time_path,
                    fut_time_path: current.fut_time_path,
                    time_slot: advance(&el_id, current.time_slot, 1)?,
                },
                TemporalClass::Parallel => TimeCoords {
                    prev_time_path: start.prev_time_path,
                    time_path: advance(&el_id, current.fut_time_path.max(current.time_path), 1)?,
                    fut_time_path: self.registry[child].time.fut_time_path,
                    time_slot: start.time_slot,
                },
                TemporalClass::Trivial => current,
            };
            if let Some(cardinality) = self.facts.cardinality_of(&el_id) {
                if cardinality.kind == CardinalityKind::Seq {
                    time.time_slot = advance(&el_id, time.time_slot, cardinality.count - 1)?;
                }
                self.registry[child].cardinality = Some(cardinality);
            }
            self.registry[child].add_fulfillment_conditions(&conditions);

            if !fresh {
                let merged = self.registry[child].time.merge_max(time);
                self.registry[child].time = merged;
                debug!(el_id = %el_id, "shared node revisited");
                continue;
            }
            self.registry[child].time = time;
            self.expand(child, *node, included)?;

            let placed = self.registry[child].time;
            let holds_slot = class == TemporalClass::Parallel || self.facts.has_alternatives(&el_id);
            let parent_time = &mut self.registry[parent].time;
            parent_time.fut_time_path = placed.time_path.max(placed.fut_time_path);
            if class == TemporalClass::Trivial || !holds_slot {
                parent_time.time_slot = placed.time_slot;
            }
        }
        Ok(())
    }

    /// Obtain the child's container and list it under `parent` once.
    fn attach(&mut self, parent: NodeId, node: RawNode<'a>) -> Result<(NodeId, bool), ModelError> {
        let (child, fresh) = match node {
            RawNode::Goal(goal) => self.registry.obtain_goal(&goal.name, GoalType::Achieve)?,
            RawNode::Plan(plan) => self.registry.obtain_plan(&plan.name)?,
        };
        let siblings = match node {
            RawNode::Goal(_) => &mut self.registry[parent].goals,
            RawNode::Plan(_) => &mut self.registry[parent].plans,
        };
        if !siblings.contains(&child) {
            siblings.push(child);
        }
        Ok((child, fresh))
    }

    fn absorb_annotation(&mut self, id: NodeId) -> Result<(), ModelError> {
        let container = &self.registry[id];
        if let Some(text) = &container.rt_regex {
            let facts = parse_annotation(&container.el_id, text)?;
            self.facts.merge(facts);
        }
        Ok(())
    }

    fn check_goal(&self, id: NodeId, tasks: &[&'a Plan]) -> Result<(), ModelError> {
        let container = &self.registry[id];
        let task_labels = tasks
            .iter()
            .map(|plan| Ok((parse_label(&plan.name)?, plan.decomposition.len())))
            .collect::<Result<Vec<_>, ModelError>>()?;
        let shape = GoalShape {
            el_id: &container.el_id,
            decomposition: container.decomposition,
            annotation: container.rt_regex.as_deref(),
            subgoals: self.child_el_ids(&container.goals),
            tasks: task_labels
                .iter()
                .map(|(label, children)| TaskShape {
                    el_id: &label.el_id,
                    annotated: label.annotation.is_some(),
                    children: *children,
                })
                .collect(),
        };
        validate_goal(&shape)
    }

    /// Checked against the declared subtasks, repeats included.
    fn check_plan(&self, id: NodeId, subtasks: &[&'a Plan]) -> Result<(), ModelError> {
        let container = &self.registry[id];
        let labels = subtasks
            .iter()
            .map(|plan| parse_label(&plan.name))
            .collect::<Result<Vec<_>, _>>()?;
        let shape = PlanShape {
            el_id: &container.el_id,
            decomposition: container.decomposition,
            annotation: container.rt_regex.as_deref(),
            subtasks: labels.iter().map(|label| label.el_id.as_str()).collect(),
        };
        validate_plan(&shape)
    }

    fn child_el_ids(&self, children: &[NodeId]) -> Vec<&str> {
        children
            .iter()
            .map(|child| self.registry[*child].el_id.as_str())
            .collect()
    }

    fn resolve_goals(&self, from: &str, names: &[String]) -> Result<Vec<&'a Goal>, ModelError> {
        let actor = self.actor;
        let goals = names
            .iter()
            .map(|name| actor.goal(name).ok_or_else(|| unknown(from, "goal", name)))
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_el_id(goals)
    }

    fn resolve_plans(&self, from: &str, names: &[String]) -> Result<Vec<&'a Plan>, ModelError> {
        let actor = self.actor;
        let plans = names
            .iter()
            .map(|name| actor.plan(name).ok_or_else(|| unknown(from, "plan", name)))
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_el_id(plans)
    }
}

/// Order raw children by the numeric value of their identifiers.
fn sort_by_el_id<T: RawElement>(items: Vec<&T>) -> Result<Vec<&T>, ModelError> {
    let mut keyed = items
        .into_iter()
        .map(|item| Ok((parse_label(item.name())?.el_id, item)))
        .collect::<Result<Vec<_>, ModelError>>()?;
    keyed.sort_by(|(a, _), (b, _)| compare_el_ids(a, b));
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

fn raw_decomposition<T: RawElement>(el_id: &str, raw: &T) -> Result<Decomposition, ModelError> {
    decomposition_kind(el_id, raw.is_and(), raw.is_or())
}

fn advance(el_id: &str, base: u32, by: u32) -> Result<u32, ModelError> {
    base.checked_add(by).ok_or_else(|| ModelError::TimeOverflow {
        el_id: el_id.to_string(),
    })
}

fn unknown(from: &str, kind: &'static str, name: &str) -> ModelError {
    ModelError::UnknownReference {
        from: from.to_string(),
        kind,
        name: name.to_string(),
    }
}
