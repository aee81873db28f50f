//! Cross-reference linking between siblings and their subtrees.
//!
//! A fact recorded for one identifier governs everything reachable below it,
//! so each link is spread over the node's forward closure. All insertions are
//! duplicate-free and linking a parent twice leaves the registry unchanged.

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::facts::AnnotationFacts;
use crate::core::registry::Registry;
use crate::core::types::{NodeId, TryBranch};

/// `start` followed by every node reachable through goal and plan children,
/// depth first, each listed once.
pub fn forward_closure(registry: &Registry, start: NodeId) -> Vec<NodeId> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        let children: Vec<NodeId> = registry[id].children().collect();
        stack.extend(children.into_iter().rev());
    }
    order
}

/// Resolve alternatives, try links, optional markers and cardinalities for
/// every direct child of `parent`.
pub fn link_children(registry: &mut Registry, facts: &AnnotationFacts, parent: NodeId) {
    let children: Vec<NodeId> = registry[parent].children().collect();
    for child in children {
        let el_id = registry[child].el_id.clone();
        link_alternatives(registry, facts, parent, child, &el_id);
        link_try(registry, facts, parent, child, &el_id);
        propagate_markers(registry, facts, child, &el_id);
    }
}

fn link_alternatives(
    registry: &mut Registry,
    facts: &AnnotationFacts,
    parent: NodeId,
    child: NodeId,
    el_id: &str,
) {
    let Some(alternatives) = facts.alternatives.get(el_id) else {
        return;
    };
    let closure = forward_closure(registry, child);
    for alt_el_id in alternatives {
        let Some(alternative) = resolve(registry, parent, alt_el_id, "alternative") else {
            continue;
        };
        for node in &closure {
            let entry = registry[*node].alternatives.entry(child).or_default();
            if !entry.contains(&alternative) {
                entry.push(alternative);
            }
        }
        for node in forward_closure(registry, alternative) {
            let firsts = &mut registry[node].first_alternatives;
            if !firsts.contains(&child) {
                firsts.push(child);
            }
        }
    }
}

fn link_try(
    registry: &mut Registry,
    facts: &AnnotationFacts,
    parent: NodeId,
    child: NodeId,
    el_id: &str,
) {
    let Some(link) = facts.tries.get(el_id) else {
        return;
    };
    let closure = forward_closure(registry, child);
    let branches = [
        (link.success.as_deref(), TryBranch::Success),
        (link.failure.as_deref(), TryBranch::Failure),
    ];
    for (target, branch) in branches {
        let Some(target) = target else {
            continue;
        };
        let Some(target) = resolve(registry, parent, target, "try branch") else {
            continue;
        };
        for node in &closure {
            match branch {
                TryBranch::Success => registry[*node].try_success = Some(target),
                TryBranch::Failure => registry[*node].try_failure = Some(target),
            }
        }
        for node in forward_closure(registry, target) {
            registry[node].try_original = Some(child);
            registry[node].success_try = Some(branch);
        }
    }
}

fn propagate_markers(registry: &mut Registry, facts: &AnnotationFacts, child: NodeId, el_id: &str) {
    let optional = facts.optional.get(el_id).copied().unwrap_or(false);
    let cardinality = facts.cardinality_of(el_id);
    if !optional && cardinality.is_none() {
        return;
    }
    for node in forward_closure(registry, child) {
        let container = &mut registry[node];
        container.optional |= optional;
        if cardinality.is_some() {
            container.cardinality = cardinality;
        }
    }
}

/// Sibling of the linked child named `el_id`; targets outside the parent are
/// linked by the parent that owns them.
fn resolve(registry: &Registry, parent: NodeId, el_id: &str, role: &str) -> Option<NodeId> {
    let found = registry.child_by_el_id(parent, el_id);
    if found.is_none() {
        debug!(
            parent = %registry[parent].el_id,
            target = %el_id,
            role,
            "link target outside scope, skipped"
        );
    }
    found
}
