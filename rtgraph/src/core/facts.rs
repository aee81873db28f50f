//! Identifier-keyed fact tables extracted from runtime annotations.
//!
//! One [`AnnotationFacts`] value is produced per annotated node and merged
//! into the accumulator owned by the actor's build pass. All maps are ordered
//! so iteration (and therefore linking) is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::annotation::Expr;
use crate::core::types::{Cardinality, TemporalClass};

/// Temporal flags of one identifier. Neither flag set means trivial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemporalFlags {
    pub parallel: bool,
    pub sequential: bool,
}

/// Success and failure branches of a `try(..)`; `None` stands for `skip`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TryLink {
    pub success: Option<String>,
    pub failure: Option<String>,
}

/// The five fact tables of the annotation language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationFacts {
    pub temporal: BTreeMap<String, TemporalFlags>,
    pub cardinality: BTreeMap<String, Cardinality>,
    pub alternatives: BTreeMap<String, BTreeSet<String>>,
    pub tries: BTreeMap<String, TryLink>,
    pub optional: BTreeMap<String, bool>,
}

impl AnnotationFacts {
    /// Extract the facts stated by one parsed annotation.
    pub fn from_expr(expr: &Expr) -> Self {
        let mut facts = AnnotationFacts::default();
        facts.collect(expr);
        facts
    }

    /// Fold `other` into `self` without discarding earlier facts.
    ///
    /// Flags are OR-ed and alternative sets unioned; cardinalities and try
    /// links are keyed per identifier and the later entry wins.
    pub fn merge(&mut self, other: AnnotationFacts) {
        for (id, flags) in other.temporal {
            let entry = self.temporal.entry(id).or_default();
            entry.parallel |= flags.parallel;
            entry.sequential |= flags.sequential;
        }
        self.cardinality.extend(other.cardinality);
        for (id, alternatives) in other.alternatives {
            self.alternatives.entry(id).or_default().extend(alternatives);
        }
        self.tries.extend(other.tries);
        for (id, optional) in other.optional {
            let entry = self.optional.entry(id).or_default();
            *entry |= optional;
        }
    }

    /// Temporal class of `el_id`; sequential wins over parallel.
    pub fn classify(&self, el_id: &str) -> TemporalClass {
        match self.temporal.get(el_id) {
            Some(flags) if flags.sequential => TemporalClass::Sequential,
            Some(flags) if flags.parallel => TemporalClass::Parallel,
            _ => TemporalClass::Trivial,
        }
    }

    pub fn cardinality_of(&self, el_id: &str) -> Option<Cardinality> {
        self.cardinality.get(el_id).copied()
    }

    /// True if `el_id` keys a recorded alternative set.
    pub fn has_alternatives(&self, el_id: &str) -> bool {
        self.alternatives
            .get(el_id)
            .is_some_and(|alternatives| !alternatives.is_empty())
    }

    fn collect(&mut self, expr: &Expr) {
        match expr {
            Expr::Id(_) | Expr::Skip => {}
            Expr::Group(members) => {
                for member in members {
                    self.collect(member);
                }
            }
            Expr::Seq(steps) => {
                for step in steps.iter().skip(1) {
                    for id in leading(step) {
                        self.temporal.entry(id).or_default().sequential = true;
                    }
                }
                for step in steps {
                    self.collect(step);
                }
            }
            Expr::Par(branches) => {
                for branch in branches.iter().skip(1) {
                    for id in leading(branch) {
                        self.temporal.entry(id).or_default().parallel = true;
                    }
                }
                for branch in branches {
                    self.collect(branch);
                }
            }
            Expr::Alt(branches) => {
                let heads: Vec<Vec<String>> = branches.iter().map(leading).collect();
                for (index, head) in heads.iter().enumerate() {
                    let others: BTreeSet<String> = heads
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != index)
                        .flat_map(|(_, ids)| ids.iter().cloned())
                        .collect();
                    if others.is_empty() {
                        continue;
                    }
                    for id in head {
                        self.alternatives
                            .entry(id.clone())
                            .or_default()
                            .extend(others.iter().cloned());
                    }
                }
                for branch in branches {
                    self.collect(branch);
                }
            }
            Expr::Opt(inner) => {
                let mut ids = Vec::new();
                identifiers(inner, &mut ids);
                for id in ids {
                    self.optional.insert(id, true);
                }
                self.collect(inner);
            }
            Expr::Card { body, kind, count } => {
                if let Expr::Id(id) = body.as_ref() {
                    self.cardinality.insert(
                        id.clone(),
                        Cardinality {
                            kind: *kind,
                            count: *count,
                        },
                    );
                }
            }
            Expr::Try {
                body,
                success,
                failure,
            } => {
                let Expr::Id(id) = body.as_ref() else {
                    return;
                };
                let link = TryLink {
                    success: branch_id(success),
                    failure: branch_id(failure),
                };
                for branch in [&link.success, &link.failure].into_iter().flatten() {
                    self.temporal.entry(branch.clone()).or_default().sequential = true;
                }
                self.tries.insert(id.clone(), link);
            }
        }
    }
}

/// Identifiers that start executing when `expr` starts.
fn leading(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Id(id) => vec![id.clone()],
        Expr::Skip => Vec::new(),
        Expr::Seq(items) | Expr::Par(items) => items.first().map(leading).unwrap_or_default(),
        Expr::Group(items) | Expr::Alt(items) => items.iter().flat_map(leading).collect(),
        Expr::Opt(inner) => leading(inner),
        Expr::Card { body, .. } | Expr::Try { body, .. } => leading(body),
    }
}

fn identifiers(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Id(id) => out.push(id.clone()),
        Expr::Skip => {}
        Expr::Group(items) | Expr::Seq(items) | Expr::Par(items) | Expr::Alt(items) => {
            for item in items {
                identifiers(item, out);
            }
        }
        Expr::Opt(inner) | Expr::Card { body: inner, .. } => identifiers(inner, out),
        Expr::Try {
            body,
            success,
            failure,
        } => {
            identifiers(body, out);
            identifiers(success, out);
            identifiers(failure, out);
        }
    }
}

fn branch_id(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Id(id) => Some(id.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotation::parse_annotation;
    use crate::core::types::CardinalityKind;

    fn facts(text: &str) -> AnnotationFacts {
        parse_annotation("G1", text).expect("parse")
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn sequence_marks_every_step_after_the_first() {
        let facts = facts("G1.1;G1.2;G1.3");
        assert_eq!(facts.classify("G1.1"), TemporalClass::Trivial);
        assert_eq!(facts.classify("G1.2"), TemporalClass::Sequential);
        assert_eq!(facts.classify("G1.3"), TemporalClass::Sequential);
    }

    #[test]
    fn parallel_marks_forked_branches() {
        let facts = facts("G1.1#G1.2;G1.3");
        assert_eq!(facts.classify("G1.1"), TemporalClass::Trivial);
        assert_eq!(facts.classify("G1.2"), TemporalClass::Parallel);
        assert_eq!(facts.classify("G1.3"), TemporalClass::Sequential);
    }

    #[test]
    fn group_members_stay_unclassified() {
        let facts = facts("G1.1G1.2");
        assert!(facts.temporal.is_empty());
        assert_eq!(facts.classify("G1.2"), TemporalClass::Trivial);
    }

    #[test]
    fn alternatives_are_symmetric() {
        let facts = facts("G1.1|G1.2|G1.3");
        assert_eq!(facts.alternatives["G1.1"], set(&["G1.2", "G1.3"]));
        assert_eq!(facts.alternatives["G1.2"], set(&["G1.1", "G1.3"]));
        assert_eq!(facts.alternatives["G1.3"], set(&["G1.1", "G1.2"]));
    }

    #[test]
    fn alternatives_after_a_step_are_sequential() {
        let facts = facts("G1.1;(G1.2|G1.3)");
        assert_eq!(facts.classify("G1.2"), TemporalClass::Sequential);
        assert_eq!(facts.classify("G1.3"), TemporalClass::Sequential);
        assert!(facts.has_alternatives("G1.2"));
        assert!(!facts.has_alternatives("G1.1"));
    }

    #[test]
    fn try_records_branches_and_orders_them_after_the_body() {
        let facts = facts("try(T1.1)?T1.2:skip");
        assert_eq!(
            facts.tries["T1.1"],
            TryLink {
                success: Some("T1.2".to_string()),
                failure: None,
            }
        );
        assert_eq!(facts.classify("T1.2"), TemporalClass::Sequential);
    }

    #[test]
    fn opt_marks_every_inner_identifier() {
        let facts = facts("G1.1;opt(G1.2#G1.3)");
        assert_eq!(facts.optional.get("G1.2"), Some(&true));
        assert_eq!(facts.optional.get("G1.3"), Some(&true));
        assert_eq!(facts.optional.get("G1.1"), None);
    }

    #[test]
    fn cardinality_is_recorded_per_identifier() {
        let facts = facts("G1.1@3;G1.2+2");
        assert_eq!(
            facts.cardinality_of("G1.1"),
            Some(Cardinality {
                kind: CardinalityKind::Seq,
                count: 3,
            })
        );
        assert_eq!(
            facts.cardinality_of("G1.2").map(|card| card.kind),
            Some(CardinalityKind::Par)
        );
    }

    #[test]
    fn merge_unions_instead_of_overwriting() {
        let mut acc = facts("G1.1|G1.2");
        acc.merge(parse_annotation("G2", "G1.1|G2.1").expect("parse"));
        acc.merge(parse_annotation("G3", "G3.1#G1.1").expect("parse"));
        assert_eq!(acc.alternatives["G1.1"], set(&["G1.2", "G2.1"]));
        assert_eq!(acc.classify("G1.1"), TemporalClass::Parallel);
        assert_eq!(acc.alternatives["G1.2"], set(&["G1.1"]));
    }
}
