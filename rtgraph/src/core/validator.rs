//! Structural rules over one node and its direct children.
//!
//! Checks are pure: they read shapes assembled by the builder and fail on the
//! first violated rule. Nothing here mutates the registry.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::ModelError;
use crate::core::types::Decomposition;

/// Identifier mentions; the longest match wins so `G1.11` never counts as `G1.1`.
static ANNOTATION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[GT]\d+(?:\.\d+)*").unwrap());

/// A task as seen from the goal that refines into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskShape<'a> {
    pub el_id: &'a str,
    pub annotated: bool,
    pub children: usize,
}

/// Goal under validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalShape<'a> {
    pub el_id: &'a str,
    pub decomposition: Decomposition,
    pub annotation: Option<&'a str>,
    pub subgoals: Vec<&'a str>,
    /// Means-end tasks declared by the raw goal, whether expanded or not.
    pub tasks: Vec<TaskShape<'a>>,
}

/// Plan under validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanShape<'a> {
    pub el_id: &'a str,
    pub decomposition: Decomposition,
    pub annotation: Option<&'a str>,
    pub subtasks: Vec<&'a str>,
}

/// Map the raw AND/OR flags to a decomposition kind.
pub fn decomposition_kind(el_id: &str, and: bool, or: bool) -> Result<Decomposition, ModelError> {
    match (and, or) {
        (true, true) => Err(ModelError::AndOrConflict {
            el_id: el_id.to_string(),
        }),
        (true, false) => Ok(Decomposition::And),
        (false, true) => Ok(Decomposition::Or),
        (false, false) => Ok(Decomposition::None),
    }
}

/// Reject an actor whose goals share an identifier.
pub fn check_unique_goal_ids<'a>(
    actor: &str,
    el_ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ModelError> {
    let mut seen = BTreeSet::new();
    for el_id in el_ids {
        if !seen.insert(el_id) {
            return Err(ModelError::DuplicateGoalId {
                actor: actor.to_string(),
                el_id: el_id.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_goal(shape: &GoalShape<'_>) -> Result<(), ModelError> {
    let el_id = shape.el_id;
    if !shape.subgoals.is_empty() && !shape.tasks.is_empty() {
        return Err(ModelError::MixedDecomposition {
            el_id: el_id.to_string(),
        });
    }

    if let Some(annotation) = shape.annotation {
        if shape.subgoals.is_empty() && shape.tasks.is_empty() {
            return Err(ModelError::AnnotationWithoutChildren {
                el_id: el_id.to_string(),
            });
        }
        let tokens = count_id_tokens(annotation, &['G', 'T']);
        if shape.subgoals.is_empty() {
            if shape.tasks.len() > 1 || tokens > 1 {
                return Err(ModelError::MultipleTasks {
                    el_id: el_id.to_string(),
                });
            }
        } else if shape.subgoals.len() != tokens {
            return Err(ModelError::ChildCountMismatch {
                el_id: el_id.to_string(),
                children: shape.subgoals.len(),
                tokens,
            });
        }
    }

    if shape.decomposition.is_and_or() && shape.subgoals.len() >= 2 {
        let annotation = shape.annotation.ok_or_else(|| ModelError::MissingAnnotation {
            el_id: el_id.to_string(),
        })?;
        require_all_in_annotation(el_id, annotation, &shape.subgoals)?;
    }

    if shape.tasks.len() > 1 {
        return Err(ModelError::MultipleTasks {
            el_id: el_id.to_string(),
        });
    }
    if let Some(task) = shape.tasks.first() {
        if task.annotated && task.children == 0 {
            return Err(ModelError::AnnotationWithoutChildren {
                el_id: task.el_id.to_string(),
            });
        }
        if !task.el_id.chars().all(char::is_alphanumeric) {
            return Err(ModelError::LevelOneTaskName {
                el_id: task.el_id.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_plan(shape: &PlanShape<'_>) -> Result<(), ModelError> {
    let el_id = shape.el_id;
    if let Some(annotation) = shape.annotation {
        if shape.subtasks.is_empty() {
            return Err(ModelError::AnnotationWithoutChildren {
                el_id: el_id.to_string(),
            });
        }
        let tokens = count_id_tokens(annotation, &['T']);
        if shape.subtasks.len() != tokens {
            return Err(ModelError::ChildCountMismatch {
                el_id: el_id.to_string(),
                children: shape.subtasks.len(),
                tokens,
            });
        }
    }

    let mut seen = BTreeSet::new();
    for child in &shape.subtasks {
        if !seen.insert(*child) {
            return Err(ModelError::DuplicateSubtaskId {
                el_id: child.to_string(),
            });
        }
        let Some((prefix, _)) = child.rsplit_once('.') else {
            return Err(ModelError::SubtaskNotDotted {
                el_id: child.to_string(),
            });
        };
        if prefix != el_id {
            return Err(ModelError::SubtaskPrefixMismatch {
                el_id: child.to_string(),
                parent: el_id.to_string(),
            });
        }
    }

    if shape.decomposition.is_and_or() && shape.subtasks.len() >= 2 {
        let annotation = shape.annotation.ok_or_else(|| ModelError::MissingAnnotation {
            el_id: el_id.to_string(),
        })?;
        require_all_in_annotation(el_id, annotation, &shape.subtasks)?;
    }
    Ok(())
}

/// Number of identifier mentions, counted by their leading letter. Goals
/// count `G` and `T`; plans only ever name tasks and count `T`.
fn count_id_tokens(annotation: &str, letters: &[char]) -> usize {
    annotation.chars().filter(|ch| letters.contains(ch)).count()
}

fn require_all_in_annotation(
    el_id: &str,
    annotation: &str,
    children: &[&str],
) -> Result<(), ModelError> {
    let tokens: BTreeSet<&str> = ANNOTATION_ID_RE
        .find_iter(annotation)
        .map(|token| token.as_str())
        .collect();
    for child in children {
        if !tokens.contains(child) {
            return Err(ModelError::ChildNotInAnnotation {
                el_id: el_id.to_string(),
                child: child.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal<'a>(
        el_id: &'a str,
        annotation: Option<&'a str>,
        subgoals: Vec<&'a str>,
        tasks: Vec<TaskShape<'a>>,
    ) -> GoalShape<'a> {
        GoalShape {
            el_id,
            decomposition: Decomposition::And,
            annotation,
            subgoals,
            tasks,
        }
    }

    fn task(el_id: &str) -> TaskShape<'_> {
        TaskShape {
            el_id,
            annotated: false,
            children: 0,
        }
    }

    fn plan<'a>(el_id: &'a str, annotation: Option<&'a str>, subtasks: Vec<&'a str>) -> PlanShape<'a> {
        PlanShape {
            el_id,
            decomposition: Decomposition::And,
            annotation,
            subtasks,
        }
    }

    #[test]
    fn and_or_conflict_is_rejected() {
        let err = decomposition_kind("G2", true, true).expect_err("must fail");
        assert_eq!(err.rule(), "and_or_conflict");
        assert_eq!(decomposition_kind("G2", false, true), Ok(Decomposition::Or));
    }

    #[test]
    fn duplicate_goal_ids_are_rejected() {
        let err = check_unique_goal_ids("A", ["G1", "G2", "G1"]).expect_err("must fail");
        assert_eq!(
            err,
            ModelError::DuplicateGoalId {
                actor: "A".to_string(),
                el_id: "G1".to_string(),
            }
        );
        assert!(check_unique_goal_ids("A", ["G1", "G1.1"]).is_ok());
    }

    #[test]
    fn accepts_well_formed_goal() {
        let shape = goal("G1", Some("G1.1;G1.2"), vec!["G1.1", "G1.2"], vec![]);
        assert_eq!(validate_goal(&shape), Ok(()));
    }

    #[test]
    fn rejects_goal_with_subgoals_and_tasks() {
        let shape = goal("G1", None, vec!["G1.1"], vec![task("T1")]);
        assert_eq!(validate_goal(&shape).expect_err("fail").rule(), "mixed_decomposition");
    }

    #[test]
    fn rejects_annotated_leaf_goal() {
        let shape = goal("G1", Some("G1.1"), vec![], vec![]);
        assert_eq!(
            validate_goal(&shape).expect_err("fail").rule(),
            "annotation_without_children"
        );
    }

    #[test]
    fn rejects_token_count_mismatch() {
        let shape = goal("G1", Some("G1.1;G1.2;G1.3"), vec!["G1.1", "G1.2"], vec![]);
        assert_eq!(
            validate_goal(&shape),
            Err(ModelError::ChildCountMismatch {
                el_id: "G1".to_string(),
                children: 2,
                tokens: 3,
            })
        );
    }

    #[test]
    fn rejects_missing_annotation_for_two_children() {
        let shape = goal("G1", None, vec!["G1.1", "G1.2"], vec![]);
        assert_eq!(validate_goal(&shape).expect_err("fail").rule(), "missing_annotation");
    }

    #[test]
    fn child_must_appear_as_whole_token() {
        let shape = goal("G1", Some("G1.11;G1.2"), vec!["G1.1", "G1.2"], vec![]);
        assert_eq!(
            validate_goal(&shape),
            Err(ModelError::ChildNotInAnnotation {
                el_id: "G1".to_string(),
                child: "G1.1".to_string(),
            })
        );
    }

    #[test]
    fn juxtaposed_children_are_separate_tokens() {
        let shape = goal("G1", Some("G1.1G1.2"), vec!["G1.1", "G1.2"], vec![]);
        assert_eq!(validate_goal(&shape), Ok(()));
    }

    #[test]
    fn goal_refines_into_one_task_only() {
        let shape = goal("G1", None, vec![], vec![task("T1"), task("T2")]);
        assert_eq!(validate_goal(&shape).expect_err("fail").rule(), "multiple_tasks");
        let annotated = goal("G1", Some("T1;T2"), vec![], vec![task("T1")]);
        assert_eq!(validate_goal(&annotated).expect_err("fail").rule(), "multiple_tasks");
    }

    #[test]
    fn level_one_task_must_be_plain() {
        let shape = goal("G1", Some("T1.1"), vec![], vec![task("T1.1")]);
        assert_eq!(
            validate_goal(&shape),
            Err(ModelError::LevelOneTaskName {
                el_id: "T1.1".to_string()
            })
        );
    }

    #[test]
    fn annotated_task_without_children_is_reported_at_task() {
        let annotated_task = TaskShape {
            el_id: "T1",
            annotated: true,
            children: 0,
        };
        let shape = goal("G1", None, vec![], vec![annotated_task]);
        assert_eq!(
            validate_goal(&shape),
            Err(ModelError::AnnotationWithoutChildren {
                el_id: "T1".to_string()
            })
        );
    }

    #[test]
    fn accepts_well_formed_plan() {
        let shape = plan("T1", Some("T1.1#T1.2"), vec!["T1.1", "T1.2"]);
        assert_eq!(validate_plan(&shape), Ok(()));
        let nested = plan("T1.1", Some("T1.1.1;T1.1.2"), vec!["T1.1.1", "T1.1.2"]);
        assert_eq!(validate_plan(&nested), Ok(()));
    }

    #[test]
    fn rejects_undotted_subtask() {
        let shape = plan("T1", None, vec!["T2"]);
        assert_eq!(validate_plan(&shape).expect_err("fail").rule(), "subtask_not_dotted");
    }

    #[test]
    fn rejects_subtask_with_foreign_prefix() {
        let shape = plan("T1", None, vec!["T2.1"]);
        assert_eq!(
            validate_plan(&shape),
            Err(ModelError::SubtaskPrefixMismatch {
                el_id: "T2.1".to_string(),
                parent: "T1".to_string(),
            })
        );
        let deep = plan("T1", None, vec!["T1.2.1"]);
        assert_eq!(validate_plan(&deep).expect_err("fail").rule(), "subtask_prefix_mismatch");
    }

    #[test]
    fn rejects_duplicate_sibling_subtasks() {
        let shape = plan("T1", Some("T1.1;T1.1"), vec!["T1.1", "T1.1"]);
        assert_eq!(
            validate_plan(&shape).expect_err("fail").rule(),
            "duplicate_subtask_id"
        );
    }

    #[test]
    fn repeated_subtask_is_rejected_without_annotation_or_flags() {
        let mut shape = plan("T1", None, vec!["T1.1", "T1.1"]);
        shape.decomposition = Decomposition::None;
        assert_eq!(
            validate_plan(&shape),
            Err(ModelError::DuplicateSubtaskId {
                el_id: "T1.1".to_string()
            })
        );
    }

    #[test]
    fn plan_annotation_counts_task_mentions_only() {
        let shape = plan("T1", Some("T1.1#T1.2#G1"), vec!["T1.1", "T1.2"]);
        assert_eq!(validate_plan(&shape), Ok(()));
        let goal_shape = goal("G1", Some("G1.1#G1.2#T1"), vec!["G1.1", "G1.2"], vec![]);
        assert_eq!(
            validate_goal(&goal_shape).expect_err("fail").rule(),
            "child_count_mismatch"
        );
    }

    #[test]
    fn rejects_annotated_plan_without_children() {
        let shape = plan("T1", Some("T1.1"), vec![]);
        assert_eq!(
            validate_plan(&shape).expect_err("fail").rule(),
            "annotation_without_children"
        );
    }

    #[test]
    fn rejects_plan_annotation_naming_other_ids() {
        let shape = plan("T1", Some("T1.1;T1.3"), vec!["T1.1", "T1.2"]);
        assert_eq!(
            validate_plan(&shape).expect_err("fail").rule(),
            "child_not_in_annotation"
        );
    }
}
