//! Fatal model errors raised while building a container graph.
//!
//! Every variant names the offending element identifier (or the raw label
//! when no identifier could be derived) so callers can surface the message
//! verbatim and tests can assert on which rule fired.

use thiserror::Error;

/// Rejection of a raw model by the label grammar, the annotation parser, the
/// structural validator or the builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error(
        "label must be in the following order: (G|T)#: description [runtime annotation]; error found at: {label}"
    )]
    LabelOrder { label: String },

    #[error("there must not be anything written after the runtime annotation; error found at: {label}")]
    TrailingText { label: String },

    #[error("closing bracket is missing; error found at: {label}")]
    MissingClosingBracket { label: String },

    #[error("open bracket is missing; error found at: {label}")]
    MissingOpeningBracket { label: String },

    #[error("label is incorrect, expected '(G|T)#: description'; error found at: {label}")]
    MalformedLabel { label: String },

    #[error("goal ids are not unique; '{el_id}' is used by more than one goal of actor '{actor}'")]
    DuplicateGoalId { actor: String, el_id: String },

    #[error("{el_id} is refined through AND and OR decompositions at the same time")]
    AndOrConflict { el_id: String },

    #[error("goals can't be refined into tasks and subgoals at the same time; error found at: {el_id}")]
    MixedDecomposition { el_id: String },

    #[error("element presents a runtime annotation but it doesn't have any children nodes; error found at: {el_id}")]
    AnnotationWithoutChildren { el_id: String },

    #[error(
        "the amount of children ({children}) does not match the amount of ids in the runtime annotation ({tokens}); error found at: {el_id}"
    )]
    ChildCountMismatch {
        el_id: String,
        children: usize,
        tokens: usize,
    },

    #[error("elements with 2 or more children must have a runtime annotation; error found at: {el_id}")]
    MissingAnnotation { el_id: String },

    #[error("child '{child}' is not in the runtime annotation; error found at: {el_id}")]
    ChildNotInAnnotation { el_id: String, child: String },

    #[error("tasks that are not on level 1 must have T#.# form; error found at: {el_id}")]
    SubtaskNotDotted { el_id: String },

    #[error("subtask must inherit the first part of its id from its parent '{parent}'; error found at: {el_id}")]
    SubtaskPrefixMismatch { el_id: String, parent: String },

    #[error("at least two subtasks have exactly the same id; error found at: {el_id}")]
    DuplicateSubtaskId { el_id: String },

    #[error("goals refine in just one task, not multiple; error found at: {el_id}")]
    MultipleTasks { el_id: String },

    #[error("level 1 tasks must be named accordingly (T#); error found at: {el_id}")]
    LevelOneTaskName { el_id: String },

    #[error("invalid runtime annotation at offset {offset}: {reason}; error found at: {el_id}")]
    Annotation {
        el_id: String,
        offset: usize,
        reason: String,
    },

    #[error("time coordinates exceed the representable range; error found at: {el_id}")]
    TimeOverflow { el_id: String },

    #[error("'{from}' references unknown {kind} '{name}'")]
    UnknownReference {
        from: String,
        kind: &'static str,
        name: String,
    },
}

impl ModelError {
    /// Stable rule name, used for structured logs and test assertions.
    pub fn rule(&self) -> &'static str {
        match self {
            ModelError::LabelOrder { .. } => "label_order",
            ModelError::TrailingText { .. } => "trailing_text",
            ModelError::MissingClosingBracket { .. } => "missing_closing_bracket",
            ModelError::MissingOpeningBracket { .. } => "missing_opening_bracket",
            ModelError::MalformedLabel { .. } => "malformed_label",
            ModelError::DuplicateGoalId { .. } => "duplicate_goal_id",
            ModelError::AndOrConflict { .. } => "and_or_conflict",
            ModelError::MixedDecomposition { .. } => "mixed_decomposition",
            ModelError::AnnotationWithoutChildren { .. } => "annotation_without_children",
            ModelError::ChildCountMismatch { .. } => "child_count_mismatch",
            ModelError::MissingAnnotation { .. } => "missing_annotation",
            ModelError::ChildNotInAnnotation { .. } => "child_not_in_annotation",
            ModelError::SubtaskNotDotted { .. } => "subtask_not_dotted",
            ModelError::SubtaskPrefixMismatch { .. } => "subtask_prefix_mismatch",
            ModelError::DuplicateSubtaskId { .. } => "duplicate_subtask_id",
            ModelError::MultipleTasks { .. } => "multiple_tasks",
            ModelError::LevelOneTaskName { .. } => "level_one_task_name",
            ModelError::Annotation { .. } => "annotation",
            ModelError::TimeOverflow { .. } => "time_overflow",
            ModelError::UnknownReference { .. } => "unknown_reference",
        }
    }
}
