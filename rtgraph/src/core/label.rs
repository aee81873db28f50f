//! Label grammar: `ID: description [annotation]`.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::ModelError;

static EL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([GT]\d+(?:\.\d+)*):").unwrap());

/// Parsed label of one raw goal or plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Element identifier, e.g. `G1.2` or `T3`.
    pub el_id: String,
    /// Raw runtime annotation between the brackets, if any.
    pub annotation: Option<String>,
}

/// Parse and check a raw label.
///
/// Bracket placement is checked before the identifier, so a label with both
/// problems reports the bracket problem.
pub fn parse_label(name: &str) -> Result<Label, ModelError> {
    check_order(name)?;
    let el_id = EL_ID_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ModelError::MalformedLabel {
            label: label_head(name),
        })?;
    let annotation = match (name.find('['), name.rfind(']')) {
        (Some(open), Some(close)) if open < close => Some(name[open + 1..close].to_string()),
        _ => None,
    };
    Ok(Label { el_id, annotation })
}

fn check_order(name: &str) -> Result<(), ModelError> {
    match (name.find('['), name.find(']')) {
        (Some(open), Some(close)) => {
            let start = name.find(':').map_or(0, |colon| colon + 1);
            let description = if start <= open { &name[start..open] } else { "" };
            if !description.chars().any(char::is_alphanumeric) {
                return Err(ModelError::LabelOrder {
                    label: label_head(name),
                });
            }
            if close + 1 != name.len() {
                return Err(ModelError::TrailingText {
                    label: label_head(name),
                });
            }
            Ok(())
        }
        (Some(_), None) => Err(ModelError::MissingClosingBracket {
            label: label_head(name),
        }),
        (None, Some(_)) => Err(ModelError::MissingOpeningBracket {
            label: label_head(name),
        }),
        (None, None) => Ok(()),
    }
}

/// Text before the first `:`, used to name the element in label errors.
fn label_head(name: &str) -> String {
    name.split(':').next().unwrap_or(name).trim().to_string()
}

/// Order two element identifiers by the numeric value of their suffix.
///
/// The first two components are read as a decimal number, so `G1.10` equals
/// `G1.1` and sorts before `G1.9`. Deeper components break ties.
pub fn compare_el_ids(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = suffix(a).split('.').collect();
    let right: Vec<&str> = suffix(b).split('.').collect();

    let integer = compare_digits(left[0], right[0]);
    if integer != Ordering::Equal {
        return integer;
    }
    let fraction = compare_fraction(
        left.get(1).copied().unwrap_or(""),
        right.get(1).copied().unwrap_or(""),
    );
    if fraction != Ordering::Equal {
        return fraction;
    }
    let rest_len = left.len().max(right.len());
    for index in 2..rest_len {
        let ordering = compare_digits(
            left.get(index).copied().unwrap_or(""),
            right.get(index).copied().unwrap_or(""),
        );
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn suffix(el_id: &str) -> &str {
    el_id.trim_start_matches(['G', 'T'])
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_fraction(a: &str, b: &str) -> Ordering {
    let width = a.len().max(b.len());
    format!("{a:0<width$}").cmp(&format!("{b:0<width$}"))
}
