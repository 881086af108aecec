//! Argument autocompletion for prompts and resource templates.

use serde::{Deserialize, Serialize};

/// Maximum number of values returned by a single completion call.
pub const MAX_COMPLETION_VALUES: usize = 100;

/// Suggests values for one prompt argument or template variable.
pub trait CompletionProvider: Send + Sync {
    /// Returns every candidate for the partially typed `current_value`, in order.
    fn get_completions(&self, current_value: &str) -> Vec<String>;
}

/// Completes from a fixed list of values by prefix.
#[derive(Debug, Clone, Default)]
pub struct ListCompletionProvider {
    values: Vec<String>,
}

impl ListCompletionProvider {
    /// Creates a provider over `values`.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl CompletionProvider for ListCompletionProvider {
    fn get_completions(&self, current_value: &str) -> Vec<String> {
        self.values
            .iter()
            .filter(|value| value.starts_with(current_value))
            .cloned()
            .collect()
    }
}

/// What is being completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CompletionReference {
    /// An argument of a prompt.
    #[serde(rename = "ref/prompt")]
    Prompt {
        /// Prompt name.
        name: String,
    },
    /// A variable of a resource template.
    #[serde(rename = "ref/resource")]
    Resource {
        /// The URI template.
        uri: String,
    },
}

/// Suggested values, capped at [`MAX_COMPLETION_VALUES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Suggested values.
    pub values: Vec<String>,
    /// Number of candidates before truncation.
    pub total: usize,
    /// Whether candidates were cut off.
    pub has_more: bool,
}

impl Completion {
    /// Truncates a full candidate list.
    #[must_use]
    pub fn from_candidates(candidates: Vec<String>) -> Self {
        let total = candidates.len();
        let values = candidates
            .into_iter()
            .take(MAX_COMPLETION_VALUES)
            .collect();
        Self {
            values,
            total,
            has_more: total > MAX_COMPLETION_VALUES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_provider_filters_by_prefix() {
        let provider = ListCompletionProvider::new(["python", "pytorch", "rust"]);
        assert_eq!(provider.get_completions("py"), vec!["python", "pytorch"]);
        assert_eq!(provider.get_completions("").len(), 3);
        assert!(provider.get_completions("go").is_empty());
    }

    #[test]
    fn completion_is_capped_at_one_hundred() {
        let candidates: Vec<String> = (0..150).map(|i| format!("v{i}")).collect();
        let completion = Completion::from_candidates(candidates);
        assert_eq!(completion.values.len(), 100);
        assert_eq!(completion.total, 150);
        assert!(completion.has_more);
        assert_eq!(completion.values[99], "v99");
    }

    #[test]
    fn small_completion_is_complete() {
        let completion = Completion::from_candidates(vec!["a".to_string()]);
        assert_eq!(completion.total, 1);
        assert!(!completion.has_more);
    }

    #[test]
    fn reference_wire_format() {
        let reference: CompletionReference =
            serde_json::from_str(r#"{"type": "ref/prompt", "name": "greet"}"#).unwrap();
        assert_eq!(
            reference,
            CompletionReference::Prompt {
                name: "greet".to_string()
            }
        );
        let reference: CompletionReference =
            serde_json::from_str(r#"{"type": "ref/resource", "uri": "u://{id}"}"#).unwrap();
        assert!(matches!(reference, CompletionReference::Resource { .. }));
    }
}
