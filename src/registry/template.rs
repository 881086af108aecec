//! URI template compilation and matching.
//!
//! A template such as `users://{id}/posts/{post}` compiles into an anchored
//! regular expression: literal segments match exactly, each placeholder
//! becomes a named group matching one or more characters other than `/`.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::DefinitionError;

/// A `{variable}` placeholder; group 1 is the variable name.
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder pattern"));

/// A compiled URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    matcher: Regex,
    variables: Vec<String>,
}

impl UriTemplate {
    /// Compiles `template` into a matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the template has no placeholders or repeats a
    /// variable name.
    pub fn compile(template: &str) -> Result<Self, DefinitionError> {
        let mut pattern = String::from("^");
        let mut variables = Vec::new();
        let mut last = 0;

        for captures in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            pattern.push_str(&format!("(?P<{}>[^/]+)", name.as_str()));
            variables.push(name.as_str().to_string());
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        if variables.is_empty() {
            return Err(DefinitionError::InvalidTemplate {
                template: template.to_string(),
                reason: "must contain at least one {variable} placeholder".to_string(),
            });
        }

        let matcher = Regex::new(&pattern).map_err(|e| DefinitionError::InvalidTemplate {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            matcher,
            variables,
        })
    }

    /// Matches `uri`, returning the extracted variables in template order.
    #[must_use]
    pub fn matches(&self, uri: &str) -> Option<IndexMap<String, String>> {
        let captures = self.matcher.captures(uri)?;
        Some(
            self.variables
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// Variable names in the order they appear.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}
