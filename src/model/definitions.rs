//! Capability definitions: tools, resources, resource templates and prompts.
//!
//! Constructors validate the invariants the protocol relies on; once built,
//! a definition is only read.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DefinitionError;
use crate::model::content::Annotations;
use crate::registry::template::PLACEHOLDER;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid name pattern"));

static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://\S*$").expect("valid URI pattern")
});

fn validate_name(name: &str) -> Result<(), DefinitionError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(DefinitionError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Behavioural hints about a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The tool does not modify its environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    /// The tool may perform destructive updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    /// Repeated calls with the same arguments have no additional effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    /// The tool interacts with external entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

/// A callable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's arguments; always `type: object`.
    pub input_schema: Value,
    /// Behavioural hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

impl Tool {
    /// Creates a tool definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the name contains characters other than letters,
    /// digits, `_` and `-`, or if the schema is not an object schema.
    pub fn new(name: impl Into<String>, input_schema: Value) -> Result<Self, DefinitionError> {
        let name = name.into();
        validate_name(&name)?;
        if input_schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(DefinitionError::InvalidInputSchema { tool: name });
        }
        Ok(Self {
            name,
            description: None,
            input_schema,
            annotations: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the behavioural hints.
    #[must_use]
    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// A readable piece of data at a fixed URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Unique, scheme-qualified URI.
    pub uri: String,
    /// Short name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Size in bytes, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Audience and priority hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

impl Resource {
    /// Creates a resource definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI has no scheme or the name is invalid.
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Result<Self, DefinitionError> {
        let uri = uri.into();
        let name = name.into();
        if !URI_PATTERN.is_match(&uri) {
            return Err(DefinitionError::InvalidUri { uri });
        }
        validate_name(&name)?;
        Ok(Self {
            uri,
            name,
            description: None,
            mime_type: None,
            size: None,
            annotations: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Sets the size in bytes.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// A family of resources addressed by an RFC 6570-style URI template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    /// The URI template, containing at least one `{var}` placeholder.
    pub uri_template: String,
    /// Short name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Audience and priority hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

impl ResourceTemplate {
    /// Creates a resource template definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the template has no placeholder or no scheme, or
    /// if the name is invalid.
    pub fn new(
        uri_template: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, DefinitionError> {
        let uri_template = uri_template.into();
        let name = name.into();
        if !PLACEHOLDER.is_match(&uri_template) {
            return Err(DefinitionError::InvalidTemplate {
                template: uri_template,
                reason: "must contain at least one {variable} placeholder".to_string(),
            });
        }
        if !URI_PATTERN.is_match(&uri_template) {
            return Err(DefinitionError::InvalidTemplate {
                template: uri_template,
                reason: "expected scheme://path".to_string(),
            });
        }
        validate_name(&name)?;
        Ok(Self {
            uri_template,
            name,
            description: None,
            mime_type: None,
            annotations: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// An argument accepted by a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl PromptArgument {
    /// Creates an optional argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the argument as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    /// Whether the argument must be supplied.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

/// A message template the client can render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique prompt name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accepted arguments, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PromptArgument>,
}

impl Prompt {
    /// Creates a prompt definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    pub fn new(name: impl Into<String>) -> Result<Self, DefinitionError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: None,
            arguments: Vec::new(),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends an argument.
    #[must_use]
    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }
}
