//! Capabilities declared in the configuration file.
//!
//! A manifest lists static text resources, text resource templates and
//! prompts. [`discover`] registers them as discovered (non-manual) entries,
//! so capabilities registered in code always take precedence and re-running
//! discovery replaces only what an earlier run added.
//!
//! Template text substitutes `{variable}` placeholders with values captured
//! from the requested URI. Prompt messages substitute `{{argument}}`.

use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;

use crate::error::DefinitionError;
use crate::model::{Content, Prompt, PromptArgument, PromptMessage, Resource, ResourceTemplate, Role};
use crate::registry::template::{UriTemplate, PLACEHOLDER};
use crate::registry::{
    handler_fn, Arguments, CompletionProviders, ListCompletionProvider, Output, Registry,
};

/// A `{{argument}}` placeholder in prompt text; group 1 is the argument name.
static PROMPT_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid prompt placeholder pattern"));

/// Capabilities to register at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Static text resources.
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,

    /// Text resource templates.
    #[serde(default)]
    pub resource_templates: Vec<TemplateEntry>,

    /// Prompt templates.
    #[serde(default)]
    pub prompts: Vec<PromptEntry>,
}

/// A resource with fixed text.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub text: String,
}

/// A resource template rendering text from URI variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateEntry {
    pub uri_template: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub text: String,
    /// Completion values per template variable.
    #[serde(default)]
    pub completions: IndexMap<String, Vec<String>>,
}

/// A prompt built from message templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<PromptArgumentEntry>,
    pub messages: Vec<MessageEntry>,
}

/// A prompt argument, optionally with completion values.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptArgumentEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub completions: Vec<String>,
}

/// One message of a prompt.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageEntry {
    pub role: Role,
    pub text: String,
}

impl Manifest {
    /// Checks every entry without registering anything.
    ///
    /// # Errors
    ///
    /// Returns the first invalid definition.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for entry in &self.resources {
            entry.definition()?;
        }
        for entry in &self.resource_templates {
            entry.definition()?;
            entry.check_completions()?;
        }
        for entry in &self.prompts {
            entry.definition()?;
        }
        Ok(())
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len() + self.resource_templates.len() + self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceEntry {
    fn definition(&self) -> Result<Resource, DefinitionError> {
        let mut resource = Resource::new(&self.uri, &self.name)?;
        if let Some(description) = &self.description {
            resource = resource.with_description(description);
        }
        if let Some(mime_type) = &self.mime_type {
            resource = resource.with_mime_type(mime_type);
        }
        Ok(resource.with_size(self.text.len() as u64))
    }
}

impl TemplateEntry {
    fn definition(&self) -> Result<ResourceTemplate, DefinitionError> {
        let mut template = ResourceTemplate::new(&self.uri_template, &self.name)?;
        if let Some(description) = &self.description {
            template = template.with_description(description);
        }
        if let Some(mime_type) = &self.mime_type {
            template = template.with_mime_type(mime_type);
        }
        Ok(template)
    }

    fn check_completions(&self) -> Result<(), DefinitionError> {
        let compiled = UriTemplate::compile(&self.uri_template)?;
        match self
            .completions
            .keys()
            .find(|name| !compiled.variables().contains(*name))
        {
            Some(unknown) => Err(DefinitionError::InvalidTemplate {
                template: self.uri_template.clone(),
                reason: format!("completions given for unknown variable '{unknown}'"),
            }),
            None => Ok(()),
        }
    }

    fn completion_providers(&self) -> CompletionProviders {
        self.completions
            .iter()
            .map(|(name, values)| (name.clone(), provider(values)))
            .collect()
    }
}

impl PromptEntry {
    fn definition(&self) -> Result<Prompt, DefinitionError> {
        let mut prompt = Prompt::new(&self.name)?;
        if let Some(description) = &self.description {
            prompt = prompt.with_description(description);
        }
        for entry in &self.arguments {
            let mut argument = PromptArgument::new(&entry.name);
            if let Some(description) = &entry.description {
                argument = argument.with_description(description);
            }
            if entry.required {
                argument = argument.required();
            }
            prompt = prompt.with_argument(argument);
        }
        Ok(prompt)
    }

    fn completion_providers(&self) -> CompletionProviders {
        self.arguments
            .iter()
            .filter(|argument| !argument.completions.is_empty())
            .map(|argument| (argument.name.clone(), provider(&argument.completions)))
            .collect()
    }
}

fn provider(values: &[String]) -> Arc<dyn crate::registry::CompletionProvider> {
    Arc::new(ListCompletionProvider::new(values.iter().cloned()))
}

/// Clears discovered entries from `registry` and registers the manifest.
///
/// Returns the number of entries registered; entries shadowed by a manual
/// registration are skipped.
///
/// # Errors
///
/// Returns the first invalid definition. Entries before it stay registered.
pub fn discover(registry: &mut Registry, manifest: &Manifest) -> Result<usize, DefinitionError> {
    registry.clear();
    let mut registered = 0;

    for entry in &manifest.resources {
        let text = entry.text.clone();
        let handler = handler_fn(move |_| Ok(Output::from(text.clone())));
        if registry.register_resource(entry.definition()?, handler, false) {
            registered += 1;
        }
    }

    for entry in &manifest.resource_templates {
        entry.check_completions()?;
        let text = entry.text.clone();
        let handler =
            handler_fn(move |arguments| Ok(Output::from(render(&text, arguments, &PLACEHOLDER))));
        if registry.register_resource_template_with_completions(
            entry.definition()?,
            handler,
            entry.completion_providers(),
            false,
        )? {
            registered += 1;
        }
    }

    for entry in &manifest.prompts {
        let messages = entry.messages.clone();
        let handler = handler_fn(move |arguments| {
            let rendered = messages
                .iter()
                .map(|message| {
                    let text = render(&message.text, arguments, &PROMPT_PLACEHOLDER);
                    let content = Content::text(text);
                    let message = match message.role {
                        Role::User => PromptMessage::user(content),
                        Role::Assistant => PromptMessage::assistant(content),
                    };
                    Output::Message(message)
                })
                .collect::<Vec<_>>();
            Ok(Output::List(rendered))
        });
        if registry.register_prompt_with_completions(
            entry.definition()?,
            handler,
            entry.completion_providers(),
            false,
        ) {
            registered += 1;
        }
    }

    tracing::info!(
        registered,
        declared = manifest.len(),
        "Registered manifest capabilities"
    );
    Ok(registered)
}

/// Replaces every placeholder matched by `pattern` (name in group 1) in one
/// pass over `template`; substituted values are never scanned again.
/// Placeholders without an argument are left as written.
fn render(template: &str, arguments: &Arguments, pattern: &Regex) -> String {
    pattern
        .replace_all(template, |captures: &Captures<'_>| {
            arguments
                .get(&captures[1])
                .map_or_else(|| captures[0].to_string(), display)
        })
        .into_owned()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
