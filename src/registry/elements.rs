//! Registry entries: a definition bound to its handler.
//!
//! Each entry knows how to invoke its handler and coerce the result into
//! the content type its method returns.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{DefinitionError, HandlerError, McpError};
use crate::model::{
    Content, Prompt, PromptMessage, Resource, ResourceContents, ResourceTemplate, Tool,
};
use crate::registry::arguments::{self, Arguments};
use crate::registry::coercion::{self, Output};
use crate::registry::completion::CompletionProvider;
use crate::registry::template::UriTemplate;

/// Completion providers keyed by argument or variable name.
pub type CompletionProviders = IndexMap<String, Arc<dyn CompletionProvider>>;

/// An invocable capability implementation.
pub trait Handler: Send + Sync {
    /// Runs the handler with its bound arguments.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::InvalidArguments`] when the arguments are
    /// unusable, or [`HandlerError::Failed`] when the handler's logic fails.
    fn invoke(&self, arguments: &Arguments) -> Result<Output, HandlerError>;
}

/// A [`Handler`] backed by a closure. Built with [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: Fn(&Arguments) -> Result<Output, HandlerError> + Send + Sync,
{
    fn invoke(&self, arguments: &Arguments) -> Result<Output, HandlerError> {
        (self.0)(arguments)
    }
}

/// Wraps a closure as a [`Handler`].
pub const fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&Arguments) -> Result<Output, HandlerError> + Send + Sync,
{
    FnHandler(f)
}

/// Common view of every registry entry.
pub trait RegistryEntry {
    /// Whether the entry was registered explicitly rather than discovered.
    fn is_manual(&self) -> bool;
}

/// A registered tool.
#[derive(Clone)]
pub struct RegisteredTool {
    /// The tool definition.
    pub tool: Tool,
    handler: Arc<dyn Handler>,
    is_manual: bool,
}

impl RegisteredTool {
    /// Binds `tool` to `handler`.
    pub fn new(tool: Tool, handler: Arc<dyn Handler>, is_manual: bool) -> Self {
        Self {
            tool,
            handler,
            is_manual,
        }
    }

    /// Binds `arguments`, runs the handler and coerces its output.
    ///
    /// # Errors
    ///
    /// Returns Invalid Params for bad arguments, a handler error when the
    /// handler fails, or a formatting error for unusable output.
    pub fn call(&self, arguments: Arguments) -> Result<Vec<Content>, McpError> {
        let arguments = arguments::bind(&self.tool.input_schema, arguments)?;
        let output = self.handler.invoke(&arguments).map_err(|e| {
            McpError::handler(format!("Failed to call tool '{}'", self.tool.name), e)
        })?;
        coercion::to_contents(output)
    }
}

impl RegistryEntry for RegisteredTool {
    fn is_manual(&self) -> bool {
        self.is_manual
    }
}

impl fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.tool.name)
            .field("is_manual", &self.is_manual)
            .finish_non_exhaustive()
    }
}

/// A registered resource at a fixed URI.
#[derive(Clone)]
pub struct RegisteredResource {
    /// The resource definition.
    pub resource: Resource,
    handler: Arc<dyn Handler>,
    is_manual: bool,
}

impl RegisteredResource {
    /// Binds `resource` to `handler`.
    pub fn new(resource: Resource, handler: Arc<dyn Handler>, is_manual: bool) -> Self {
        Self {
            resource,
            handler,
            is_manual,
        }
    }

    /// Runs the handler with the `uri` argument and coerces its output.
    ///
    /// # Errors
    ///
    /// Returns a handler error when the handler fails, or a formatting error
    /// for unusable output.
    pub fn read(&self, uri: &str) -> Result<Vec<ResourceContents>, McpError> {
        let mut arguments = Arguments::new();
        arguments.insert("uri".to_string(), Value::String(uri.to_string()));
        let output = self
            .handler
            .invoke(&arguments)
            .map_err(|e| McpError::handler(format!("Failed to read resource '{uri}'"), e))?;
        coercion::to_resource_contents(output, uri, self.resource.mime_type.as_deref())
    }
}

impl RegistryEntry for RegisteredResource {
    fn is_manual(&self) -> bool {
        self.is_manual
    }
}

impl fmt::Debug for RegisteredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredResource")
            .field("uri", &self.resource.uri)
            .field("is_manual", &self.is_manual)
            .finish_non_exhaustive()
    }
}

/// A registered resource template.
#[derive(Clone)]
pub struct RegisteredResourceTemplate {
    /// The template definition.
    pub template: ResourceTemplate,
    matcher: UriTemplate,
    handler: Arc<dyn Handler>,
    completions: CompletionProviders,
    is_manual: bool,
}

impl RegisteredResourceTemplate {
    /// Compiles the template and binds it to `handler`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI template cannot be compiled.
    pub fn new(
        template: ResourceTemplate,
        handler: Arc<dyn Handler>,
        completions: CompletionProviders,
        is_manual: bool,
    ) -> Result<Self, DefinitionError> {
        let matcher = UriTemplate::compile(&template.uri_template)?;
        Ok(Self {
            template,
            matcher,
            handler,
            completions,
            is_manual,
        })
    }

    /// Matches `uri` against the compiled template.
    #[must_use]
    pub fn matches(&self, uri: &str) -> Option<IndexMap<String, String>> {
        self.matcher.matches(uri)
    }

    /// Runs the handler with the URI variables plus `uri` and coerces its output.
    ///
    /// # Errors
    ///
    /// Returns a handler error when the handler fails, or a formatting error
    /// for unusable output.
    pub fn read(
        &self,
        uri: &str,
        variables: &IndexMap<String, String>,
    ) -> Result<Vec<ResourceContents>, McpError> {
        let mut arguments: Arguments = variables
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        arguments.insert("uri".to_string(), Value::String(uri.to_string()));
        let output = self
            .handler
            .invoke(&arguments)
            .map_err(|e| McpError::handler(format!("Failed to read resource '{uri}'"), e))?;
        coercion::to_resource_contents(output, uri, self.template.mime_type.as_deref())
    }

    /// The completion provider for a template variable.
    #[must_use]
    pub fn completion_provider(&self, variable: &str) -> Option<&dyn CompletionProvider> {
        self.completions.get(variable).map(AsRef::as_ref)
    }
}

impl RegistryEntry for RegisteredResourceTemplate {
    fn is_manual(&self) -> bool {
        self.is_manual
    }
}

impl fmt::Debug for RegisteredResourceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredResourceTemplate")
            .field("uri_template", &self.template.uri_template)
            .field("is_manual", &self.is_manual)
            .finish_non_exhaustive()
    }
}

/// A registered prompt.
#[derive(Clone)]
pub struct RegisteredPrompt {
    /// The prompt definition.
    pub prompt: Prompt,
    handler: Arc<dyn Handler>,
    completions: CompletionProviders,
    is_manual: bool,
}

impl RegisteredPrompt {
    /// Binds `prompt` to `handler`.
    pub fn new(
        prompt: Prompt,
        handler: Arc<dyn Handler>,
        completions: CompletionProviders,
        is_manual: bool,
    ) -> Self {
        Self {
            prompt,
            handler,
            completions,
            is_manual,
        }
    }

    /// Checks required arguments, runs the handler and coerces its output.
    ///
    /// # Errors
    ///
    /// Returns Invalid Params for missing arguments, a handler error when the
    /// handler fails, or a formatting error for unusable output.
    pub fn get(&self, arguments: &Arguments) -> Result<Vec<PromptMessage>, McpError> {
        arguments::require(
            self.prompt
                .arguments
                .iter()
                .filter(|arg| arg.is_required())
                .map(|arg| arg.name.as_str()),
            arguments,
        )?;
        let output = self.handler.invoke(arguments).map_err(|e| {
            McpError::handler(format!("Failed to get prompt '{}'", self.prompt.name), e)
        })?;
        coercion::to_prompt_messages(output)
    }

    /// The completion provider for a prompt argument.
    #[must_use]
    pub fn completion_provider(&self, argument: &str) -> Option<&dyn CompletionProvider> {
        self.completions.get(argument).map(AsRef::as_ref)
    }
}

impl RegistryEntry for RegisteredPrompt {
    fn is_manual(&self) -> bool {
        self.is_manual
    }
}

impl fmt::Debug for RegisteredPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredPrompt")
            .field("name", &self.prompt.name)
            .field("is_manual", &self.is_manual)
            .finish_non_exhaustive()
    }
}
