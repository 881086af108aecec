//! The capability registry.
//!
//! The registry owns four independent collections, each kept in registration
//! order:
//!
//! | collection         | keyed by       |
//! |--------------------|----------------|
//! | tools              | name           |
//! | resources          | URI            |
//! | resource templates | URI template   |
//! | prompts            | name           |
//!
//! # Registration precedence
//!
//! A discovered (non-manual) registration never replaces a manual one for the
//! same key; every other registration overwrites. [`Registry::clear`] drops
//! discovered entries only, so discovery can be re-run without disturbing
//! capabilities registered in code.
//!
//! # Concurrency
//!
//! Mutation takes `&mut self`. Hosts that run discovery concurrently with
//! request handling must serialise access (e.g. behind a mutex); reads are
//! side-effect free.

pub mod arguments;
pub mod coercion;
pub mod completion;
pub mod elements;
pub mod pagination;
pub mod template;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{DefinitionError, McpError};
use crate::model::{Prompt, Resource, ResourceContents, ResourceTemplate, Tool};

pub use arguments::Arguments;
pub use coercion::Output;
pub use completion::{Completion, CompletionProvider, CompletionReference, ListCompletionProvider};
pub use elements::{
    handler_fn, CompletionProviders, FnHandler, Handler, RegisteredPrompt, RegisteredResource,
    RegisteredResourceTemplate, RegisteredTool, RegistryEntry,
};
pub use pagination::Page;

/// A registry collection whose contents changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListChanged {
    /// Tools were added, replaced or removed.
    Tools,
    /// Resources were added, replaced or removed.
    Resources,
    /// Resource templates were added, replaced or removed.
    ResourceTemplates,
    /// Prompts were added, replaced or removed.
    Prompts,
}

impl ListChanged {
    /// The protocol notification announcing this change.
    ///
    /// Templates have no notification of their own; they are announced as a
    /// resource list change.
    #[must_use]
    pub const fn notification_method(self) -> &'static str {
        match self {
            Self::Tools => "notifications/tools/list_changed",
            Self::Resources | Self::ResourceTemplates => "notifications/resources/list_changed",
            Self::Prompts => "notifications/prompts/list_changed",
        }
    }
}

type Listener = Box<dyn Fn(ListChanged) + Send + Sync>;

/// A resolved `resources/read` target.
#[derive(Debug)]
pub enum ResourceMatch<'a> {
    /// An exact URI match.
    Resource(&'a RegisteredResource),
    /// A template match with the variables it extracted.
    Template {
        /// The matching template.
        template: &'a RegisteredResourceTemplate,
        /// Values captured from the URI.
        variables: IndexMap<String, String>,
    },
}

impl ResourceMatch<'_> {
    /// Reads the matched resource.
    ///
    /// # Errors
    ///
    /// Propagates handler and formatting failures.
    pub fn read(&self, uri: &str) -> Result<Vec<ResourceContents>, McpError> {
        match self {
            Self::Resource(resource) => resource.read(uri),
            Self::Template {
                template,
                variables,
            } => template.read(uri, variables),
        }
    }
}

/// In-memory store of registered capabilities and their handlers.
#[derive(Default)]
pub struct Registry {
    tools: IndexMap<String, RegisteredTool>,
    resources: IndexMap<String, RegisteredResource>,
    resource_templates: IndexMap<String, RegisteredResourceTemplate>,
    prompts: IndexMap<String, RegisteredPrompt>,
    listeners: Vec<Listener>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to list-changed events.
    pub fn on_list_changed(&mut self, listener: impl Fn(ListChanged) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Registers a tool. Returns `false` if a manual tool of the same name
    /// shadows this discovered one.
    pub fn register_tool(
        &mut self,
        tool: Tool,
        handler: impl Handler + 'static,
        is_manual: bool,
    ) -> bool {
        let key = tool.name.clone();
        let entry = RegisteredTool::new(tool, Arc::new(handler), is_manual);
        self.store(ListChanged::Tools, key, entry)
    }

    /// Registers a resource. Returns `false` if a manual resource with the
    /// same URI shadows this discovered one.
    pub fn register_resource(
        &mut self,
        resource: Resource,
        handler: impl Handler + 'static,
        is_manual: bool,
    ) -> bool {
        let key = resource.uri.clone();
        let entry = RegisteredResource::new(resource, Arc::new(handler), is_manual);
        self.store(ListChanged::Resources, key, entry)
    }

    /// Registers a resource template without completion providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI template cannot be compiled.
    pub fn register_resource_template(
        &mut self,
        template: ResourceTemplate,
        handler: impl Handler + 'static,
        is_manual: bool,
    ) -> Result<bool, DefinitionError> {
        self.register_resource_template_with_completions(
            template,
            handler,
            CompletionProviders::new(),
            is_manual,
        )
    }

    /// Registers a resource template with completion providers keyed by
    /// template variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI template cannot be compiled.
    pub fn register_resource_template_with_completions(
        &mut self,
        template: ResourceTemplate,
        handler: impl Handler + 'static,
        completions: CompletionProviders,
        is_manual: bool,
    ) -> Result<bool, DefinitionError> {
        let key = template.uri_template.clone();
        let entry =
            RegisteredResourceTemplate::new(template, Arc::new(handler), completions, is_manual)?;
        Ok(self.store(ListChanged::ResourceTemplates, key, entry))
    }

    /// Registers a prompt without completion providers.
    pub fn register_prompt(
        &mut self,
        prompt: Prompt,
        handler: impl Handler + 'static,
        is_manual: bool,
    ) -> bool {
        self.register_prompt_with_completions(prompt, handler, CompletionProviders::new(), is_manual)
    }

    /// Registers a prompt with completion providers keyed by argument name.
    pub fn register_prompt_with_completions(
        &mut self,
        prompt: Prompt,
        handler: impl Handler + 'static,
        completions: CompletionProviders,
        is_manual: bool,
    ) -> bool {
        let key = prompt.name.clone();
        let entry = RegisteredPrompt::new(prompt, Arc::new(handler), completions, is_manual);
        self.store(ListChanged::Prompts, key, entry)
    }

    /// Removes every discovered entry, keeping manual ones.
    pub fn clear(&mut self) {
        let removed = [
            (ListChanged::Tools, retain_manual(&mut self.tools)),
            (ListChanged::Resources, retain_manual(&mut self.resources)),
            (
                ListChanged::ResourceTemplates,
                retain_manual(&mut self.resource_templates),
            ),
            (ListChanged::Prompts, retain_manual(&mut self.prompts)),
        ];

        for (kind, count) in removed {
            if count > 0 {
                tracing::debug!(?kind, removed = count, "Cleared discovered registrations");
                self.notify(kind);
            }
        }
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Looks up a prompt by name.
    #[must_use]
    pub fn get_prompt(&self, name: &str) -> Option<&RegisteredPrompt> {
        self.prompts.get(name)
    }

    /// Looks up a resource template by its URI template.
    #[must_use]
    pub fn get_resource_template(&self, uri_template: &str) -> Option<&RegisteredResourceTemplate> {
        self.resource_templates.get(uri_template)
    }

    /// Resolves a resource URI.
    ///
    /// Exact URIs win. Otherwise, when `include_templates` is set, templates
    /// are tried in registration order and the first match is returned.
    #[must_use]
    pub fn get_resource(&self, uri: &str, include_templates: bool) -> Option<ResourceMatch<'_>> {
        if let Some(resource) = self.resources.get(uri) {
            return Some(ResourceMatch::Resource(resource));
        }
        if !include_templates {
            return None;
        }
        self.resource_templates.values().find_map(|template| {
            template
                .matches(uri)
                .map(|variables| ResourceMatch::Template {
                    template,
                    variables,
                })
        })
    }

    /// Lists one page of tools.
    ///
    /// # Errors
    ///
    /// Returns an invalid-cursor error if `cursor` names no tool.
    pub fn list_tools(&self, cursor: Option<&str>, page_size: usize) -> Result<Page<&Tool>, McpError> {
        Ok(pagination::paginate(&self.tools, cursor, page_size)?.map(|entry| &entry.tool))
    }

    /// Lists one page of resources.
    ///
    /// # Errors
    ///
    /// Returns an invalid-cursor error if `cursor` names no resource.
    pub fn list_resources(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Page<&Resource>, McpError> {
        Ok(pagination::paginate(&self.resources, cursor, page_size)?.map(|entry| &entry.resource))
    }

    /// Lists one page of resource templates.
    ///
    /// # Errors
    ///
    /// Returns an invalid-cursor error if `cursor` names no template.
    pub fn list_resource_templates(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Page<&ResourceTemplate>, McpError> {
        Ok(pagination::paginate(&self.resource_templates, cursor, page_size)?
            .map(|entry| &entry.template))
    }

    /// Lists one page of prompts.
    ///
    /// # Errors
    ///
    /// Returns an invalid-cursor error if `cursor` names no prompt.
    pub fn list_prompts(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Page<&Prompt>, McpError> {
        Ok(pagination::paginate(&self.prompts, cursor, page_size)?.map(|entry| &entry.prompt))
    }

    /// Completes `argument` of the referenced prompt or template.
    ///
    /// An argument without a provider yields an empty completion.
    ///
    /// # Errors
    ///
    /// Returns Invalid Params if the prompt or template is not registered.
    pub fn complete(
        &self,
        reference: &CompletionReference,
        argument: &str,
        value: &str,
    ) -> Result<Completion, McpError> {
        let provider = match reference {
            CompletionReference::Prompt { name } => self
                .prompts
                .get(name)
                .ok_or_else(|| McpError::InvalidParams(format!("Prompt '{name}' not found")))?
                .completion_provider(argument),
            CompletionReference::Resource { uri } => self
                .resource_templates
                .get(uri)
                .ok_or_else(|| {
                    McpError::InvalidParams(format!("Resource template '{uri}' not found"))
                })?
                .completion_provider(argument),
        };

        Ok(provider.map_or_else(Completion::default, |provider| {
            Completion::from_candidates(provider.get_completions(value))
        }))
    }

    /// Number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Number of registered resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Number of registered resource templates.
    #[must_use]
    pub fn resource_template_count(&self) -> usize {
        self.resource_templates.len()
    }

    /// Number of registered prompts.
    #[must_use]
    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    /// Applies the manual-wins rule and stores `entry`.
    fn store<T: RegistryEntry>(&mut self, kind: ListChanged, key: String, entry: T) -> bool
    where
        Self: CollectionFor<T>,
    {
        let collection = self.collection_mut();
        if collection
            .get(&key)
            .is_some_and(|existing| existing.is_manual() && !entry.is_manual())
        {
            tracing::debug!(
                ?kind,
                key = %key,
                "Ignoring discovered registration shadowed by a manual one"
            );
            return false;
        }

        collection.insert(key, entry);
        self.notify(kind);
        true
    }

    fn notify(&self, kind: ListChanged) {
        for listener in &self.listeners {
            listener(kind);
        }
    }
}

/// Maps an entry type to the collection that stores it.
trait CollectionFor<T> {
    fn collection_mut(&mut self) -> &mut IndexMap<String, T>;
}

impl CollectionFor<RegisteredTool> for Registry {
    fn collection_mut(&mut self) -> &mut IndexMap<String, RegisteredTool> {
        &mut self.tools
    }
}

impl CollectionFor<RegisteredResource> for Registry {
    fn collection_mut(&mut self) -> &mut IndexMap<String, RegisteredResource> {
        &mut self.resources
    }
}

impl CollectionFor<RegisteredResourceTemplate> for Registry {
    fn collection_mut(&mut self) -> &mut IndexMap<String, RegisteredResourceTemplate> {
        &mut self.resource_templates
    }
}

impl CollectionFor<RegisteredPrompt> for Registry {
    fn collection_mut(&mut self) -> &mut IndexMap<String, RegisteredPrompt> {
        &mut self.prompts
    }
}

fn retain_manual<T: RegistryEntry>(collection: &mut IndexMap<String, T>) -> usize {
    let before = collection.len();
    collection.retain(|_, entry| entry.is_manual());
    before - collection.len()
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field(
                "resource_templates",
                &self.resource_templates.keys().collect::<Vec<_>>(),
            )
            .field("prompts", &self.prompts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Content;
    use std::sync::Mutex;
    use serde_json::json;

    fn constant(text: &'static str) -> impl Handler {
        handler_fn(move |_| Ok(text.into()))
    }

    fn tool(name: &str) -> Tool {
        Tool::new(name, json!({"type": "object"})).unwrap()
    }

    fn call_text(registry: &Registry, name: &str) -> String {
        let contents = registry.get_tool(name).unwrap().call(Arguments::new()).unwrap();
        contents[0].as_text().unwrap().to_string()
    }

    #[test]
    fn manual_registration_beats_discovered() {
        let mut registry = Registry::new();
        assert!(registry.register_tool(tool("echo"), constant("manual"), true));
        assert!(!registry.register_tool(tool("echo"), constant("discovered"), false));
        assert_eq!(call_text(&registry, "echo"), "manual");
    }

    #[test]
    fn manual_registration_replaces_discovered() {
        let mut registry = Registry::new();
        registry.register_tool(tool("echo"), constant("discovered"), false);
        registry.register_tool(tool("echo"), constant("manual"), true);
        assert_eq!(call_text(&registry, "echo"), "manual");
    }

    #[test]
    fn later_registration_of_same_kind_overwrites() {
        let mut registry = Registry::new();
        registry.register_tool(tool("echo"), constant("first"), false);
        registry.register_tool(tool("echo"), constant("second"), false);
        assert_eq!(call_text(&registry, "echo"), "second");
        assert_eq!(registry.tool_count(), 1);
    }

    #[test]
    fn clear_keeps_manual_entries() {
        let mut registry = Registry::new();
        registry.register_tool(tool("manual"), constant("m"), true);
        registry.register_tool(tool("found"), constant("f"), false);
        registry.register_prompt(Prompt::new("found").unwrap(), constant("p"), false);
        registry.register_resource(
            Resource::new("mem://manual", "manual").unwrap(),
            constant("r"),
            true,
        );

        registry.clear();

        assert!(registry.get_tool("manual").is_some());
        assert!(registry.get_tool("found").is_none());
        assert_eq!(registry.prompt_count(), 0);
        assert_eq!(registry.resource_count(), 1);
    }

    #[test]
    fn registrations_emit_list_changed() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut registry = Registry::new();
        let sink = Arc::clone(&events);
        registry.on_list_changed(move |kind| sink.lock().unwrap().push(kind));

        registry.register_tool(tool("a"), constant("a"), true);
        registry.register_tool(tool("a"), constant("b"), false);
        registry.register_prompt(Prompt::new("p").unwrap(), constant("p"), false);
        registry
            .register_resource_template(
                ResourceTemplate::new("t://{x}", "t").unwrap(),
                constant("t"),
                false,
            )
            .unwrap();
        registry.clear();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ListChanged::Tools,
                ListChanged::Prompts,
                ListChanged::ResourceTemplates,
                ListChanged::ResourceTemplates,
                ListChanged::Prompts,
            ]
        );
    }

    #[test]
    fn exact_resource_beats_template() {
        let mut registry = Registry::new();
        registry
            .register_resource_template(
                ResourceTemplate::new("users://{id}", "user").unwrap(),
                constant("template"),
                true,
            )
            .unwrap();
        registry.register_resource(
            Resource::new("users://me", "me").unwrap(),
            constant("exact"),
            true,
        );

        assert!(matches!(
            registry.get_resource("users://me", true),
            Some(ResourceMatch::Resource(_))
        ));
        let Some(ResourceMatch::Template { variables, .. }) =
            registry.get_resource("users://42", true)
        else {
            panic!("expected template match");
        };
        assert_eq!(variables["id"], "42");
        assert!(registry.get_resource("users://42", false).is_none());
        assert!(registry.get_resource("groups://1", true).is_none());
    }

    #[test]
    fn templates_match_in_registration_order() {
        let mut registry = Registry::new();
        registry
            .register_resource_template(
                ResourceTemplate::new("files://{name}", "first").unwrap(),
                constant("first"),
                true,
            )
            .unwrap();
        registry
            .register_resource_template(
                ResourceTemplate::new("files://{path}", "second").unwrap(),
                constant("second"),
                true,
            )
            .unwrap();

        let resolved = registry.get_resource("files://a", true).unwrap();
        let contents = resolved.read("files://a").unwrap();
        assert!(matches!(&contents[0], ResourceContents::Text(t) if t.text == "first"));
    }

    #[test]
    fn listing_follows_registration_order() {
        let mut registry = Registry::new();
        for name in ["c", "a", "b"] {
            registry.register_tool(tool(name), constant(name), true);
        }
        let page = registry.list_tools(None, 10).unwrap();
        let names: Vec<&str> = page.items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn completion_via_prompt_provider() {
        let mut registry = Registry::new();
        let mut providers = CompletionProviders::new();
        let languages: Vec<String> = (0..150).map(|i| format!("lang{i}")).collect();
        providers.insert(
            "language".to_string(),
            Arc::new(ListCompletionProvider::new(languages)),
        );
        registry.register_prompt_with_completions(
            Prompt::new("review").unwrap(),
            constant("x"),
            providers,
            true,
        );

        let reference = CompletionReference::Prompt {
            name: "review".to_string(),
        };
        let completion = registry.complete(&reference, "language", "lang").unwrap();
        assert_eq!(completion.values.len(), 100);
        assert_eq!(completion.total, 150);
        assert!(completion.has_more);

        let empty = registry.complete(&reference, "other", "x").unwrap();
        assert_eq!(empty, Completion::default());

        let missing = CompletionReference::Prompt {
            name: "nope".to_string(),
        };
        assert!(matches!(
            registry.complete(&missing, "language", ""),
            Err(McpError::InvalidParams(_))
        ));
    }

    #[test]
    fn tool_content_survives_registry_round_trip() {
        let mut registry = Registry::new();
        registry.register_tool(
            tool("img"),
            handler_fn(|_| Ok(Content::image(b"x", "image/png").into())),
            true,
        );
        let contents = registry.get_tool("img").unwrap().call(Arguments::new()).unwrap();
        assert!(matches!(contents[0], Content::Image { .. }));
    }
}
