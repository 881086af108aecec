//! Protocol value objects shared by the registry and the method handlers.

pub mod content;
pub mod definitions;

pub use content::{
    Annotations, BlobResourceContents, Content, PromptMessage, ResourceContents, Role,
    TextResourceContents,
};
pub use definitions::{
    Prompt, PromptArgument, Resource, ResourceTemplate, Tool, ToolAnnotations,
};
