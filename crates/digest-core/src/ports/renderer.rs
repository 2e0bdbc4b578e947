//! TemplateRenderer port - named template + JSON context -> HTML.
//!
//! Helpers are injected when the renderer is built, before any template is
//! compiled, so `render` only needs the context.

use crate::domain::RenderError;

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, RenderError>;
}
