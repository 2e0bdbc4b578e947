//! Handlebars-backed template renderer and the HTML to text fallback.

use handlebars::{Handlebars, handlebars_helper};
use std::path::Path;

use crate::domain::RenderError;
use crate::ports::TemplateRenderer;

/// Name of the digest email template.
pub const DIGEST_TEMPLATE: &str = "digest";

const BUILTIN_DIGEST_TEMPLATE: &str = include_str!("../../templates/digest.hbs");

/// Line width of the text alternative.
const TEXT_WIDTH: usize = 80;

handlebars_helper!(count: |items: Json| items.as_array().map_or(0, |a| a.len()));
handlebars_helper!(plural: |n: u64, one: str, many: str| {
    if n == 1 { one.to_string() } else { many.to_string() }
});

pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Renderer with the built-in digest template.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_digest_template(BUILTIN_DIGEST_TEMPLATE)
    }

    /// Renderer whose digest template is read from `path`.
    pub fn from_template_file(path: &Path) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|e| RenderError::Template {
            name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::with_digest_template(&source)
    }

    fn with_digest_template(source: &str) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        // Helpers go in before any template is compiled.
        registry.register_helper("count", Box::new(count));
        registry.register_helper("plural", Box::new(plural));
        registry
            .register_template_string(DIGEST_TEMPLATE, source)
            .map_err(|e| RenderError::Template {
                name: DIGEST_TEMPLATE.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { registry })
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, RenderError> {
        if !self.registry.has_template(template) {
            return Err(RenderError::TemplateNotFound(template.to_string()));
        }
        self.registry
            .render(template, context)
            .map_err(|e| RenderError::Template {
                name: template.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Plain-text alternative of an HTML email. Tables are kept as text tables.
pub fn html_to_text(html: &str) -> Result<String, RenderError> {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH).map_err(|e| RenderError::Text(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn context() -> serde_json::Value {
        json!({
            "user": { "_id": "u1", "profile": { "firstName": "Ada", "digests": ["p1"] } },
            "date": "09/03/2024",
            "emailSettingsUrl": "https://app.example.com/settings/mail",
            "digests": [{
                "project": { "_id": "p1", "name": "Apollo <core>", "members": [] },
                "completed": [],
                "created": [
                    { "_id": "d1", "projectId": "p1", "type": "tasks.create", "when": "2024-03-09", "taskName": "Write report" },
                    { "_id": "d2", "projectId": "p1", "type": "tasks.create", "when": "2024-03-09", "taskName": "Review" }
                ],
                "updated": [],
                "removed": []
            }]
        })
    }

    #[test]
    fn builtin_template_renders_bundle() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let html = renderer.render(DIGEST_TEMPLATE, &context()).unwrap();

        assert!(html.contains("09/03/2024"));
        assert!(html.contains("Ada"));
        assert!(html.contains("Write report"));
        assert!(html.contains("https://app.example.com/settings/mail"));
        // Project names are escaped.
        assert!(html.contains("Apollo &lt;core&gt;"));
        // Empty sections are not rendered.
        assert!(!html.contains("Tâches terminées"));
    }

    #[rstest]
    #[case::with_first_name(json!({ "firstName": "Ada", "digests": ["p1"] }), "Bonjour Ada, voici")]
    #[case::without_first_name(json!({ "digests": ["p1"] }), "Bonjour, voici")]
    fn greeting_punctuation(#[case] profile: serde_json::Value, #[case] expected: &str) {
        let mut ctx = context();
        ctx["user"]["profile"] = profile;

        let html = HandlebarsRenderer::new().unwrap().render(DIGEST_TEMPLATE, &ctx).unwrap();
        assert!(html.contains(expected), "{html}");
    }

    #[test]
    fn unknown_template_is_reported() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let err = renderer.render("nope", &context()).unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(name) if name == "nope"));
    }

    #[test]
    fn helpers_are_available_to_custom_templates() {
        let renderer =
            HandlebarsRenderer::with_digest_template("{{count items}} {{plural (count items) \"task\" \"tasks\"}}")
                .unwrap();
        let out = renderer
            .render(DIGEST_TEMPLATE, &json!({ "items": [1, 2, 3] }))
            .unwrap();
        assert_eq!(out, "3 tasks");

        let out = renderer.render(DIGEST_TEMPLATE, &json!({ "items": [1] })).unwrap();
        assert_eq!(out, "1 task");
    }

    #[test]
    fn broken_template_fails_at_construction() {
        assert!(HandlebarsRenderer::with_digest_template("{{#if}}").is_err());
    }

    #[test]
    fn text_alternative_keeps_table_content() {
        let text = html_to_text(
            "<h1>Rapport</h1><table><tr><td>Apollo</td><td>3</td></tr></table>",
        )
        .unwrap();
        assert!(text.contains("Rapport"));
        assert!(text.contains("Apollo"));
        assert!(text.contains('3'));
    }
}
