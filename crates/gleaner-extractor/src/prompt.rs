//! LLM prompt templates for entity and relationship extraction
//!
//! Templates use `{name}` placeholders filled from [`PromptArgs`]. Literal
//! braces are written as `{{` and `}}`.

use gleaner_domain::{PromptArgs, PromptRenderer, RenderError};
use std::collections::HashMap;

/// Template for the initial extraction request
pub const EXTRACTION_TEMPLATE: &str = "entity_relationship_extraction";

/// Template asking the model for entities it missed
pub const CONTINUE_TEMPLATE: &str = "entity_relationship_continue_extraction";

/// Template asking whether gleaning should stop
pub const GLEANING_DONE_TEMPLATE: &str = "entity_relationship_gleaning_done_extraction";

/// Argument carrying the chunk text
pub const INPUT_TEXT_ARG: &str = "input_text";

/// Argument carrying the worked extraction example
pub const EXAMPLE_ARG: &str = "entity_relationship_extraction_example";

/// Argument carrying the comma-joined allowed entity types
pub const ENTITY_TYPES_ARG: &str = "entity_types";

/// Argument carrying the domain description
pub const DOMAIN_ARG: &str = "domain";

/// Argument carrying newline-joined example queries
pub const EXAMPLE_QUERIES_ARG: &str = "example_queries";

const EXTRACTION_PROMPT: &str = r#"You are a helpful assistant that builds a knowledge graph from text for the following domain:
{domain}

The graph will be used to answer questions such as:
{example_queries}

Goal: given a text and a list of entity types, identify all entities of those types and all relationships among the identified entities.

Steps:
1. Identify all entities. For each entity, extract:
   - name: name of the entity, as it appears in the text
   - type: one of the following types: [{entity_types}]
   - description: comprehensive description of the entity's attributes and activities
2. From the entities identified in step 1, identify every pair of (source, target) entities that are clearly related to each other. For each pair, extract:
   - source: name of the source entity
   - target: name of the target entity
   - description: explanation of how the source and target are related
3. Report relationships that involve entities outside the allowed types under "other_relationships".

Answer with a single JSON object of the form:
{{"entities": [...], "relationships": [...], "other_relationships": [...]}}

Example:
{entity_relationship_extraction_example}

Text:
{input_text}

Output:
"#;

const CONTINUE_PROMPT: &str =
    "MANY entities were missed in the last extraction.  Add them below using the same format:";

const GLEANING_DONE_PROMPT: &str = r#"Retrospectively check if all entities have been correctly identified: answer done if so, or continue if there are still entities that need to be added.
Answer with a single JSON object: {{"status": "done"}} or {{"status": "continue"}}"#;

/// Worked example passed to the extraction template
pub const EXTRACTION_EXAMPLE: &str = r#"{
  "entities": [
    {"name": "Scrooge", "type": "CHARACTER", "description": "A miserly old man who runs a counting-house in London."},
    {"name": "Bob Cratchit", "type": "CHARACTER", "description": "Scrooge's underpaid and patient clerk."},
    {"name": "London", "type": "PLACE", "description": "The city where Scrooge keeps his counting-house."}
  ],
  "relationships": [
    {"source": "Scrooge", "target": "Bob Cratchit", "description": "Scrooge employs Bob Cratchit as his clerk and pays him poorly."},
    {"source": "Scrooge", "target": "London", "description": "Scrooge lives and works in London."}
  ],
  "other_relationships": []
}"#;

/// Named prompt templates with `{key}` substitution
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    templates: HashMap<String, String>,
}

impl TemplateRenderer {
    /// Create a renderer with no templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with the built-in extraction templates
    pub fn with_defaults() -> Self {
        Self::new()
            .with_template(EXTRACTION_TEMPLATE, EXTRACTION_PROMPT)
            .with_template(CONTINUE_TEMPLATE, CONTINUE_PROMPT)
            .with_template(GLEANING_DONE_TEMPLATE, GLEANING_DONE_PROMPT)
    }

    /// Register or replace a template
    pub fn with_template(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(name.into(), text.into());
        self
    }
}

impl PromptRenderer for TemplateRenderer {
    fn render(&self, template: &str, args: &PromptArgs) -> Result<String, RenderError> {
        let text = self
            .templates
            .get(template)
            .ok_or_else(|| RenderError::UnknownTemplate(template.to_string()))?;
        render_template(template, text, args)
    }
}

/// Substitute `{key}` placeholders in `text`
pub fn render_template(name: &str, text: &str, args: &PromptArgs) -> Result<String, RenderError> {
    let malformed = |reason: &str| RenderError::Malformed {
        template: name.to_string(),
        reason: reason.to_string(),
    };

    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(k) if k.is_ascii_alphanumeric() || k == '_' => key.push(k),
                        Some(other) => {
                            return Err(malformed(&format!(
                                "invalid character '{}' in placeholder",
                                other
                            )))
                        }
                        None => return Err(malformed("unclosed placeholder")),
                    }
                }
                if key.is_empty() {
                    return Err(malformed("empty placeholder"));
                }
                let value = args.get(&key).ok_or_else(|| RenderError::MissingArgument {
                    template: name.to_string(),
                    key: key.clone(),
                })?;
                output.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '}' => return Err(malformed("unmatched '}'")),
            other => output.push(other),
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction_args() -> PromptArgs {
        PromptArgs::new()
            .with(DOMAIN_ARG, "Victorian fiction")
            .with_list(EXAMPLE_QUERIES_ARG, ["Who is Scrooge?", "Where is the counting-house?"])
            .with(ENTITY_TYPES_ARG, "CHARACTER,PLACE")
            .with(EXAMPLE_ARG, EXTRACTION_EXAMPLE)
            .with(INPUT_TEXT_ARG, "Marley was dead: to begin with.")
    }

    #[test]
    fn test_render_extraction_prompt() {
        let renderer = TemplateRenderer::with_defaults();
        let prompt = renderer.render(EXTRACTION_TEMPLATE, &extraction_args()).unwrap();

        assert!(prompt.contains("Victorian fiction"));
        assert!(prompt.contains("Who is Scrooge?\nWhere is the counting-house?"));
        assert!(prompt.contains("[CHARACTER,PLACE]"));
        assert!(prompt.contains("Marley was dead"));
        assert!(prompt.contains(r#"{"entities": [...], "relationships": [...], "other_relationships": [...]}"#));
        assert!(!prompt.contains("{input_text}"));
    }

    #[test]
    fn test_render_fixed_prompts_without_args() {
        let renderer = TemplateRenderer::with_defaults();
        let args = PromptArgs::new();

        let continue_prompt = renderer.render(CONTINUE_TEMPLATE, &args).unwrap();
        assert!(continue_prompt.starts_with("MANY entities were missed"));

        let done_prompt = renderer.render(GLEANING_DONE_TEMPLATE, &args).unwrap();
        assert!(done_prompt.contains(r#"{"status": "done"}"#));
    }

    #[test]
    fn test_missing_argument() {
        let renderer = TemplateRenderer::with_defaults();
        let args = PromptArgs::new().with(DOMAIN_ARG, "fiction");

        let err = renderer.render(EXTRACTION_TEMPLATE, &args).unwrap_err();
        assert!(matches!(err, RenderError::MissingArgument { .. }));
    }

    #[test]
    fn test_unknown_template() {
        let renderer = TemplateRenderer::new();
        let err = renderer.render("nope", &PromptArgs::new()).unwrap_err();
        assert_eq!(err, RenderError::UnknownTemplate("nope".to_string()));
    }

    #[test]
    fn test_malformed_templates() {
        let args = PromptArgs::new().with("a", "1");

        for text in ["{a", "a}", "{}", "{a b}"] {
            let err = render_template("t", text, &args).unwrap_err();
            assert!(matches!(err, RenderError::Malformed { .. }), "{text}: {err:?}");
        }
    }

    #[test]
    fn test_escaped_braces_and_non_ascii() {
        let args = PromptArgs::new().with("name", "世界");
        let rendered = render_template("t", "{{héllo}} {name}!", &args).unwrap();
        assert_eq!(rendered, "{héllo} 世界!");
    }

    #[test]
    fn test_example_is_valid_graph_json() {
        let graph: gleaner_domain::Graph = serde_json::from_str(EXTRACTION_EXAMPLE).unwrap();
        assert_eq!(graph.entities.len(), 3);
        assert_eq!(graph.relationships.len(), 2);
    }
}
