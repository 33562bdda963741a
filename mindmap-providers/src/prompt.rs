//! Prompt text sent with every generation request.
//!
//! The system instruction is injected configuration: callers may replace it
//! without touching the generator. Two placeholders are substituted when
//! rendering: `{content}` and `{max_depth}`.

/// Placeholder for the user's source text.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

/// Placeholder for the requested hierarchy depth.
pub const DEPTH_PLACEHOLDER: &str = "{max_depth}";

const DEFAULT_SYSTEM: &str = r#"You turn text into a mind map and reply with a single JSON object, no prose and no code fences.

The object has exactly two arrays: "nodes" and "edges".

Each node:
{"id": "1", "type": "input", "position": {"x": 0, "y": 0}, "data": {"label": "Main topic"}, "sourcePosition": "right", "targetPosition": "left", "parentId": "..."}

- "id": unique string.
- "position": x grows with depth (about 250 per level), y spreads siblings (about 100 apart).
- "data.label": short phrase.
- "type": "input" for the single central node, "output" for leaves, "default" otherwise.
- "parentId": id of the parent node; omit it on the central node.

Each edge:
{"id": "e1-2", "source": "1", "target": "2", "type": "smoothstep", "animated": false}

- "id": unique string.
- "source" and "target" must be ids of nodes in the same document.

Use at most {max_depth} levels below the central node and keep labels concise."#;

const DEFAULT_USER: &str =
    "Generate a mind map structure for the following content, responding with JSON only: {content}";

/// System instruction plus user message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system: String,
    user: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM.to_string(),
            user: DEFAULT_USER.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Create a template from explicit texts.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Replace the system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    /// Replace the user template.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Raw system text.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Raw user template.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// System instruction with placeholders filled.
    pub fn render_system(&self, max_depth: u32) -> String {
        self.system
            .replace(DEPTH_PLACEHOLDER, &max_depth.to_string())
    }

    /// User message with placeholders filled.
    ///
    /// The depth is substituted first so that braces inside the content
    /// are never treated as placeholders.
    pub fn render_user(&self, content: &str, max_depth: u32) -> String {
        self.user
            .replace(DEPTH_PLACEHOLDER, &max_depth.to_string())
            .replace(CONTENT_PLACEHOLDER, content)
    }
}
