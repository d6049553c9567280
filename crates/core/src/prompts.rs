//! Named prompt templates loaded from a directory of markdown files.
//!
//! A missing template file resolves to an empty string rather than a fatal
//! configuration error; the pipeline's fallback rules cover the degraded
//! output that results. Other I/O failures are real errors and propagate.

use std::fs;
use std::io;
use std::path::Path;

pub const TEMPLATE_FILES: &[(&str, &str)] = &[
    ("system_role", "system_role.md"),
    ("intent_detection", "intent_detection.md"),
    ("emotion_risk", "emotion_risk.md"),
    ("strategy_routing", "strategy_routing.md"),
    ("response_generation", "response_generation.md"),
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptLibrary {
    pub system_role: String,
    pub intent_detection: String,
    pub emotion_risk: String,
    pub strategy_routing: String,
    pub response_generation: String,
}

impl PromptLibrary {
    pub fn load(dir: &Path) -> io::Result<Self> {
        Ok(Self {
            system_role: load_template(dir, "system_role.md")?,
            intent_detection: load_template(dir, "intent_detection.md")?,
            emotion_risk: load_template(dir, "emotion_risk.md")?,
            strategy_routing: load_template(dir, "strategy_routing.md")?,
            response_generation: load_template(dir, "response_generation.md")?,
        })
    }

    /// Names of templates that resolved to empty strings, for operator
    /// diagnostics.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("system_role", &self.system_role),
            ("intent_detection", &self.intent_detection),
            ("emotion_risk", &self.emotion_risk),
            ("strategy_routing", &self.strategy_routing),
            ("response_generation", &self.response_generation),
        ]
        .into_iter()
        .filter(|(_, content)| content.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn load_template(dir: &Path, file_name: &str) -> io::Result<String> {
    match fs::read_to_string(dir.join(file_name)) {
        Ok(content) => Ok(content),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(error) => Err(error),
    }
}

/// Literal `{{name}}` substitution. Not a templating language: no escaping,
/// no loops, no conditionals. Template authors must not use `{{` outside
/// intended placeholders.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in substitutions {
        rendered = rendered.replace(&format!("{{{{{name}}}}}"), value);
    }
    rendered
}
