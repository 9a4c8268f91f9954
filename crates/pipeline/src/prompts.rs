//! Prompt templates and the user prompts built from them.
//!
//! A template is data: a system prompt plus a short format reminder that is
//! appended to every user prompt. The system prompt is passed through to the
//! backend untouched.

use std::path::Path;

/// Joins partial summaries in the reduce prompt.
pub const PARTIAL_SEPARATOR: &str = "\n\n---\n\n";

/// A named prompt variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub system: &'static str,
    pub format_reminder: &'static str,
}

const TELEGRAM_SYSTEM: &str = "You are an assistant for creating structured digests from Telegram channel posts about ML/AI.

IMPORTANT: Format for Telegram (no Markdown, plain text with emojis and structure).

Your task:
1. Analyze posts and group them by thematic categories
2. Create a brief summary for each category
3. List relevant posts with links for each category

Use the following categories (if information is available):
🔬 Research: scientific papers, research, preprints
🛠️ Tools: new tools, libraries, frameworks
📰 News: industry news, company announcements
📚 Tutorials: educational materials, tutorials, guides
💡 Other: everything else interesting

For each category:
🔬 Research
[2-4 sentences summary of key findings and developments]

• [Source] — Brief description
  🔗 [link]

Rules:
- Use line breaks for readability
- Use • for bullet points (not *, -, or numbers)
- Put links on separate lines with 🔗 emoji
- Use emojis for visual structure
- Keep it concise and scannable
- Preserve all original links
- No bold/italic/code formatting (Telegram won't render properly)";

const TELEGRAM_REMINDER: &str = "IMPORTANT: Format for Telegram - use emojis, line breaks, • bullets, separate lines for links with 🔗. No Markdown formatting.";

const MARKDOWN_SYSTEM: &str = "You are an assistant for creating structured digests from channel posts about ML/AI.

Your task:
1. Analyze posts and group them by thematic categories
2. Write a short summary for each category
3. List the relevant posts under each category with their links

Categories (use only those with content): Research, Tools, News, Tutorials, Other.

Format the digest as Markdown:
- One `##` heading per category
- A 2-4 sentence summary paragraph under each heading
- A bullet list of `[Source](link) - description` entries
- Preserve all original links";

const MARKDOWN_REMINDER: &str = "IMPORTANT: Output Markdown with `##` category headings and bullet lists. Keep every source link.";

const BRIEF_SYSTEM: &str = "You are an assistant that writes very short digests of ML/AI channel posts.

List only the most important items, at most ten in total, one line each:
• [Source] — one-sentence description 🔗 link

Skip duplicates and minor announcements. No categories, no summaries, plain text only.";

const BRIEF_REMINDER: &str = "IMPORTANT: Plain text, at most ten one-line bullets, each with its link.";

/// Built-in templates. The first entry is the default.
pub const TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        name: "telegram",
        description: "Categorized digest in plain text with emojis, ready for Telegram",
        system: TELEGRAM_SYSTEM,
        format_reminder: TELEGRAM_REMINDER,
    },
    PromptTemplate {
        name: "markdown",
        description: "Categorized digest with Markdown headings and link lists",
        system: MARKDOWN_SYSTEM,
        format_reminder: MARKDOWN_REMINDER,
    },
    PromptTemplate {
        name: "brief",
        description: "Top items only, one line each",
        system: BRIEF_SYSTEM,
        format_reminder: BRIEF_REMINDER,
    },
];

/// Look up a template by name.
pub fn template(name: &str) -> Option<&'static PromptTemplate> {
    TEMPLATES.iter().find(|t| t.name == name)
}

/// The prompts used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub system: String,
    pub format_reminder: String,
}

impl PromptSet {
    pub fn from_template(template: &PromptTemplate) -> Self {
        Self {
            system: template.system.to_string(),
            format_reminder: template.format_reminder.to_string(),
        }
    }

    /// Replace the system prompt, keeping the template's format reminder.
    pub fn with_system_override(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    /// Resolve prompts from configuration.
    ///
    /// Precedence: inline override, then override file, then the template's
    /// own system prompt.
    pub fn from_config(config: &digestr_config::PromptConfig) -> Result<Self, digestr_config::ConfigError> {
        let template = template(&config.template).ok_or_else(|| {
            digestr_config::ConfigError::ValidationError(format!(
                "unknown prompt template '{}' (available: {})",
                config.template,
                TEMPLATES.iter().map(|t| t.name).collect::<Vec<_>>().join(", ")
            ))
        })?;
        let set = Self::from_template(template);

        if let Some(system) = &config.system_prompt_override {
            return Ok(set.with_system_override(system.clone()));
        }
        if let Some(path) = &config.system_prompt_file {
            let system = std::fs::read_to_string(Path::new(path)).map_err(|e| {
                digestr_config::ConfigError::ReadError {
                    path: path.into(),
                    reason: e.to_string(),
                }
            })?;
            return Ok(set.with_system_override(system.trim().to_string()));
        }
        Ok(set)
    }

    /// Prompt for summarizing the whole corpus in one request.
    pub fn direct_prompt(&self, corpus: &str) -> String {
        format!(
            "Create a structured digest from the following posts:\n\n{corpus}\n\n{}",
            self.format_reminder
        )
    }

    /// Prompt for chunk `index` (1-based) of `total`.
    pub fn partial_prompt(&self, chunk: &str, index: usize, total: usize) -> String {
        format!(
            "This is part {index} of {total} posts. Analyze and create a partial digest for this part:\n\n{chunk}\n\n{}",
            self.format_reminder
        )
    }

    /// Prompt for merging partial digests already joined with [`PARTIAL_SEPARATOR`].
    pub fn reduce_prompt(&self, combined: &str) -> String {
        format!(
            "You have several partial digests below. Combine them into one final structured digest.

Tasks:
1. Merge similar topics and categories
2. Remove duplicates and repetitions
3. Create a unified brief summary for each category
4. Combine all source links
5. Preserve the output format

Partial digests:

{combined}

{}",
            self.format_reminder
        )
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::from_template(&TEMPLATES[0])
    }
}
