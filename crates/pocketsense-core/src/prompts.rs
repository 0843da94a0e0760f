//! Prompt library for the inference pipeline
//!
//! Prompts are Markdown files with YAML frontmatter and `# System` / `# User`
//! sections. Resolution is two-layer:
//! 1. `<prompts_dir>/<id>.md` when that override file exists
//! 2. The embedded default compiled into the binary
//!
//! The library is loaded once at startup and never mutated afterwards, so it
//! can be shared behind an `Arc` without locking.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Category, FinancialSnapshot};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const CATEGORIZE_TRANSACTION: &str =
        include_str!("../../../prompts/categorize_transaction.md");
    pub const GENERATE_INSIGHTS: &str = include_str!("../../../prompts/generate_insights.md");
}

/// How many of the most recent transactions an insight prompt shows
pub const DEFAULT_TRANSACTION_WINDOW: usize = 10;

/// One worked example per category, shown to the model before the real query
pub const FEW_SHOT_EXAMPLES: &[(&str, Category)] = &[
    ("Weekly groceries for the dorm", Category::Food),
    ("Subway pass for campus commuting", Category::Transportation),
    ("Netflix monthly subscription", Category::Entertainment),
    ("Textbooks for my psychology class", Category::Education),
    ("Co-pay for doctor's visit", Category::Healthcare),
    ("New pair of running shoes", Category::Shopping),
    ("Monthly internet bill", Category::Utilities),
    ("Part-time job salary deposit", Category::Income),
    ("Gift for my roommate's birthday", Category::Other),
];

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    CategorizeTransaction,
    GenerateInsights,
}

impl PromptId {
    /// Get the string identifier for this prompt (also its override file stem)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategorizeTransaction => "categorize_transaction",
            Self::GenerateInsights => "generate_insights",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::CategorizeTransaction, Self::GenerateInsights]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::CategorizeTransaction => defaults::CATEGORIZE_TRANSACTION,
            Self::GenerateInsights => defaults::GENERATE_INSIGHTS,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    pub task_type: String,
}

/// A system instruction plus user prompt, ready to send to a backend
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Raw `# System` section
    pub system: String,
    /// Raw `# User` section
    pub user: String,
    /// Path to the override file this came from (None = embedded)
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    fn parse(content: &str, override_path: Option<PathBuf>) -> Result<Self> {
        let (metadata, body) = parse_prompt(content)?;
        let system = extract_section(&body, "# System").ok_or_else(|| {
            Error::Prompt(format!("Prompt '{}' has no '# System' section", metadata.id))
        })?;
        let user = extract_section(&body, "# User").ok_or_else(|| {
            Error::Prompt(format!("Prompt '{}' has no '# User' section", metadata.id))
        })?;

        Ok(Self {
            system: system.to_string(),
            user: user.to_string(),
            metadata,
            override_path,
        })
    }

    pub fn is_override(&self) -> bool {
        self.override_path.is_some()
    }

    /// Render both sections with `{{var}}` placeholders substituted
    pub fn render(&self, vars: &[(&str, &str)]) -> PromptPair {
        PromptPair {
            system: render_template(&self.system, vars),
            user: render_template(&self.user, vars),
        }
    }
}

/// Loaded set of prompts, one per `PromptId`
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    categorize: Prompt,
    insights: Prompt,
}

impl PromptLibrary {
    /// Library built only from the embedded defaults
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            override_dir: None,
            categorize: Prompt::parse(PromptId::CategorizeTransaction.default_content(), None)?,
            insights: Prompt::parse(PromptId::GenerateInsights.default_content(), None)?,
        })
    }

    /// Load prompts, preferring `<override_dir>/<id>.md` over embedded defaults
    ///
    /// A present but unparseable override is an error rather than a silent
    /// fallback.
    pub fn load(override_dir: Option<&Path>) -> Result<Self> {
        Ok(Self {
            override_dir: override_dir.map(Path::to_path_buf),
            categorize: load_prompt(PromptId::CategorizeTransaction, override_dir)?,
            insights: load_prompt(PromptId::GenerateInsights, override_dir)?,
        })
    }

    pub fn get(&self, id: PromptId) -> &Prompt {
        match id {
            PromptId::CategorizeTransaction => &self.categorize,
            PromptId::GenerateInsights => &self.insights,
        }
    }

    /// Prompt pair asking for the category of a single description
    pub fn categorization(&self, description: &str) -> PromptPair {
        let categories = category_list();
        let examples = few_shot_block();
        self.categorize.render(&[
            ("categories", categories.as_str()),
            ("examples", examples.as_str()),
            ("description", description),
        ])
    }

    /// Prompt pair asking for insights over budgets and the last `window`
    /// transactions
    pub fn insights(&self, snapshot: &FinancialSnapshot, window: usize) -> PromptPair {
        let budgets = budget_lines(snapshot);
        let transactions = transaction_lines(snapshot, window);
        self.insights.render(&[
            ("budgets", budgets.as_str()),
            ("transactions", transactions.as_str()),
        ])
    }

    /// List all prompts with their override status
    pub fn list(&self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let prompt = self.get(id);
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.metadata.version,
                    task_type: prompt.metadata.task_type.clone(),
                    override_path: prompt.override_path.clone(),
                }
            })
            .collect()
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub task_type: String,
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pocketsense").join("prompts"))
}

static EMBEDDED: LazyLock<PromptLibrary> = LazyLock::new(|| {
    PromptLibrary::embedded().expect("embedded prompt templates are well-formed")
});

/// Categorization prompt from the embedded templates
pub fn build_categorization_prompt(description: &str) -> PromptPair {
    EMBEDDED.categorization(description)
}

/// Insight prompt from the embedded templates, using the default window
pub fn build_insight_prompt(snapshot: &FinancialSnapshot) -> PromptPair {
    EMBEDDED.insights(snapshot, DEFAULT_TRANSACTION_WINDOW)
}

fn load_prompt(id: PromptId, override_dir: Option<&Path>) -> Result<Prompt> {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{}.md", id.as_str()));
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Prompt(format!("Failed to read {}: {}", path.display(), e))
            })?;
            return Prompt::parse(&content, Some(path));
        }
    }
    Prompt::parse(id.default_content(), None)
}

fn category_list() -> String {
    Category::ALL
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n")
}

fn few_shot_block() -> String {
    FEW_SHOT_EXAMPLES
        .iter()
        .map(|(description, category)| {
            format!("Description: \"{}\"\nCategory: {}", description, category)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn budget_lines(snapshot: &FinancialSnapshot) -> String {
    if snapshot.budgets.is_empty() {
        return "(none)".to_string();
    }
    snapshot
        .budgets
        .iter()
        .map(|b| {
            format!(
                "- {}: allocated={:.2}, spent={:.2}",
                b.category, b.allocated, b.spent
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn transaction_lines(snapshot: &FinancialSnapshot, window: usize) -> String {
    let recent = snapshot.recent_transactions(window);
    if recent.is_empty() {
        return "(none)".to_string();
    }
    recent
        .iter()
        .map(|t| {
            format!(
                "- {}: {} ({:.2}, {})",
                t.category, t.description, t.amount, t.kind
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::Prompt(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::Prompt("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::Prompt(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt body, up to the next top-level header
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Single-pass `{{var}}` substitution
///
/// Substituted values are not rescanned, so a description containing `{{x}}`
/// reaches the model verbatim. Unknown placeholders are left untouched.
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = after_open[..close].trim();
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, BudgetSummary, TransactionKind, TransactionSummary};

    fn tx(description: &str, amount: f64) -> TransactionSummary {
        TransactionSummary {
            amount,
            category: "Food".to_string(),
            description: description.to_string(),
            date: "2024-03-01".to_string(),
            kind: TransactionKind::Expense,
            recurring: false,
            tags: None,
        }
    }

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 2
task_type: categorization
---

# System
Test system prompt.

# User
Test user prompt with {{variable}}.
"#;

        let prompt = Prompt::parse(content, None).unwrap();
        assert_eq!(prompt.metadata.id, "test_prompt");
        assert_eq!(prompt.metadata.version, 2);
        assert_eq!(prompt.system, "Test system prompt.");
        assert_eq!(prompt.user, "Test user prompt with {{variable}}.");
        assert!(!prompt.is_override());
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(matches!(
            parse_prompt("# System\nhello"),
            Err(Error::Prompt(_))
        ));
        assert!(matches!(
            parse_prompt("---\nid: x\n# System\nhello"),
            Err(Error::Prompt(_))
        ));
    }

    #[test]
    fn test_parse_prompt_requires_both_sections() {
        let content = "---\nid: x\nversion: 1\ntask_type: t\n---\n# System\nonly system";
        let err = Prompt::parse(content, None).unwrap_err();
        assert!(err.to_string().contains("# User"));
    }

    #[test]
    fn test_render_template() {
        let rendered = render_template(
            "Hello {{name}}, value {{ value }}, keep {{unknown}}",
            &[("name", "World"), ("value", "42")],
        );
        assert_eq!(rendered, "Hello World, value 42, keep {{unknown}}");
    }

    #[test]
    fn test_render_template_does_not_rescan_values() {
        let rendered = render_template("Say '{{description}}'", &[("description", "{{description}}")]);
        assert_eq!(rendered, "Say '{{description}}'");
    }

    #[test]
    fn test_render_template_unclosed_placeholder() {
        assert_eq!(render_template("a {{b", &[("b", "x")]), "a {{b");
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let prompt = Prompt::parse(id.default_content(), None).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
        }
    }

    #[test]
    fn test_categorization_prompt() {
        let pair = build_categorization_prompt("Coffee at the library");
        assert_eq!(
            pair.user,
            "Categorize the following transaction: 'Coffee at the library'"
        );
        for category in Category::ALL {
            assert!(pair.system.contains(&format!("- {}", category)));
        }
        for (description, category) in FEW_SHOT_EXAMPLES {
            assert!(pair
                .system
                .contains(&format!("Description: \"{}\"\nCategory: {}", description, category)));
        }
        assert!(!pair.system.contains("{{"));
    }

    #[test]
    fn test_categorization_prompt_is_deterministic() {
        assert_eq!(
            build_categorization_prompt("Bus ticket"),
            build_categorization_prompt("Bus ticket")
        );
    }

    #[test]
    fn test_few_shot_examples_cover_every_category() {
        for category in Category::ALL {
            assert_eq!(
                FEW_SHOT_EXAMPLES.iter().filter(|(_, c)| *c == category).count(),
                1
            );
        }
    }

    #[test]
    fn test_insight_prompt_renders_budgets_and_window() {
        let transactions = (1..=12).map(|i| tx(&format!("purchase-{:02}", i), i as f64)).collect();
        let budgets = vec![BudgetSummary {
            category: "Food".to_string(),
            allocated: 300.0,
            spent: 123.456,
            period: BudgetPeriod::Monthly,
        }];
        let pair = build_insight_prompt(&FinancialSnapshot::new(transactions, budgets));

        assert!(pair.user.contains("- Food: allocated=300.00, spent=123.46"));
        assert!(!pair.user.contains("purchase-01"));
        assert!(!pair.user.contains("purchase-02"));
        assert!(pair.user.contains("- Food: purchase-03 (3.00, expense)"));
        assert!(pair.user.contains("- Food: purchase-12 (12.00, expense)"));

        let first = pair.user.find("purchase-03").unwrap();
        let last = pair.user.find("purchase-12").unwrap();
        assert!(first < last);
        assert!(pair.system.contains("JSON array"));
    }

    #[test]
    fn test_insight_prompt_empty_snapshot() {
        let pair = build_insight_prompt(&FinancialSnapshot::default());
        assert!(pair.user.contains("Budgets:\n(none)"));
        assert!(pair.user.contains("Recent Transactions:\n(none)"));
    }

    #[test]
    fn test_library_uses_override_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("categorize_transaction.md"),
            "---\nid: categorize_transaction\nversion: 7\ntask_type: categorization\n---\n\n# System\nPick one.\n\n# User\nWhat is '{{description}}'?\n",
        )
        .unwrap();

        let library = PromptLibrary::load(Some(dir.path())).unwrap();
        let pair = library.categorization("Taxi home");
        assert_eq!(pair.system, "Pick one.");
        assert_eq!(pair.user, "What is 'Taxi home'?");
        assert!(library.get(PromptId::CategorizeTransaction).is_override());
        assert!(!library.get(PromptId::GenerateInsights).is_override());

        let listed = library.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].version, 7);
        assert!(listed[1].override_path.is_none());
    }

    #[test]
    fn test_library_rejects_broken_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("generate_insights.md"), "no frontmatter").unwrap();
        assert!(matches!(
            PromptLibrary::load(Some(dir.path())),
            Err(Error::Prompt(_))
        ));
    }

    #[test]
    fn test_library_without_override_dir_matches_embedded() {
        let loaded = PromptLibrary::load(None).unwrap();
        assert_eq!(
            loaded.categorization("Gym"),
            build_categorization_prompt("Gym")
        );
        assert!(loaded.override_dir().is_none());
    }
}
