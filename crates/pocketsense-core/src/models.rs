//! Domain types exchanged with the inference pipeline
//!
//! Everything here is transient: built per request from the caller's payload
//! and dropped once the response is sent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of transaction categories
///
/// Declaration order matters: category resolution scans model output for
/// these names in this order and takes the first hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Education,
    Healthcare,
    Shopping,
    Utilities,
    Income,
    #[default]
    Other,
}

impl Category {
    /// All categories in declaration order
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Education,
        Category::Healthcare,
        Category::Shopping,
        Category::Utilities,
        Category::Income,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Education => "Education",
            Category::Healthcare => "Healthcare",
            Category::Shopping => "Shopping",
            Category::Utilities => "Utilities",
            Category::Income => "Income",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Direction of money movement for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction as supplied by the caller for insight generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub amount: f64,
    /// Free-form category as stored by the caller (not restricted to `Category`)
    pub category: String,
    pub description: String,
    /// ISO date string, passed through untouched
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub recurring: bool,
    /// Comma-separated tags
    #[serde(default)]
    pub tags: Option<String>,
}

/// Budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

/// A budget line as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub category: String,
    pub allocated: f64,
    pub spent: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
}

/// Everything analyzed by one insight-generation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    #[serde(default)]
    pub transactions: Vec<TransactionSummary>,
    #[serde(default)]
    pub budgets: Vec<BudgetSummary>,
}

impl FinancialSnapshot {
    pub fn new(transactions: Vec<TransactionSummary>, budgets: Vec<BudgetSummary>) -> Self {
        Self {
            transactions,
            budgets,
        }
    }

    /// The last `window` transactions, in their original order
    pub fn recent_transactions(&self, window: usize) -> &[TransactionSummary] {
        let start = self.transactions.len().saturating_sub(window);
        &self.transactions[start..]
    }
}

/// Kind of insight the model may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Tip,
    Achievement,
    Prediction,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Warning => "warning",
            InsightKind::Tip => "tip",
            InsightKind::Achievement => "achievement",
            InsightKind::Prediction => "prediction",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(InsightKind::Warning),
            "tip" => Ok(InsightKind::Tip),
            "achievement" => Ok(InsightKind::Achievement),
            "prediction" => Ok(InsightKind::Prediction),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// A validated financial insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Model confidence, 0.0-1.0
    pub confidence: f64,
}
