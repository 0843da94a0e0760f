//! Validation of raw model output
//!
//! Categorization is lenient: any text resolves to some category. Insight
//! parsing is strict: the whole response must be a JSON array of insight
//! records, and one bad element rejects the lot.

use thiserror::Error;

use crate::models::{Category, Insight};

/// Why a model response was not accepted as an insight list
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInsights {
    #[error("output is not valid JSON: {0}")]
    NotJson(String),

    #[error("output is JSON but not an array")]
    NotArray,

    #[error("element {index} is not a valid insight: {reason}")]
    InvalidElement { index: usize, reason: String },

    #[error("element {index} has confidence {value} outside 0.0-1.0")]
    ConfidenceOutOfRange { index: usize, value: f64 },
}

/// Resolve free text to a category
///
/// Scans for each label in declaration order (case-insensitive substring) and
/// returns the first one found, or `Other`.
pub fn resolve_category(text: &str) -> Category {
    let haystack = text.to_lowercase();
    Category::ALL
        .iter()
        .copied()
        .find(|c| haystack.contains(&c.as_str().to_lowercase()))
        .unwrap_or_default()
}

/// Parse model output as a list of insights
pub fn parse_insights(text: &str) -> Result<Vec<Insight>, InvalidInsights> {
    let value: serde_json::Value =
        serde_json::from_str(text.trim()).map_err(|e| InvalidInsights::NotJson(e.to_string()))?;

    let serde_json::Value::Array(elements) = value else {
        return Err(InvalidInsights::NotArray);
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let insight: Insight = serde_json::from_value(element)
                .map_err(|e| InvalidInsights::InvalidElement {
                    index,
                    reason: e.to_string(),
                })?;
            if !(0.0..=1.0).contains(&insight.confidence) {
                return Err(InvalidInsights::ConfidenceOutOfRange {
                    index,
                    value: insight.confidence,
                });
            }
            Ok(insight)
        })
        .collect()
}

/// Shorten raw output for logs and error messages, on a char boundary
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon;
    use crate::models::InsightKind;

    #[test]
    fn test_resolve_exact_label() {
        assert_eq!(resolve_category("Food"), Category::Food);
        assert_eq!(resolve_category("Utilities"), Category::Utilities);
    }

    #[test]
    fn test_resolve_ignores_case() {
        for text in ["FOOD", "food", "Food", "fOoD"] {
            assert_eq!(resolve_category(text), Category::Food);
        }
    }

    #[test]
    fn test_resolve_label_inside_sentence() {
        assert_eq!(
            resolve_category("The category is: Healthcare."),
            Category::Healthcare
        );
        assert_eq!(resolve_category("  shopping\n"), Category::Shopping);
    }

    #[test]
    fn test_resolve_first_label_in_declared_order_wins() {
        // Food is declared before Income regardless of position in the text
        assert_eq!(resolve_category("Income, or maybe Food"), Category::Food);
    }

    #[test]
    fn test_resolve_unknown_defaults_to_other() {
        assert_eq!(resolve_category(""), Category::Other);
        assert_eq!(resolve_category("Groceries"), Category::Other);
        assert_eq!(resolve_category("I cannot decide"), Category::Other);
    }

    #[test]
    fn test_resolve_every_lexicon_category() {
        for (_, category) in lexicon::entries() {
            let text = format!("Answer: {}", category.as_str().to_uppercase());
            assert_eq!(resolve_category(&text), *category);
        }
    }

    #[test]
    fn test_parse_valid_insights() {
        let text = r#"
[
  {"type": "tip", "title": "Save on Food", "description": "Cook at home.", "confidence": 0.9},
  {"type": "warning", "title": "Over budget", "description": "Entertainment exceeded.",
   "action": "Cancel one subscription", "confidence": 1.0}
]
"#;
        let insights = parse_insights(text).unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].kind, InsightKind::Tip);
        assert!(insights[0].action.is_none());
        assert_eq!(insights[1].action.as_deref(), Some("Cancel one subscription"));
    }

    #[test]
    fn test_parse_empty_array() {
        assert_eq!(parse_insights("[]").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_null_action_and_extra_fields() {
        let text = r#"[{"type": "prediction", "title": "t", "description": "d",
                        "action": null, "confidence": 0, "priority": "high"}]"#;
        let insights = parse_insights(text).unwrap();
        assert_eq!(insights[0].kind, InsightKind::Prediction);
        assert!(insights[0].action.is_none());
        assert_eq!(insights[0].confidence, 0.0);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_insights("Here are your insights: [..."),
            Err(InvalidInsights::NotJson(_))
        ));
        // surrounding prose is not stripped
        assert!(matches!(
            parse_insights("Sure! []"),
            Err(InvalidInsights::NotJson(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let text = r#"{"type": "tip", "title": "t", "description": "d", "confidence": 0.5}"#;
        assert_eq!(parse_insights(text), Err(InvalidInsights::NotArray));
    }

    #[test]
    fn test_parse_rejects_whole_array_on_bad_element() {
        let text = r#"[
            {"type": "tip", "title": "ok", "description": "fine", "confidence": 0.5},
            {"type": "advice", "title": "bad", "description": "unknown type", "confidence": 0.5}
        ]"#;
        match parse_insights(text) {
            Err(InvalidInsights::InvalidElement { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidElement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let text = r#"[{"type": "tip", "title": "no description", "confidence": 0.5}]"#;
        assert!(matches!(
            parse_insights(text),
            Err(InvalidInsights::InvalidElement { index: 0, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_confidence_out_of_range() {
        let text = r#"[{"type": "tip", "title": "t", "description": "d", "confidence": 1.5}]"#;
        assert_eq!(
            parse_insights(text),
            Err(InvalidInsights::ConfidenceOutOfRange {
                index: 0,
                value: 1.5
            })
        );
    }

    #[test]
    fn test_insights_survive_serialization() {
        let text = r#"[
            {"type": "achievement", "title": "Great", "description": "Under budget", "confidence": 0.8},
            {"type": "warning", "title": "Rent", "description": "Due soon", "action": "Set aside 500", "confidence": 0.65}
        ]"#;
        let first = parse_insights(text).unwrap();
        let reparsed = parse_insights(&serde_json::to_string(&first).unwrap()).unwrap();
        assert_eq!(first, reparsed);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 4), "héll...");
    }
}
