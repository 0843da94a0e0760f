//! Keyword lexicon for transaction categories
//!
//! A fixed table of lowercase keyword fragments and the category each one
//! implies. The LLM path never consults it; it backs the mock backend and
//! offline diagnostics, and documents the vocabulary the prompts teach.

use crate::models::Category;

/// Fragment table, grouped by category in declaration order
static ENTRIES: &[(&str, Category)] = &[
    ("groceries", Category::Food),
    ("food", Category::Food),
    ("restaurant", Category::Food),
    ("coffee", Category::Food),
    ("uber", Category::Transportation),
    ("taxi", Category::Transportation),
    ("bus", Category::Transportation),
    ("train", Category::Transportation),
    ("netflix", Category::Entertainment),
    ("spotify", Category::Entertainment),
    ("movie", Category::Entertainment),
    ("concert", Category::Entertainment),
    ("book", Category::Education),
    ("course", Category::Education),
    ("tuition", Category::Education),
    ("doctor", Category::Healthcare),
    ("pharmacy", Category::Healthcare),
    ("dental", Category::Healthcare),
    ("amazon", Category::Shopping),
    ("clothes", Category::Shopping),
    ("shoes", Category::Shopping),
    ("electricity", Category::Utilities),
    ("internet", Category::Utilities),
    ("water", Category::Utilities),
    ("phone", Category::Utilities),
    ("salary", Category::Income),
    ("payment", Category::Income),
    ("scholarship", Category::Income),
    ("gift", Category::Other),
    ("donation", Category::Other),
];

/// Exact lookup of a single fragment (case-insensitive, whitespace trimmed)
pub fn lookup(fragment: &str) -> Option<Category> {
    let needle = fragment.trim().to_lowercase();
    ENTRIES
        .iter()
        .find(|(keyword, _)| *keyword == needle)
        .map(|(_, category)| *category)
}

/// Scan a free-text description for any known fragment
///
/// The first fragment in table order that occurs anywhere in the description
/// wins, so "coffee book" resolves to `Food`.
pub fn guess(description: &str) -> Option<Category> {
    let haystack = description.to_lowercase();
    ENTRIES
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, category)| *category)
}

/// The full fragment table
pub fn entries() -> &'static [(&'static str, Category)] {
    ENTRIES
}
