//! Keyword-bucket classification.
//!
//! Rules are evaluated in table order and the first rule with a trigger
//! present in the lowercased text wins; nothing matching means
//! [`Category::Other`].

use crate::models::Category;

/// Ordered `(label, triggers)` table. Triggers are lowercase substrings.
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (Category::Homicide, &["homicid", "morte", "assassin"]),
    (Category::Trafficking, &["tráfico", "trafic", "droga"]),
    (
        Category::PoliceOperation,
        &["operação policial", "operação", "polícia", "policial"],
    ),
    (Category::Theft, &["roubo", "assalto"]),
];

/// Assign exactly one category to `text` (title and body concatenated).
pub fn classify(text: &str) -> Category {
    let lowered = text.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, triggers)| triggers.iter().any(|t| lowered.contains(t)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}
