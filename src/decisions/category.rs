//! Category detector (spec §4.5): static keyword → category table with
//! priority ordering (laundry checked before cleaning so "Detergente"
//! resolves to laundry, not the generic cleaning bucket).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Laundry,
    Cleaning,
    Dairy,
    Produce,
    Beverages,
    Bakery,
    PersonalCare,
    Unknown,
}

impl Category {
    /// Category default cadence in days, used by the cadence calculator
    /// when purchase history is too thin to derive one.
    pub fn default_cadence_days(self) -> u32 {
        match self {
            Category::Laundry => 45,
            Category::Cleaning => 21,
            Category::Dairy => 7,
            Category::Produce => 5,
            Category::Beverages => 14,
            Category::Bakery => 3,
            Category::PersonalCare => 45,
            Category::Unknown => 14,
        }
    }
}

/// Ordered so that a more specific category's keywords are checked before
/// a broader one that would otherwise also match (laundry before
/// cleaning: "detergente" fits both, laundry wins).
const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (Category::Laundry, &["detergente roupa", "detergente", "amaciador", "lexiva"]),
    (Category::Cleaning, &["lixivia", "multiusos", "desinfetante", "lava-loica", "esfregona"]),
    (Category::Dairy, &["leite", "iogurte", "queijo", "manteiga", "natas"]),
    (Category::Produce, &["maca", "banana", "tomate", "alface", "cenoura", "batata"]),
    (Category::Beverages, &["agua", "sumo", "refrigerante", "cerveja", "vinho", "cafe"]),
    (Category::Bakery, &["pao", "broa", "baguete", "croissant"]),
    (Category::PersonalCare, &["champo", "gel de banho", "pasta de dentes", "desodorizante"]),
];

pub struct CategoryMatch {
    pub category: Category,
    pub confidence: f64,
}

/// `normalized_name` should already be through `analytics::identity::normalize_name`.
pub fn detect_category(normalized_name: &str) -> CategoryMatch {
    for (category, keywords) in CATEGORY_TABLE {
        let match_count = keywords
            .iter()
            .filter(|kw| normalized_name.contains(*kw))
            .count();
        if match_count > 0 {
            // Monotonic confidence boost per additional matching keyword,
            // capped short of certainty.
            let confidence = (0.6 + 0.15 * (match_count - 1) as f64).min(0.95);
            return CategoryMatch {
                category: *category,
                confidence,
            };
        }
    }
    CategoryMatch {
        category: Category::Unknown,
        confidence: 0.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::identity::normalize_name;

    #[test]
    fn detergente_resolves_to_laundry_not_cleaning() {
        let m = detect_category(&normalize_name("Detergente para Roupa"));
        assert_eq!(m.category, Category::Laundry);
    }

    #[test]
    fn unmatched_keyword_is_unknown_low_confidence() {
        let m = detect_category(&normalize_name("Caderno Escolar"));
        assert_eq!(m.category, Category::Unknown);
        assert!(m.confidence < 0.5);
    }

    #[test]
    fn multi_keyword_match_boosts_confidence() {
        let single = detect_category(&normalize_name("Leite"));
        let multi = detect_category(&normalize_name("Leite com Manteiga"));
        assert!(multi.confidence >= single.confidence);
    }
}
