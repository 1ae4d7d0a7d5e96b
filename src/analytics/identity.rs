//! Product identity normalization (spec §4.4): lowercase, NFD + strip
//! combining marks, collapse whitespace, trim. Identity is `productId`
//! when present, else the normalized name — used everywhere two product
//! references need to compare equal regardless of accenting or spacing
//! drift between pages.

use unicode_normalization::UnicodeNormalization;

pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim().to_string()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_lowercases() {
        assert_eq!(normalize_name("Iogurte Açúcar"), "iogurte acucar");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize_name("Leite   Meio  Gordo"), "leite meio gordo");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(normalize_name("  Pão de Forma  "), "pao de forma");
    }

    #[test]
    fn same_product_different_accenting_normalizes_equal() {
        assert_eq!(normalize_name("Água"), normalize_name("agua"));
    }
}
