//! Text normalization for pattern matching
//!
//! Extracted page text goes through canonical decomposition + recombination
//! (NFC) and common typographic variants are folded before patterns are
//! applied. Only the matching copy is normalized; annotations always target
//! the original geometry.

use unicode_normalization::UnicodeNormalization;

/// Fold a typographic variant onto its plain ASCII counterpart
fn fold_char(c: char) -> char {
    match c {
        // en dash, em dash, non-breaking hyphen
        '\u{2013}' | '\u{2014}' | '\u{2011}' => '-',
        // no-break space
        '\u{00A0}' => ' ',
        _ => c,
    }
}

/// Normalize text for matching: NFC, then typographic folding
pub fn normalize(text: &str) -> String {
    text.nfc().map(fold_char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_dashes_and_spaces() {
        assert_eq!(normalize("INV\u{2013}2024"), "INV-2024");
        assert_eq!(normalize("INV\u{2014}2024"), "INV-2024");
        assert_eq!(normalize("INV\u{2011}2024"), "INV-2024");
        assert_eq!(normalize("Buy\u{00A0}Now"), "Buy Now");
    }

    #[test]
    fn recombines_decomposed_sequences() {
        // 'e' + combining acute accent recombines to a single scalar
        assert_eq!(normalize("Caf\u{0065}\u{0301}"), "Caf\u{00E9}");
    }

    #[test]
    fn plain_ascii_is_untouched() {
        assert_eq!(normalize("123-ABC"), "123-ABC");
    }
}
