use unicode_normalization::UnicodeNormalization;

/// Normalize extracted page text.
///
/// Applies NFC composition, expands the Latin ligatures, turns no-break
/// spaces into plain spaces and drops replacement characters. Runs of spaces
/// and line breaks are left alone: the table reader depends on both.
pub fn normalize_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        if result.contains(lig) {
            result = result.replace(lig, replacement);
        }
    }

    result
        .chars()
        .filter(|&c| c != '\u{FFFD}')
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(normalize_text("ICP101 Cálculo I"), "ICP101 Cálculo I");
    }

    #[test]
    fn test_nfc_composes_accents() {
        // "c" + combining cedilla, "a" + combining tilde
        let input = "Computac\u{0327}a\u{0303}o";
        assert_eq!(normalize_text(input), "Computação");
    }

    #[test]
    fn test_ligatures_expanded() {
        assert_eq!(normalize_text("\u{FB01}sica"), "fisica");
        assert_eq!(normalize_text("a\u{FB04}e"), "affle");
    }

    #[test]
    fn test_column_gaps_preserved() {
        let line = "ICP101 Intro     MAT201 Calc   2021\n\n";
        assert_eq!(normalize_text(line), line);
    }

    #[test]
    fn test_no_break_space_and_replacement_char() {
        assert_eq!(normalize_text("MAT\u{00A0}201\u{FFFD}"), "MAT 201");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
    }
}
