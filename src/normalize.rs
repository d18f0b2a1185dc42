// 🔤 Name Normalizer - canonical comparison keys for display names
//
// Display names in the schedule feed and in the lookup tables disagree on
// spacing, middle dots, brackets and "rerun" markers. Both sides of every
// comparison go through `normalize_name` so the keys line up.

/// Tokens removed from a display name, in removal order.
///
/// The rerun marker (`復刻`) tags reruns of an earlier banner and never
/// belongs to the name itself.
const STRIPPED_TOKENS: &[&str] = &[
    "\u{3000}", // full-width space
    " ",
    "·",
    "・",
    "*",
    "（",
    "）",
    "(",
    ")",
    RERUN_MARKER,
];

const RERUN_MARKER: &str = "復刻";

/// Reduce a display name to its canonical comparison key.
///
/// Pure and total: every input produces a key, possibly empty.
///
/// # Examples:
/// ```
/// use future_sight::normalize_name;
///
/// assert_eq!(normalize_name("Card Name"), "CardName");
/// assert_eq!(normalize_name("（復刻）Special・Week"), "SpecialWeek");
/// ```
pub fn normalize_name(name: &str) -> String {
    let mut normalized = name.to_string();
    for token in STRIPPED_TOKENS {
        if normalized.contains(token) {
            normalized = normalized.replace(token, "");
        }
    }
    // "復復刻刻" leaves a fresh marker behind after one pass
    while normalized.contains(RERUN_MARKER) {
        normalized = normalized.replace(RERUN_MARKER, "");
    }
    normalized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_spaces_and_punctuation() {
        assert_eq!(normalize_name("Card Name"), "CardName");
        assert_eq!(normalize_name("Card\u{3000}Name"), "CardName");
        assert_eq!(normalize_name("Mejiro·McQueen"), "MejiroMcQueen");
        assert_eq!(normalize_name("Mejiro・McQueen"), "MejiroMcQueen");
        assert_eq!(normalize_name("*Gold Ship*"), "GoldShip");
        assert_eq!(normalize_name("(Summer) Maruzensky"), "SummerMaruzensky");
        assert_eq!(normalize_name("（夏）丸善斯基"), "夏丸善斯基");
    }

    #[test]
    fn test_strips_rerun_marker() {
        assert_eq!(normalize_name("復刻 特別週"), "特別週");
        assert_eq!(normalize_name("[復刻]特別週"), "[]特別週");
    }

    #[test]
    fn test_nested_rerun_marker_fully_removed() {
        assert_eq!(normalize_name("復復刻刻"), "");
        assert_eq!(normalize_name("A復復刻刻B"), "AB");
    }

    #[test]
    fn test_trims_other_whitespace() {
        assert_eq!(normalize_name("\tTokai Teio\n"), "TokaiTeio");
    }

    #[test]
    fn test_blank_input_gives_empty_key() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("  \u{3000} ・ "), "");
        assert_eq!(normalize_name("（）復刻"), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Card Name",
            "  （復刻）Special・Week  ",
            "復復刻刻",
            "\t( * )\t",
            "SSR-Card Name",
            "",
            "ナリタ・ブライアン",
        ];

        for sample in samples {
            let once = normalize_name(sample);
            assert_eq!(normalize_name(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
